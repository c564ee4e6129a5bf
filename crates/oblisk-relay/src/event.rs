//! Signed wire records

use chrono::Utc;
use oblisk_crypto::{verify_signature, Account};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RelayError;
use crate::Result;

/// One tag: a name followed by its values, e.g. `["d", "oblisk-sync/root"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// `["d", value]`, the slot key of a parameterized replaceable record
    pub fn identifier(value: impl Into<String>) -> Self {
        Self(vec!["d".to_string(), value.into()])
    }

    /// `["r", url]` or `["r", url, marker]`
    pub fn relay(url: impl Into<String>, marker: Option<&str>) -> Self {
        let mut fields = vec!["r".to_string(), url.into()];
        if let Some(marker) = marker {
            fields.push(marker.to_string());
        }
        Self(fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

/// A record as published to and served by relays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Hex SHA-256 of the canonical serialization
    pub id: String,
    /// Author x-only public key (hex)
    pub pubkey: String,
    /// Unix timestamp, seconds
    pub created_at: u64,
    pub kind: u32,
    pub tags: Vec<Tag>,
    pub content: String,
    /// Schnorr signature over `id`
    pub sig: String,
}

impl Event {
    /// Build and sign a record stamped with the current time
    pub fn sign(account: &Account, kind: u32, tags: Vec<Tag>, content: impl Into<String>) -> Self {
        let created_at = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        Self::sign_at(account, kind, tags, content, created_at)
    }

    pub fn sign_at(
        account: &Account,
        kind: u32,
        tags: Vec<Tag>,
        content: impl Into<String>,
        created_at: u64,
    ) -> Self {
        let content = content.into();
        let pubkey = account.public_hex();
        let digest = compute_id(&pubkey, created_at, kind, &tags, &content);

        Self {
            id: hex::encode(digest),
            sig: account.sign(&digest),
            pubkey,
            created_at,
            kind,
            tags,
            content,
        }
    }

    /// Recompute the id and check the author's signature
    pub fn verify(&self) -> Result<()> {
        let digest = compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        );

        if hex::encode(digest) != self.id {
            return Err(RelayError::Protocol(format!(
                "event {} does not hash to its id",
                self.id
            )));
        }

        verify_signature(&self.pubkey, &digest, &self.sig)?;
        Ok(())
    }

    /// First `d` tag value
    pub fn identifier(&self) -> Option<&str> {
        self.tag_values("d").next()
    }

    /// Values of every tag named `name`
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.name() == Some(name))
            .filter_map(Tag::value)
    }
}

fn compute_id(pubkey: &str, created_at: u64, kind: u32, tags: &[Tag], content: &str) -> [u8; 32] {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
    Sha256::digest(canonical.to_string().as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind;

    #[test]
    fn test_sign_and_verify() {
        let account = Account::generate();
        let event = Event::sign(
            &account,
            kind::APP_DATA,
            vec![Tag::identifier("oblisk-sync/root")],
            "payload",
        );

        assert_eq!(event.pubkey, account.public_hex());
        assert_eq!(event.identifier(), Some("oblisk-sync/root"));
        event.verify().unwrap();
    }

    #[test]
    fn test_tampering_detected() {
        let account = Account::generate();
        let mut event = Event::sign(&account, kind::METADATA, Vec::new(), "{}");
        event.content = "{\"name\":\"mallory\"}".to_string();
        assert!(event.verify().is_err());

        let mut forged = Event::sign(&account, kind::METADATA, Vec::new(), "{}");
        forged.pubkey = Account::generate().public_hex();
        assert!(forged.verify().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let account = Account::generate();
        let event = Event::sign_at(
            &account,
            kind::RELAY_LIST,
            vec![
                Tag::relay("wss://a.example", None),
                Tag::relay("wss://b.example", Some("write")),
            ],
            "",
            1_700_000_000,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], 10002);
        assert_eq!(json["created_at"], 1_700_000_000u64);
        assert_eq!(
            json["tags"],
            serde_json::json!([["r", "wss://a.example"], ["r", "wss://b.example", "write"]])
        );

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(
            parsed.tag_values("r").collect::<Vec<_>>(),
            vec!["wss://a.example", "wss://b.example"]
        );
    }
}
