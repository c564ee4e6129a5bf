//! Write-relay discovery
//!
//! An account advertises the relays it writes to in records it publishes
//! itself. Two formats coexist and both are read:
//!
//! 1. the relay-list record (kind 10002): `["r", url]` tags with an optional
//!    `read`/`write` marker, where an untagged URL means both
//! 2. the legacy contact list (kind 3): JSON content mapping URL to
//!    `{read, write}`
//!
//! Lookups go to the well-known app relays. The first non-empty write set is
//! cached per author until sign-out.

use oblisk_crypto::Account;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RelayError;
use crate::event::{Event, Tag};
use crate::filter::Filter;
use crate::gateway::RelayGateway;
use crate::kind;
use crate::transport::validate_relay_url;
use crate::Result;

/// `{read, write}` flags as they appear in the legacy contact list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPermissions {
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default = "default_true")]
    pub write: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RelayPermissions {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

/// A relay URL with its capability flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEndpoint {
    pub url: String,
    #[serde(default = "default_true")]
    pub read: bool,
    #[serde(default = "default_true")]
    pub write: bool,
}

impl RelayEndpoint {
    pub fn new(url: impl Into<String>, read: bool, write: bool) -> Self {
        Self {
            url: url.into(),
            read,
            write,
        }
    }

    pub fn permissions(&self) -> RelayPermissions {
        RelayPermissions {
            read: self.read,
            write: self.write,
        }
    }
}

/// Resolved write relays, scoped to the author they were resolved for
pub struct WriteRelayCache {
    inner: Arc<RwLock<Option<(String, Vec<String>)>>>,
}

impl WriteRelayCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn get(&self, author: &str) -> Option<Vec<String>> {
        self.inner
            .read()
            .as_ref()
            .filter(|(cached_for, _)| cached_for == author)
            .map(|(_, relays)| relays.clone())
    }

    pub fn set(&self, author: &str, relays: Vec<String>) {
        *self.inner.write() = Some((author.to_string(), relays));
    }

    pub fn invalidate(&self) {
        if self.inner.write().take().is_some() {
            tracing::debug!("Write relay cache invalidated");
        }
    }
}

impl Default for WriteRelayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WriteRelayCache {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct RelayDirectory {
    gateway: Arc<RelayGateway>,
    app_relays: Vec<String>,
    cache: WriteRelayCache,
}

impl RelayDirectory {
    pub fn new(gateway: Arc<RelayGateway>, app_relays: Vec<String>) -> Self {
        Self {
            gateway,
            app_relays,
            cache: WriteRelayCache::new(),
        }
    }

    pub fn with_cache(mut self, cache: WriteRelayCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn gateway(&self) -> &Arc<RelayGateway> {
        &self.gateway
    }

    pub fn app_relays(&self) -> &[String] {
        &self.app_relays
    }

    pub fn cache(&self) -> &WriteRelayCache {
        &self.cache
    }

    /// Write relays declared by `author`, from cache, the relay-list record or
    /// the legacy contact list, in that order. The contact list is only
    /// consulted when no relay-list record exists at all.
    pub async fn resolve_write_relays(&self, author: &str) -> Result<Vec<String>> {
        if let Some(cached) = self.cache.get(author) {
            return Ok(cached);
        }

        let declared = match self.relay_list(author).await? {
            Some(declared) => declared,
            None => {
                tracing::debug!(author = %author, "No relay list, trying legacy contact list");
                self.contact_list(author).await?.unwrap_or_default()
            }
        };
        let writable = write_urls(&declared);

        if writable.is_empty() {
            return Err(RelayError::NoRelaysFound(author.to_string()));
        }

        tracing::info!(author = %author, count = writable.len(), "Resolved write relays");
        self.cache.set(author, writable.clone());
        Ok(writable)
    }

    /// Every relay `author` declares, with its flags. Empty when neither
    /// format has been published.
    pub async fn user_relays(&self, author: &str) -> Result<BTreeMap<String, RelayPermissions>> {
        if let Some(declared) = self.relay_list(author).await? {
            return Ok(declared);
        }

        Ok(self.contact_list(author).await?.unwrap_or_default())
    }

    /// Publish `relays` to the app relays in both formats
    pub async fn advertise(
        &self,
        account: &Account,
        relays: &BTreeMap<String, RelayPermissions>,
    ) -> Result<()> {
        let contacts = Event::sign(
            account,
            kind::CONTACTS,
            Vec::new(),
            serde_json::to_string(relays)?,
        );

        let tags = relays
            .iter()
            .filter(|(_, flags)| flags.read || flags.write)
            .map(|(url, flags)| match (flags.read, flags.write) {
                (true, false) => Tag::relay(url.as_str(), Some("read")),
                (false, true) => Tag::relay(url.as_str(), Some("write")),
                _ => Tag::relay(url.as_str(), None),
            })
            .collect();
        let relay_list = Event::sign(account, kind::RELAY_LIST, tags, "");

        self.gateway.publish(&self.app_relays, &contacts).await;
        self.gateway.publish(&self.app_relays, &relay_list).await;

        tracing::info!(author = %account.public_hex(), count = relays.len(), "Advertised relays");
        self.cache.invalidate();
        Ok(())
    }

    async fn relay_list(&self, author: &str) -> Result<Option<BTreeMap<String, RelayPermissions>>> {
        let filter = Filter::new().kind(kind::RELAY_LIST).author(author);
        let Some(event) = self.gateway.query(&self.app_relays, &filter).await? else {
            return Ok(None);
        };

        let mut declared = BTreeMap::new();
        for tag in event.tags.iter().filter(|tag| tag.name() == Some("r")) {
            let Some(url) = tag.value() else { continue };
            let flags = match tag.get(2) {
                Some("read") => RelayPermissions {
                    read: true,
                    write: false,
                },
                Some("write") => RelayPermissions {
                    read: false,
                    write: true,
                },
                _ => RelayPermissions::default(),
            };
            declared.insert(url.to_string(), flags);
        }

        Ok(Some(declared))
    }

    async fn contact_list(&self, author: &str) -> Result<Option<BTreeMap<String, RelayPermissions>>> {
        let filter = Filter::new().kind(kind::CONTACTS).author(author);
        let Some(event) = self.gateway.query(&self.app_relays, &filter).await? else {
            return Ok(None);
        };

        if event.content.trim().is_empty() {
            return Ok(Some(BTreeMap::new()));
        }

        match serde_json::from_str(&event.content) {
            Ok(declared) => Ok(Some(declared)),
            Err(e) => {
                tracing::warn!(author = %author, error = %e, "Unreadable contact list relays");
                Ok(Some(BTreeMap::new()))
            }
        }
    }
}

fn write_urls(declared: &BTreeMap<String, RelayPermissions>) -> Vec<String> {
    declared
        .iter()
        .filter(|(_, flags)| flags.write)
        .filter_map(|(url, _)| match validate_relay_url(url) {
            Ok(()) => Some(url.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping declared relay");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryNetwork, SimulatedRelay};

    const APP: &str = "wss://app.relay";

    fn directory(network: &Arc<MemoryNetwork>) -> RelayDirectory {
        let gateway = Arc::new(RelayGateway::new(network.clone()));
        RelayDirectory::new(gateway, vec![APP.to_string()])
    }

    fn relay_list(account: &Account, tags: Vec<Tag>) -> Event {
        Event::sign_at(account, kind::RELAY_LIST, tags, "", 100)
    }

    fn contact_list(account: &Account, content: &str) -> Event {
        Event::sign_at(account, kind::CONTACTS, Vec::new(), content, 100)
    }

    #[tokio::test]
    async fn test_relay_list_preferred_over_contact_list() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();

        network.seed(
            APP,
            relay_list(
                &account,
                vec![
                    Tag::relay("wss://both", None),
                    Tag::relay("wss://writer", Some("write")),
                    Tag::relay("wss://reader", Some("read")),
                ],
            ),
        );
        network.seed(
            APP,
            contact_list(&account, r#"{"wss://legacy":{"read":true,"write":true}}"#),
        );

        let relays = directory(&network)
            .resolve_write_relays(&account.public_hex())
            .await
            .unwrap();
        assert_eq!(relays, vec!["wss://both", "wss://writer"]);
    }

    #[tokio::test]
    async fn test_legacy_contact_list_fallback() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();
        network.seed(
            APP,
            contact_list(
                &account,
                r#"{"wss://w":{"read":false,"write":true},"wss://r":{"read":true,"write":false}}"#,
            ),
        );

        let relays = directory(&network)
            .resolve_write_relays(&account.public_hex())
            .await
            .unwrap();
        assert_eq!(relays, vec!["wss://w"]);
    }

    #[tokio::test]
    async fn test_relay_list_without_write_relays_does_not_fall_back() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();
        network.seed(
            APP,
            relay_list(&account, vec![Tag::relay("wss://reader", Some("read"))]),
        );
        network.seed(
            APP,
            contact_list(&account, r#"{"wss://legacy":{"read":true,"write":true}}"#),
        );

        let result = directory(&network)
            .resolve_write_relays(&account.public_hex())
            .await;
        assert!(matches!(result, Err(RelayError::NoRelaysFound(_))));
    }

    #[tokio::test]
    async fn test_no_relays_found() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();
        let directory = directory(&network);

        let result = directory.resolve_write_relays(&account.public_hex()).await;
        assert!(matches!(result, Err(RelayError::NoRelaysFound(_))));

        // an empty legacy list is no better
        network.seed(APP, contact_list(&account, ""));
        let result = directory.resolve_write_relays(&account.public_hex()).await;
        assert!(matches!(result, Err(RelayError::NoRelaysFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_app_relays_propagate() {
        let network = Arc::new(MemoryNetwork::new());
        network.set_behaviour(APP, SimulatedRelay::Down);
        let account = Account::generate();

        let result = directory(&network)
            .resolve_write_relays(&account.public_hex())
            .await;
        assert!(matches!(result, Err(RelayError::Unavailable { attempted: 1 })));
    }

    #[tokio::test]
    async fn test_resolution_is_cached_per_author() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();
        network.seed(APP, relay_list(&account, vec![Tag::relay("wss://mine", None)]));

        let directory = directory(&network);
        let author = account.public_hex();
        directory.resolve_write_relays(&author).await.unwrap();

        // the app relay goes away; the cached answer still holds
        network.set_behaviour(APP, SimulatedRelay::Down);
        assert_eq!(
            directory.resolve_write_relays(&author).await.unwrap(),
            vec!["wss://mine"]
        );
        assert!(directory.cache().get("someone-else").is_none());

        directory.cache().invalidate();
        assert!(directory.resolve_write_relays(&author).await.is_err());
    }

    #[tokio::test]
    async fn test_advertise_publishes_both_formats() {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();
        let directory = directory(&network);

        let mut relays = BTreeMap::new();
        relays.insert("wss://a".to_string(), RelayPermissions::default());
        relays.insert(
            "wss://b".to_string(),
            RelayPermissions {
                read: true,
                write: false,
            },
        );
        directory.advertise(&account, &relays).await.unwrap();

        let stored = network.events_on(APP);
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|event| event.verify().is_ok()));

        assert_eq!(directory.user_relays(&account.public_hex()).await.unwrap(), relays);
        assert_eq!(
            directory.resolve_write_relays(&account.public_hex()).await.unwrap(),
            vec!["wss://a"]
        );
    }

    #[test]
    fn test_permissions_default_to_true() {
        let flags: RelayPermissions = serde_json::from_str("{}").unwrap();
        assert_eq!(flags, RelayPermissions::default());
    }
}
