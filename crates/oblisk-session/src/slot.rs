//! Encrypted key-addressed slots
//!
//! A slot is the (author, kind 30078, `d` tag) coordinate of a parameterized
//! replaceable record. Writing a slot publishes a newer record under the same
//! coordinate. Relays keep the record with the newest `created_at`, and on a
//! tie the one with the lowest id, so writes from one store are stamped with
//! strictly increasing seconds per slot. There is no compare-and-swap across
//! relays, so two writers race and a later read may return either version
//! depending on which relay answers first.

use oblisk_crypto::{decrypt_self, encrypt_self, Account};
use chrono::Utc;
use oblisk_relay::{kind, Event, Filter, RelayDirectory, Tag};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::Result;

pub struct SlotStore {
    directory: Arc<RelayDirectory>,
    /// Last `created_at` written, by (author, slot)
    stamps: Mutex<HashMap<(String, String), u64>>,
}

impl SlotStore {
    pub fn new(directory: Arc<RelayDirectory>) -> Self {
        Self {
            directory,
            stamps: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Arc<RelayDirectory> {
        &self.directory
    }

    /// Decrypted content of `slot`, or `None` when no relay holds it or the
    /// slot was blanked
    pub async fn get(&self, account: &Account, slot: &str) -> Result<Option<String>> {
        let author = account.public_hex();
        let relays = self.directory.resolve_write_relays(&author).await?;

        let filter = Filter::new()
            .kind(kind::APP_DATA)
            .author(author.as_str())
            .identifier(slot);

        match self.directory.gateway().query(&relays, &filter).await? {
            Some(event) if !event.content.is_empty() => {
                Ok(Some(decrypt_self(account, &event.content)?))
            }
            _ => Ok(None),
        }
    }

    /// Encrypt and publish `plaintext` to `slot`, returning the record id.
    /// The id says nothing about whether any relay kept the record.
    pub async fn put(&self, account: &Account, slot: &str, plaintext: &str) -> Result<String> {
        let content = encrypt_self(account, plaintext)?;
        self.publish(account, slot, content).await
    }

    /// Publish an empty record to `slot`, which reads back as absent
    pub async fn blank(&self, account: &Account, slot: &str) -> Result<String> {
        self.publish(account, slot, String::new()).await
    }

    async fn publish(&self, account: &Account, slot: &str, content: String) -> Result<String> {
        let relays = self
            .directory
            .resolve_write_relays(&account.public_hex())
            .await?;

        let created_at = self.next_stamp(&account.public_hex(), slot);
        let event = Event::sign_at(
            account,
            kind::APP_DATA,
            vec![Tag::identifier(slot)],
            content,
            created_at,
        );
        self.directory.gateway().publish(&relays, &event).await;

        tracing::debug!(
            slot = %slot,
            event_id = %event.id,
            created_at,
            relays = relays.len(),
            "Slot written"
        );
        Ok(event.id)
    }

    /// Wall-clock seconds, bumped past the previous write to the same slot
    fn next_stamp(&self, author: &str, slot: &str) -> u64 {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let mut stamps = self.stamps.lock();
        let last = stamps
            .entry((author.to_string(), slot.to_string()))
            .or_default();
        *last = now.max(*last + 1);
        *last
    }
}
