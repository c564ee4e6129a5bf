//! Session index
//!
//! The list of every known session, stored as one JSON array in one slot.
//! Mutations load the whole list, change it and write it back. Two
//! overlapping mutations can therefore lose one of the changes; there is no
//! versioning to catch it.

use oblisk_crypto::Account;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::slot::SlotStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndexEntry {
    pub session_id: String,
    pub name: String,
    /// Id of the record the session was last written as
    pub session_event_id: String,
    pub total_tabs: usize,
    /// Tab-set hash of the session's tabs when it was last written
    pub hash: String,
}

pub struct SessionIndex {
    slots: Arc<SlotStore>,
    slot: String,
}

impl SessionIndex {
    pub fn new(slots: Arc<SlotStore>, slot: impl Into<String>) -> Self {
        Self {
            slots,
            slot: slot.into(),
        }
    }

    /// All entries; empty when the slot has never been written
    pub async fn load(&self, account: &Account) -> Result<Vec<SessionIndexEntry>> {
        match self.slots.get(account, &self.slot).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace any entry for the same session and append `entry`
    pub async fn upsert(
        &self,
        account: &Account,
        entry: SessionIndexEntry,
    ) -> Result<Vec<SessionIndexEntry>> {
        let entries = self.load(account).await?;
        self.upsert_into(account, entries, entry).await
    }

    /// Upsert into an already loaded list
    pub(crate) async fn upsert_into(
        &self,
        account: &Account,
        mut entries: Vec<SessionIndexEntry>,
        entry: SessionIndexEntry,
    ) -> Result<Vec<SessionIndexEntry>> {
        entries.retain(|existing| existing.session_id != entry.session_id);
        entries.push(entry);
        self.store(account, &entries).await?;
        Ok(entries)
    }

    pub async fn remove(&self, account: &Account, session_id: &str) -> Result<Vec<SessionIndexEntry>> {
        let mut entries = self.load(account).await?;
        entries.retain(|existing| existing.session_id != session_id);
        self.store(account, &entries).await?;
        Ok(entries)
    }

    async fn store(&self, account: &Account, entries: &[SessionIndexEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.slots.put(account, &self.slot, &json).await?;

        tracing::debug!(sessions = entries.len(), "Session index written");
        Ok(())
    }
}
