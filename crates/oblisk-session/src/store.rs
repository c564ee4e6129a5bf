//! Session store
//!
//! Session slots plus the index that lists them. Every operation writes the
//! session slot first and the index second; a failure in between leaves the
//! two out of step until the next successful write.

use oblisk_crypto::Account;
use std::sync::Arc;

use crate::error::SessionError;
use crate::index::{SessionIndex, SessionIndexEntry};
use crate::session::Session;
use crate::slot::SlotStore;
use crate::Result;

pub struct SessionStore {
    slots: Arc<SlotStore>,
    index: SessionIndex,
    project: String,
}

impl SessionStore {
    /// `project` prefixes every slot tag: `<project>/root` for the index and
    /// `<project>/session/<id>` for each session
    pub fn new(slots: Arc<SlotStore>, project: impl Into<String>) -> Self {
        let project = project.into();
        let index = SessionIndex::new(slots.clone(), format!("{project}/root"));

        Self {
            slots,
            index,
            project,
        }
    }

    pub fn index(&self) -> &SessionIndex {
        &self.index
    }

    fn session_slot(&self, session_id: &str) -> String {
        format!("{}/session/{}", self.project, session_id)
    }

    async fn write_session(&self, account: &Account, session: &Session) -> Result<String> {
        let json = serde_json::to_string(session)?;
        self.slots
            .put(account, &self.session_slot(&session.id), &json)
            .await
    }

    /// Store a new session and add it to the index
    pub async fn create(&self, account: &Account, session: &Session) -> Result<Vec<SessionIndexEntry>> {
        let event_id = self.write_session(account, session).await?;
        let entries = self.index.upsert(account, session.index_entry(event_id)).await?;

        tracing::info!(
            session_id = %session.id,
            session_name = %session.name,
            tabs = session.tabs.len(),
            "Created session"
        );
        Ok(entries)
    }

    /// Rewrite an existing session and its index entry.
    ///
    /// An empty index means the session cannot be one we know about, so the
    /// index is left alone and [`SessionError::IndexInconsistency`] returned.
    /// The session slot has already been written by then.
    pub async fn update(&self, account: &Account, session: &Session) -> Result<Vec<SessionIndexEntry>> {
        let event_id = self.write_session(account, session).await?;

        let entries = self.index.load(account).await?;
        if entries.is_empty() {
            return Err(SessionError::IndexInconsistency(format!(
                "index is empty while updating session {}",
                session.id
            )));
        }

        let entries = self
            .index
            .upsert_into(account, entries, session.index_entry(event_id))
            .await?;

        tracing::debug!(session_id = %session.id, tabs = session.tabs.len(), "Updated session");
        Ok(entries)
    }

    pub async fn get(&self, account: &Account, session_id: &str) -> Result<Option<Session>> {
        match self.slots.get(account, &self.session_slot(session_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Blank the session slot and drop it from the index
    pub async fn delete(&self, account: &Account, session_id: &str) -> Result<Vec<SessionIndexEntry>> {
        self.slots
            .blank(account, &self.session_slot(session_id))
            .await?;
        let entries = self.index.remove(account, session_id).await?;

        tracing::info!(session_id = %session_id, "Deleted session");
        Ok(entries)
    }

    pub async fn list(&self, account: &Account) -> Result<Vec<SessionIndexEntry>> {
        self.index.load(account).await
    }
}
