//! User settings kept in local state

use oblisk_storage::{keys, Database};
use serde::{Deserialize, Serialize};

use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Reopen the last tracked session at startup
    pub restore_last_session: bool,
    pub enable_signer: bool,
}

impl Settings {
    /// Unset keys read as `false`
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            restore_last_session: db.get_bool(keys::RESTORE_LAST_SESSION)?.unwrap_or(false),
            enable_signer: db.get_bool(keys::ENABLE_NOSTR_SIGNER)?.unwrap_or(false),
        })
    }

    pub fn save(&self, db: &Database) -> Result<()> {
        db.set_json(keys::RESTORE_LAST_SESSION, &self.restore_last_session)?;
        db.set_json(keys::ENABLE_NOSTR_SIGNER, &self.enable_signer)?;
        tracing::debug!(
            restore_last_session = self.restore_last_session,
            enable_signer = self.enable_signer,
            "Settings saved"
        );
        Ok(())
    }
}
