//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The index is empty or missing while a session is being updated.
    #[error("Session index inconsistent: {0}")]
    IndexInconsistency(String),

    #[error("No account loaded")]
    NoAccount,

    #[error("Relay error: {0}")]
    Relay(#[from] oblisk_relay::RelayError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] oblisk_crypto::CryptoError),

    #[error("Storage error: {0}")]
    Storage(#[from] oblisk_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] oblisk_tabs::TabError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
