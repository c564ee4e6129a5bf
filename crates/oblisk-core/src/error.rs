//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] oblisk_storage::StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] oblisk_crypto::CryptoError),

    #[error("Relay error: {0}")]
    Relay(#[from] oblisk_relay::RelayError),

    #[error("Tab error: {0}")]
    Tab(#[from] oblisk_tabs::TabError),

    #[error("Session error: {0}")]
    Session(#[from] oblisk_session::SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No account signed in")]
    NoAccount,
}
