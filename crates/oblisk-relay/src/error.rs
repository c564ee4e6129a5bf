//! Relay error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// No relay answered at all (every relay timed out or failed).
    #[error("No relay responded ({attempted} attempted)")]
    Unavailable { attempted: usize },

    /// Neither a relay-list nor a legacy contact-list record declares any
    /// write relay for the account.
    #[error("No relays found for account {0}")]
    NoRelaysFound(String),

    #[error("Relay {0} timed out")]
    Timeout(String),

    #[error("Connection to {relay} failed: {reason}")]
    Connection { relay: String, reason: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] oblisk_crypto::CryptoError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
