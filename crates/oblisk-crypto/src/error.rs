//! Crypto error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Malformed envelope or wrong key. Never means "not found".
    #[error("Decrypt error: {0}")]
    Decrypt(String),

    #[error("Encrypt error: {0}")]
    Encrypt(String),

    #[error("Invalid signature: {0}")]
    Signature(String),
}
