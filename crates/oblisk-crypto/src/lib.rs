//! Oblisk Crypto
//!
//! Account identity for the session store:
//! - secp256k1 keypair (hex encoded on the wire and in local state)
//! - BIP-340 Schnorr signing of record ids
//! - self-addressed envelope: AES-256-CBC keyed by the ECDH secret between
//!   the account's private key and its own public key
//!
//! The envelope is private-to-self storage, not a messaging channel.

mod account;
mod envelope;
mod error;

pub use account::{derive_public, verify_signature, Account};
pub use envelope::{decrypt_self, encrypt_self};
pub use error::CryptoError;

pub type Result<T> = std::result::Result<T, CryptoError>;
