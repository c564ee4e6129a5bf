//! Oblisk Storage Layer
//!
//! SQLite-backed local device state: a flat string key-value table that
//! survives restarts. Holds the account key, active-session bindings, the
//! last tracked session pointer and user settings. No transactions are
//! exposed; every call is a single statement.

mod database;
mod error;
mod migrations;

pub mod keys;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
