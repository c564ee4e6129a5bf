//! Oblisk Core
//!
//! Coordination layer of the session sync engine. Wires the relay stack,
//! the encrypted session store and the window tracker together behind
//! [`Engine`], and owns configuration, settings and the account lifecycle.

mod account;
mod config;
mod engine;
mod error;
mod profile;
mod settings;

pub use config::Config;
pub use engine::Engine;
pub use error::CoreError;
pub use profile::{HomeStatus, Profile};
pub use settings::Settings;

// Re-export core components
pub use oblisk_crypto::{Account, CryptoError};
pub use oblisk_relay::{
    MemoryNetwork, RelayDirectory, RelayEndpoint, RelayError, RelayPermissions, RelayTransport,
    WebSocketTransport,
};
pub use oblisk_session::{
    Badge, BadgeSink, Binding, MemoryBadge, Session, SessionError, SessionIndexEntry, SyncStatus,
    WindowState,
};
pub use oblisk_storage::{Database, StorageError};
pub use oblisk_tabs::{BrowserEvent, MemoryBrowser, NewTab, Tab, TabError, WindowId, WindowManager};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
