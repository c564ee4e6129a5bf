//! Oblisk Relay
//!
//! Fan-out access to a federated set of untrusted, unreliable relays.
//!
//! - [`RelayGateway`]: concurrent query (best-effort first responder) and
//!   publish (no acceptance check) over a [`RelayTransport`]
//! - [`RelayDirectory`]: resolves and caches the account's write relays from
//!   its relay-list record, falling back to the legacy contact list
//! - [`Event`] / [`Filter`]: signed wire records and subscription filters
//!
//! The gateway never reconciles divergent relay state. Consistency, such as
//! it is, is last-write-wins at each relay.

mod directory;
mod error;
mod event;
mod filter;
mod gateway;
mod memory;
mod message;
mod transport;

pub mod kind;

pub use directory::{RelayDirectory, RelayEndpoint, RelayPermissions, WriteRelayCache};
pub use error::RelayError;
pub use event::{Event, Tag};
pub use filter::Filter;
pub use gateway::RelayGateway;
pub use memory::{MemoryNetwork, SimulatedRelay};
pub use message::{ClientMessage, RelayMessage};
pub use transport::{RelayTransport, WebSocketTransport};

pub type Result<T> = std::result::Result<T, RelayError>;
