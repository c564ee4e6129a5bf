//! Oblisk Session Sync
//!
//! Sessions are stored as encrypted, author-scoped slots on the account's
//! write relays:
//! - each [`Session`] in its own slot, `<project>/session/<id>`
//! - the [`SessionIndex`] of all sessions in one slot, `<project>/root`
//!
//! Slots are last-write-wins per relay. The index is maintained with an
//! unsynchronized read-modify-write, so two racing index writes can lose one
//! of them. Nothing here detects that.
//!
//! [`ActiveSessionTracker`] binds browser windows to sessions and writes tab
//! changes back after a quiet period.

mod badge;
mod debounce;
mod error;
mod index;
mod matcher;
mod session;
mod slot;
mod store;
mod tracker;

#[cfg(test)]
mod testing;

pub use badge::{session_color, Badge, BadgeSink, MemoryBadge};
pub use debounce::{Debouncer, DEFAULT_QUIET_PERIOD};
pub use error::SessionError;
pub use index::{SessionIndex, SessionIndexEntry};
pub use matcher::SessionMatcher;
pub use session::Session;
pub use slot::SlotStore;
pub use store::SessionStore;
pub use tracker::{ActiveSessionTracker, Binding, RestoreGuard, SyncStatus, WindowState};

pub type Result<T> = std::result::Result<T, SessionError>;
