//! Oblisk Tabs
//!
//! What the sync engine knows about the browser: a [`Tab`] snapshot type,
//! the order-sensitive tab-set [`tabs_hash`], the [`WindowManager`] seam the
//! engine drives windows through, and the [`BrowserEvent`]s it reacts to.
//! [`MemoryBrowser`] is an in-process window manager.

mod error;
mod event;
mod manager;
mod memory;
mod tab;

pub use error::TabError;
pub use event::BrowserEvent;
pub use manager::{NewTab, WindowManager};
pub use memory::MemoryBrowser;
pub use tab::{tabs_hash, Tab, TabId, WindowId};

pub type Result<T> = std::result::Result<T, TabError>;
