//! Window manager seam
//!
//! The engine enumerates tabs and opens windows through [`WindowManager`]. It
//! never navigates, closes or reorders anything on its own.

use async_trait::async_trait;

use crate::tab::{Tab, TabId, WindowId};
use crate::Result;

/// Parameters for opening one tab in an existing window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTab {
    pub url: Option<String>,
    pub active: bool,
    pub pinned: bool,
    /// Requested position; appended when `None`
    pub index: Option<usize>,
}

impl NewTab {
    /// A tab opened behind the current one, at the end of the strip
    pub fn background(url: Option<String>) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Snapshot of every tab in `window`, in strip order
    async fn tabs(&self, window: WindowId) -> Result<Vec<Tab>>;

    /// The focused window
    async fn current_window(&self) -> Result<WindowId>;

    /// Open a window whose single tab shows `url`
    async fn create_window(&self, url: &str, maximized: bool) -> Result<WindowId>;

    async fn create_tab(&self, window: WindowId, tab: NewTab) -> Result<TabId>;

    async fn activate_tab(&self, tab: TabId) -> Result<()>;
}
