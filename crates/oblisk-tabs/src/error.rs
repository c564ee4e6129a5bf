//! Tab error types

use thiserror::Error;

use crate::tab::{TabId, WindowId};

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("No window has focus")]
    NoCurrentWindow,
}
