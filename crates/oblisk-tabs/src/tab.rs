//! Tab snapshot
//!
//! A [`Tab`] has no identity beyond its position in the window it was
//! captured from. `id` is whatever the browser called it at capture time and
//! is meaningless after a restart.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type WindowId = i64;
pub type TabId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    /// Position within the window, zero-based
    pub index: usize,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_in_reader_mode: Option<bool>,
}

impl Tab {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn url_or_blank(&self) -> &str {
        self.url.as_deref().unwrap_or("about:blank")
    }
}

/// Hex SHA-256 of the tab URLs joined with `|`, in the order given.
///
/// Only URLs contribute, so `active` and `pinned` never change the hash. A
/// tab without a URL contributes an empty segment.
pub fn tabs_hash(tabs: &[Tab]) -> String {
    let joined = tabs
        .iter()
        .map(|tab| tab.url.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("|");

    hex::encode(Sha256::digest(joined.as_bytes()))
}
