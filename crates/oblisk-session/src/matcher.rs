//! Window-to-session matching
//!
//! A window matches a stored session when the hash of its open tabs equals
//! the entry's `hash` exactly. No fuzzy or subset matching: reordering or
//! adding a tab breaks the match until the next sync rewrites the hash.

use oblisk_tabs::{tabs_hash, Tab};

use crate::index::SessionIndexEntry;

pub struct SessionMatcher;

impl SessionMatcher {
    pub fn find<'a>(entries: &'a [SessionIndexEntry], open_tabs: &[Tab]) -> Option<&'a SessionIndexEntry> {
        let hash = tabs_hash(open_tabs);
        entries.iter().find(|entry| entry.hash == hash)
    }
}
