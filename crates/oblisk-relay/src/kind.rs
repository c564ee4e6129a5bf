//! Record kinds used by the session store

/// Account profile metadata (JSON content)
pub const METADATA: u32 = 0;
/// Legacy contact list; content maps relay URL to `{read, write}`
pub const CONTACTS: u32 = 3;
/// Relay-list record with `["r", url, marker?]` tags
pub const RELAY_LIST: u32 = 10002;
/// Parameterized replaceable application record, keyed by its `d` tag
pub const APP_DATA: u32 = 30078;
