//! Local state keys

/// Hex secret key of the signed-in account
pub const HEX_PRIV_KEY: &str = "hexPrivKey";
pub const HEX_PUB: &str = "hexPub";
/// JSON map of window id to `{sessionId, sessionName}`
pub const ACTIVE_SESSIONS: &str = "activeSessions";
pub const LAST_TRACKED_SESSION_ID: &str = "lastTrackedSessionId";
pub const RESTORE_LAST_SESSION: &str = "restoreLastSession";
pub const ENABLE_NOSTR_SIGNER: &str = "enableNostrSigner";
