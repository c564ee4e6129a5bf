//! Sync status badge
//!
//! The only place a background sync failure becomes visible. A session's
//! color is derived from its name, so the same session shows the same color
//! in every window and after every restart.

use parking_lot::Mutex;

const NEUTRAL: &str = "#555";
const ERROR_RED: &str = "#FF0000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

impl Badge {
    pub fn unbound() -> Self {
        Self {
            text: "<->".to_string(),
            color: NEUTRAL.to_string(),
        }
    }

    pub fn pending() -> Self {
        Self {
            text: " ".to_string(),
            color: NEUTRAL.to_string(),
        }
    }

    pub fn synced(session_name: &str) -> Self {
        Self {
            text: " ".to_string(),
            color: session_color(session_name),
        }
    }

    pub fn error() -> Self {
        Self {
            text: "<!>".to_string(),
            color: ERROR_RED.to_string(),
        }
    }
}

/// `hsl(h, s%, l%)` from a 32-bit rolling hash over the UTF-16 code units of
/// `name`
pub fn session_color(name: &str) -> String {
    let hash = name.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });

    let hue = (hash % 360).unsigned_abs();
    let saturation = 60 + (hash % 40).unsigned_abs();
    let lightness = 40 + (hash % 50).unsigned_abs();

    format!("hsl({hue}, {saturation}%, {lightness}%)")
}

/// Where badge updates are shown
pub trait BadgeSink: Send + Sync {
    fn show(&self, badge: Badge);
}

/// Keeps every badge it was shown
#[derive(Debug, Default)]
pub struct MemoryBadge {
    shown: Mutex<Vec<Badge>>,
}

impl MemoryBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Badge> {
        self.shown.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<Badge> {
        self.shown.lock().clone()
    }
}

impl BadgeSink for MemoryBadge {
    fn show(&self, badge: Badge) {
        self.shown.lock().push(badge);
    }
}
