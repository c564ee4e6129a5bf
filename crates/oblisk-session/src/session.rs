//! Session data structure

use chrono::{DateTime, Utc};
use oblisk_tabs::{tabs_hash, Tab};
use serde::{Deserialize, Serialize};

use crate::index::SessionIndexEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Creation time in milliseconds, as a decimal string. Never reused.
    pub id: String,
    pub name: String,
    /// Tabs in strip order
    pub tabs: Vec<Tab>,
    pub updated_on: DateTime<Utc>,
}

impl Session {
    /// A new session capturing `tabs`, its id taken from the current time
    pub fn new(name: impl Into<String>, tabs: Vec<Tab>) -> Self {
        let now = Utc::now();

        Self {
            id: now.timestamp_millis().to_string(),
            name: name.into(),
            tabs,
            updated_on: now,
        }
    }

    /// A new session named after the current time in base 36, for windows the
    /// user never named
    pub fn untracked(tabs: Vec<Tab>) -> Self {
        let now = Utc::now();

        Self {
            id: now.timestamp_millis().to_string(),
            name: base36(now.timestamp_millis()),
            tabs,
            updated_on: now,
        }
    }

    /// Same session, new tab snapshot
    pub fn with_tabs(&self, tabs: Vec<Tab>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            tabs,
            updated_on: Utc::now(),
        }
    }

    pub fn hash(&self) -> String {
        tabs_hash(&self.tabs)
    }

    /// Index entry for this session as stored in record `event_id`
    pub fn index_entry(&self, event_id: impl Into<String>) -> SessionIndexEntry {
        SessionIndexEntry {
            session_id: self.id.clone(),
            name: self.name.clone(),
            session_event_id: event_id.into(),
            total_tabs: self.tabs.len(),
            hash: self.hash(),
        }
    }
}

fn base36(value: i64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let negative = value < 0;
    let mut rest = value.unsigned_abs();
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(rest % 36) as usize]);
        rest /= 36;
        if rest == 0 {
            break;
        }
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new("work", vec![Tab::new(0, "https://a")]);
        assert_eq!(session.name, "work");
        assert!(session.id.parse::<i64>().is_ok());
        assert_eq!(session.id, session.updated_on.timestamp_millis().to_string());
    }

    #[test]
    fn test_untracked_name_is_base36_timestamp() {
        let session = Session::untracked(Vec::new());
        let millis: i64 = session.id.parse().unwrap();
        assert_eq!(i64::from_str_radix(&session.name, 36).unwrap(), millis);
    }

    #[test]
    fn test_base36() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_700_000_000_000), "loyw3v28");
        assert_eq!(base36(-71), "-1z");
    }

    #[test]
    fn test_index_entry() {
        let session = Session::new(
            "work",
            vec![Tab::new(0, "https://a"), Tab::new(1, "https://b")],
        );
        let entry = session.index_entry("event-1");

        assert_eq!(entry.session_id, session.id);
        assert_eq!(entry.name, "work");
        assert_eq!(entry.session_event_id, "event-1");
        assert_eq!(entry.total_tabs, 2);
        assert_eq!(entry.hash, session.hash());
    }

    #[test]
    fn test_wire_shape() {
        let session = Session::new("work", Vec::new());
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("updatedOn").is_some());
        assert_eq!(value["tabs"], serde_json::json!([]));

        let parsed: Session = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, session);
    }
}
