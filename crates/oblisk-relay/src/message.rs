//! Relay protocol frames
//!
//! ```text
//! client -> relay   ["REQ", sub, filter]   ["CLOSE", sub]   ["EVENT", event]
//! relay -> client   ["EVENT", sub, event]  ["EOSE", sub]    ["NOTICE", msg]
//!                   ["OK", id, accepted, msg]               ["CLOSED", sub, msg]
//! ```

use serde_json::Value;

use crate::error::RelayError;
use crate::event::Event;
use crate::filter::Filter;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Req { subscription_id: String, filter: Filter },
    Close(String),
    Event(Event),
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String> {
        let value = match self {
            ClientMessage::Req {
                subscription_id,
                filter,
            } => serde_json::json!(["REQ", subscription_id, filter]),
            ClientMessage::Close(subscription_id) => serde_json::json!(["CLOSE", subscription_id]),
            ClientMessage::Event(event) => serde_json::json!(["EVENT", event]),
        };
        Ok(serde_json::to_string(&value)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Event {
        subscription_id: String,
        event: Box<Event>,
    },
    EndOfStoredEvents(String),
    Notice(String),
    Ok {
        event_id: String,
        accepted: bool,
        message: String,
    },
    Closed {
        subscription_id: String,
        message: String,
    },
}

impl RelayMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let frame = value
            .as_array()
            .ok_or_else(|| RelayError::Protocol("frame is not an array".to_string()))?;

        let label = frame
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RelayError::Protocol("frame has no label".to_string()))?;

        let text_at = |index: usize| -> Result<String> {
            frame
                .get(index)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RelayError::Protocol(format!("{label} frame missing field {index}")))
        };

        match label {
            "EVENT" => {
                let raw = frame
                    .get(2)
                    .cloned()
                    .ok_or_else(|| RelayError::Protocol("EVENT frame missing event".to_string()))?;
                Ok(RelayMessage::Event {
                    subscription_id: text_at(1)?,
                    event: Box::new(serde_json::from_value(raw)?),
                })
            }
            "EOSE" => Ok(RelayMessage::EndOfStoredEvents(text_at(1)?)),
            "NOTICE" => Ok(RelayMessage::Notice(text_at(1).unwrap_or_default())),
            "OK" => Ok(RelayMessage::Ok {
                event_id: text_at(1)?,
                accepted: frame.get(2).and_then(Value::as_bool).unwrap_or(false),
                message: text_at(3).unwrap_or_default(),
            }),
            "CLOSED" => Ok(RelayMessage::Closed {
                subscription_id: text_at(1)?,
                message: text_at(2).unwrap_or_default(),
            }),
            other => Err(RelayError::Protocol(format!("unknown frame {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind;
    use oblisk_crypto::Account;

    #[test]
    fn test_client_frames() {
        let req = ClientMessage::Req {
            subscription_id: "s1".to_string(),
            filter: Filter::new().kind(kind::CONTACTS).author("ab"),
        };
        let sent: Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
        assert_eq!(
            sent,
            serde_json::json!(["REQ", "s1", {"kinds": [3], "authors": ["ab"]}])
        );
        assert_eq!(
            ClientMessage::Close("s1".to_string()).to_json().unwrap(),
            r#"["CLOSE","s1"]"#
        );
    }

    #[test]
    fn test_relay_frames() {
        let account = Account::generate();
        let event = crate::Event::sign(&account, kind::METADATA, Vec::new(), "{}");
        let frame = serde_json::json!(["EVENT", "s1", event]).to_string();

        match RelayMessage::from_json(&frame).unwrap() {
            RelayMessage::Event {
                subscription_id,
                event: received,
            } => {
                assert_eq!(subscription_id, "s1");
                assert_eq!(*received, event);
            }
            other => panic!("unexpected frame {other:?}"),
        }

        assert_eq!(
            RelayMessage::from_json(r#"["EOSE","s1"]"#).unwrap(),
            RelayMessage::EndOfStoredEvents("s1".to_string())
        );
        assert_eq!(
            RelayMessage::from_json(r#"["OK","abc",true,""]"#).unwrap(),
            RelayMessage::Ok {
                event_id: "abc".to_string(),
                accepted: true,
                message: String::new(),
            }
        );
        assert!(RelayMessage::from_json(r#"{"not":"a frame"}"#).is_err());
        assert!(RelayMessage::from_json(r#"["AUTH","challenge"]"#).is_err());
    }
}
