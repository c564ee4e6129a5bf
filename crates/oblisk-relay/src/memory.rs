//! In-process relay network
//!
//! A [`RelayTransport`] backed by per-relay event vectors. Each relay keeps
//! only the last write it saw for a replaceable slot, which mirrors how real
//! relays treat kinds 0, 3, 10000-19999 and 30000-39999. Relays can be
//! scripted to hang, answer late or refuse connections, which is how
//! offline runs and the test suites exercise the gateway's weak guarantees.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::RelayError;
use crate::event::Event;
use crate::filter::Filter;
use crate::transport::RelayTransport;
use crate::Result;

/// Scripted behaviour of one simulated relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulatedRelay {
    #[default]
    Normal,
    /// Accepts connections but never answers a query
    Hang,
    /// Answers queries only after the delay
    Slow(Duration),
    /// Refuses every query and publish
    Down,
}

#[derive(Default)]
pub struct MemoryNetwork {
    stored: Mutex<HashMap<String, Vec<Event>>>,
    behaviour: Mutex<HashMap<String, SimulatedRelay>>,
    disconnected: Mutex<Vec<String>>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behaviour(&self, relay: &str, behaviour: SimulatedRelay) {
        self.behaviour.lock().insert(relay.to_string(), behaviour);
    }

    fn behaviour_of(&self, relay: &str) -> SimulatedRelay {
        self.behaviour
            .lock()
            .get(relay)
            .copied()
            .unwrap_or_default()
    }

    /// Store `event` on `relay` as if it had been published there
    pub fn seed(&self, relay: &str, event: Event) {
        let mut stored = self.stored.lock();
        let events = stored.entry(relay.to_string()).or_default();

        if let Some(key) = replaceable_key(&event) {
            let same_slot = |existing: &Event| replaceable_key(existing).as_ref() == Some(&key);
            // newer wins; on equal timestamps the lowest id stays
            let kept = |existing: &Event| {
                existing.created_at > event.created_at
                    || (existing.created_at == event.created_at && existing.id <= event.id)
            };
            if events.iter().any(|existing| same_slot(existing) && kept(existing)) {
                tracing::debug!(relay = %relay, event_id = %event.id, "Rejecting superseded replaceable event");
                return;
            }
            events.retain(|existing| !same_slot(existing));
        }
        events.push(event);
    }

    /// Everything `relay` currently holds, in arrival order
    pub fn events_on(&self, relay: &str) -> Vec<Event> {
        self.stored.lock().get(relay).cloned().unwrap_or_default()
    }

    /// Relays that received a disconnect, in call order
    pub fn disconnected(&self) -> Vec<String> {
        self.disconnected.lock().clone()
    }
}

/// (author, kind, d) for replaceable kinds, `None` for regular events
fn replaceable_key(event: &Event) -> Option<(String, u32, String)> {
    let kind = event.kind;
    let replaceable = kind == 0 || kind == 3 || (10_000..20_000).contains(&kind);
    let parameterized = (30_000..40_000).contains(&kind);

    if replaceable {
        Some((event.pubkey.clone(), kind, String::new()))
    } else if parameterized {
        let d = event.identifier().unwrap_or_default().to_string();
        Some((event.pubkey.clone(), kind, d))
    } else {
        None
    }
}

#[async_trait]
impl RelayTransport for MemoryNetwork {
    async fn fetch(&self, relay: &str, filter: &Filter) -> Result<Vec<Event>> {
        match self.behaviour_of(relay) {
            SimulatedRelay::Hang => std::future::pending::<()>().await,
            SimulatedRelay::Slow(delay) => tokio::time::sleep(delay).await,
            SimulatedRelay::Down => {
                return Err(RelayError::Connection {
                    relay: relay.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            SimulatedRelay::Normal => {}
        }

        Ok(self
            .events_on(relay)
            .into_iter()
            .filter(|event| filter.matches(event))
            .collect())
    }

    async fn send(&self, relay: &str, event: &Event) -> Result<()> {
        if self.behaviour_of(relay) == SimulatedRelay::Down {
            return Err(RelayError::Connection {
                relay: relay.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        self.seed(relay, event.clone());
        Ok(())
    }

    async fn disconnect(&self, relay: &str) {
        self.disconnected.lock().push(relay.to_string());
    }
}
