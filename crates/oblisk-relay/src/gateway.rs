//! Relay gateway
//!
//! Fans a query or a publish out to a set of relays concurrently. There is
//! no consensus between relays and the gateway does not try to build one:
//!
//! - `query` returns the newest matching record from the **first relay that
//!   answers with a match**. A slower relay holding a newer record is
//!   silently missed.
//! - `publish` hands the record to every relay and returns. Acceptance is
//!   never checked and failures are only logged.

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RelayError;
use crate::event::Event;
use crate::filter::Filter;
use crate::transport::RelayTransport;
use crate::Result;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(4);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(4);

pub struct RelayGateway {
    transport: Arc<dyn RelayTransport>,
    query_timeout: Duration,
    publish_timeout: Duration,
}

impl RelayGateway {
    pub fn new(transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            transport,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, query_timeout: Duration, publish_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self.publish_timeout = publish_timeout;
        self
    }

    /// Best-effort first-responder lookup.
    ///
    /// - `Ok(Some(event))`: some relay answered with a matching record
    /// - `Ok(None)`: at least one relay answered and none had a match
    /// - `Err(Unavailable)`: no relay answered at all
    pub async fn query(&self, relays: &[String], filter: &Filter) -> Result<Option<Event>> {
        let relays = dedup(relays);
        let attempted = relays.len();

        let mut pending: FuturesUnordered<_> = relays
            .into_iter()
            .map(|relay| async move {
                let outcome =
                    match tokio::time::timeout(self.query_timeout, self.transport.fetch(relay, filter))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(RelayError::Timeout(relay.to_string())),
                    };
                (relay, outcome)
            })
            .collect();

        let mut answered = 0usize;
        while let Some((relay, outcome)) = pending.next().await {
            match outcome {
                Ok(events) => {
                    answered += 1;
                    let newest = events
                        .into_iter()
                        .filter(|event| filter.matches(event))
                        .filter(|event| match event.verify() {
                            Ok(()) => true,
                            Err(e) => {
                                tracing::warn!(relay = %relay, event_id = %event.id, error = %e, "Discarding invalid event");
                                false
                            }
                        })
                        .max_by_key(|event| event.created_at);

                    if let Some(event) = newest {
                        tracing::debug!(relay = %relay, event_id = %event.id, kind = event.kind, "Query answered");
                        return Ok(Some(event));
                    }
                }
                Err(e) => {
                    tracing::warn!(relay = %relay, error = %e, "Relay query failed");
                }
            }
        }

        if answered == 0 {
            return Err(RelayError::Unavailable { attempted });
        }

        Ok(None)
    }

    /// Send `event` to every relay. Returns once each relay has been handed
    /// the record or has failed; no failure is reported to the caller.
    pub async fn publish(&self, relays: &[String], event: &Event) {
        let sends = dedup(relays).into_iter().map(|relay| async move {
            match tokio::time::timeout(self.publish_timeout, self.transport.send(relay, event)).await {
                Ok(Ok(())) => {
                    tracing::debug!(relay = %relay, event_id = %event.id, kind = event.kind, "Published");
                }
                Ok(Err(e)) => {
                    tracing::warn!(relay = %relay, event_id = %event.id, error = %e, "Publish failed");
                }
                Err(_) => {
                    tracing::warn!(relay = %relay, event_id = %event.id, "Publish timed out");
                }
            }
        });

        futures_util::future::join_all(sends).await;
    }

    /// Release connections to `relays`
    pub async fn close(&self, relays: &[String]) {
        for relay in dedup(relays) {
            self.transport.disconnect(relay).await;
        }
    }
}

fn dedup(relays: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    relays
        .iter()
        .map(String::as_str)
        .filter(|relay| seen.insert(*relay))
        .collect()
}
