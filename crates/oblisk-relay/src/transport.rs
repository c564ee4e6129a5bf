//! Relay transport
//!
//! [`RelayTransport`] is the seam between the gateway and the network: one
//! subscription or one publish against one relay. [`WebSocketTransport`] is
//! the production implementation, keeping one pooled `tokio-tungstenite`
//! connection per relay URL until [`RelayTransport::disconnect`].

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;

use crate::error::RelayError;
use crate::event::Event;
use crate::filter::Filter;
use crate::message::{ClientMessage, RelayMessage};
use crate::Result;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;
type SharedStream = Arc<tokio::sync::Mutex<WsStream>>;

#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Run one subscription against one relay and collect the stored events
    /// it returns up to end-of-stored-events.
    async fn fetch(&self, relay: &str, filter: &Filter) -> Result<Vec<Event>>;

    /// Hand an event to one relay. Acceptance (`OK`) is not awaited.
    async fn send(&self, relay: &str, event: &Event) -> Result<()>;

    /// Drop any connection held for `relay`
    async fn disconnect(&self, relay: &str);
}

/// Accept only `ws://` and `wss://` URLs
pub(crate) fn validate_relay_url(relay: &str) -> Result<()> {
    let parsed =
        url::Url::parse(relay).map_err(|e| RelayError::InvalidUrl(format!("{relay}: {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" if parsed.host_str().is_some() => Ok(()),
        _ => Err(RelayError::InvalidUrl(relay.to_string())),
    }
}

#[derive(Default)]
pub struct WebSocketTransport {
    connections: Arc<Mutex<HashMap<String, SharedStream>>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn connection(&self, relay: &str) -> Result<SharedStream> {
        if let Some(existing) = self.connections.lock().get(relay).cloned() {
            return Ok(existing);
        }

        validate_relay_url(relay)?;

        let (stream, _response) = tokio_tungstenite::connect_async(relay)
            .await
            .map_err(|e| connection_error(relay, e))?;

        tracing::debug!(relay = %relay, "Connected to relay");

        // Another task may have connected concurrently; keep the first one.
        let shared = self
            .connections
            .lock()
            .entry(relay.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(stream)))
            .clone();

        Ok(shared)
    }

    fn evict(&self, relay: &str) {
        if self.connections.lock().remove(relay).is_some() {
            tracing::debug!(relay = %relay, "Dropped broken relay connection");
        }
    }

    async fn run_subscription(stream: &mut WsStream, relay: &str, filter: &Filter) -> Result<Vec<Event>> {
        let subscription_id = uuid::Uuid::new_v4().simple().to_string();

        let req = ClientMessage::Req {
            subscription_id: subscription_id.clone(),
            filter: filter.clone(),
        };
        stream
            .send(Message::Text(req.to_json()?))
            .await
            .map_err(|e| connection_error(relay, e))?;

        let mut events = Vec::new();
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => match RelayMessage::from_json(&text) {
                    Ok(RelayMessage::Event {
                        subscription_id: sub,
                        event,
                    }) if sub == subscription_id => events.push(*event),
                    Ok(RelayMessage::EndOfStoredEvents(sub)) if sub == subscription_id => break,
                    Ok(RelayMessage::Closed {
                        subscription_id: sub,
                        message,
                    }) if sub == subscription_id => {
                        return Err(RelayError::Protocol(format!(
                            "{relay} closed subscription: {message}"
                        )));
                    }
                    Ok(RelayMessage::Notice(notice)) => {
                        tracing::debug!(relay = %relay, notice = %notice, "Relay notice");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(relay = %relay, error = %e, "Ignoring unparseable frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    return Err(RelayError::Connection {
                        relay: relay.to_string(),
                        reason: "connection closed".to_string(),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(connection_error(relay, e)),
            }
        }

        let close = ClientMessage::Close(subscription_id).to_json()?;
        if let Err(e) = stream.send(Message::Text(close)).await {
            tracing::debug!(relay = %relay, error = %e, "Failed to close subscription");
        }

        Ok(events)
    }
}

#[async_trait]
impl RelayTransport for WebSocketTransport {
    async fn fetch(&self, relay: &str, filter: &Filter) -> Result<Vec<Event>> {
        let connection = self.connection(relay).await?;
        let result = {
            let mut stream = connection.lock().await;
            Self::run_subscription(&mut stream, relay, filter).await
        };

        if matches!(result, Err(RelayError::Connection { .. })) {
            self.evict(relay);
        }

        result
    }

    async fn send(&self, relay: &str, event: &Event) -> Result<()> {
        let connection = self.connection(relay).await?;
        let frame = ClientMessage::Event(event.clone()).to_json()?;

        let result = connection
            .lock()
            .await
            .send(Message::Text(frame))
            .await
            .map_err(|e| connection_error(relay, e));

        if result.is_err() {
            self.evict(relay);
        }

        result
    }

    async fn disconnect(&self, relay: &str) {
        let removed = self.connections.lock().remove(relay);
        if let Some(connection) = removed {
            if let Err(e) = connection.lock().await.close(None).await {
                tracing::debug!(relay = %relay, error = %e, "Relay close failed");
            }
            tracing::debug!(relay = %relay, "Disconnected from relay");
        }
    }
}

fn connection_error(relay: &str, error: impl std::fmt::Display) -> RelayError {
    RelayError::Connection {
        relay: relay.to_string(),
        reason: error.to_string(),
    }
}
