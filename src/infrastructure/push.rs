use crate::domain::ports::{
    Clock, ClockBox, EventConnection, EventConnector, EventConnectorBox, Transport,
};
use crate::domain::status::{Status, StatusPayload, is_terminal};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Name of the pushed message that carries a status payload.
pub const STATUS_EVENT: &str = "status";

/// Wait before reopening a dropped stream unless the server sent `retry:`.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Server-initiated transport over one persistent event stream.
///
/// A dropped or failed stream is reopened after the reconnect delay as long as
/// the last status seen is not terminal. The stream is closed as soon as a
/// terminal status has been delivered.
pub struct PushTransport<K = EventConnectorBox, C = ClockBox> {
    connector: K,
    clock: C,
    reconnect_delay: Duration,
    last_status: Option<Status>,
    last_event_id: Option<String>,
}

impl<K: EventConnector, C: Clock> PushTransport<K, C> {
    /// Creates a new push transport with the default reconnect delay.
    pub fn new(connector: K, clock: C) -> Self {
        Self {
            connector,
            clock,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            last_status: None,
            last_event_id: None,
        }
    }

    /// Overrides the reconnect delay used until the server sends `retry:`.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    fn terminal_status(&self) -> Option<Status> {
        self.last_status.clone().filter(is_terminal)
    }

    /// Reads one connection until it ends. Returns the terminal status if one
    /// arrived, `None` if the stream dropped first.
    async fn drain(
        &mut self,
        conn: &mut dyn EventConnection,
        callback: &mut (dyn FnMut(Status) + Send),
    ) -> Option<Status> {
        loop {
            let next = conn.next_event().await;
            self.last_event_id = conn.last_event_id().map(str::to_string);
            if let Some(retry) = conn.retry() {
                self.reconnect_delay = retry;
            }

            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => {
                    tracing::info!("Event stream ended by server");
                    return self.terminal_status();
                }
                Err(e) => {
                    tracing::warn!("Event stream error: {e}");
                    return self.terminal_status();
                }
            };

            if event.event != STATUS_EVENT {
                tracing::debug!(event = %event.event, "Ignoring event");
                continue;
            }

            let status = match StatusPayload::parse(&event.data) {
                Ok(payload) => payload.status,
                Err(e) => {
                    tracing::warn!("Skipping malformed status event: {e}");
                    continue;
                }
            };
            self.last_status = Some(status.clone());
            callback(status.clone());
            if is_terminal(&status) {
                return Some(status);
            }
        }
    }
}

#[async_trait]
impl<K: EventConnector, C: Clock> Transport for PushTransport<K, C> {
    async fn on_update(&mut self, callback: &mut (dyn FnMut(Status) + Send)) -> Result<Status> {
        loop {
            match self.connector.connect(self.last_event_id.as_deref()).await {
                Ok(mut conn) => {
                    let terminal = self.drain(conn.as_mut(), callback).await;
                    conn.close().await;
                    if let Some(status) = terminal {
                        tracing::debug!(%status, "Terminal status observed, stream closed");
                        return Ok(status);
                    }
                }
                Err(e) => tracing::warn!("Could not open event stream: {e}"),
            }

            tracing::info!(retry_in = ?self.reconnect_delay, "Reconnecting event stream");
            self.clock.sleep(self.reconnect_delay).await;
        }
    }
}
