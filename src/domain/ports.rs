use super::status::Status;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Delivers status observations for one invoice.
///
/// `on_update` invokes `callback` zero or more times with observed values (not
/// necessarily changed ones) and returns the terminal status once one is seen.
/// Delivery failures are handled inside the transport and never surface here.
#[async_trait]
pub trait Transport: Send {
    async fn on_update(&mut self, callback: &mut (dyn FnMut(Status) + Send)) -> Result<Status>;
}

/// Receives de-duplicated status transitions for display.
pub trait PresentationSink: Send {
    fn render(&mut self, status: &Status);
}

/// Time source for scheduling. Injected so backoff can be tested deterministically.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// One-shot status request used by the poll transport.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<Status>;
}

/// A named message read off a server-push stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamEvent {
    pub event: String,
    pub data: String,
    /// Last event id in effect when the message was dispatched.
    pub id: Option<String>,
}

/// An open server-push connection.
#[async_trait]
pub trait EventConnection: Send {
    /// Next dispatched event, `Ok(None)` when the server ended the stream.
    async fn next_event(&mut self) -> Result<Option<StreamEvent>>;

    /// Id to send as `Last-Event-ID` when this stream is reopened.
    fn last_event_id(&self) -> Option<&str>;

    /// Reconnection delay requested by the server on this connection, if any.
    fn retry(&self) -> Option<Duration>;

    async fn close(&mut self);
}

/// Opens server-push connections scoped to one invoice.
#[async_trait]
pub trait EventConnector: Send + Sync {
    async fn connect(&self, last_event_id: Option<&str>) -> Result<EventConnectionBox>;
}

pub type TransportBox = Box<dyn Transport>;
pub type PresentationSinkBox = Box<dyn PresentationSink>;
pub type ClockBox = Box<dyn Clock>;
pub type StatusSourceBox = Box<dyn StatusSource>;
pub type EventConnectionBox = Box<dyn EventConnection>;
pub type EventConnectorBox = Box<dyn EventConnector>;

impl PresentationSink for PresentationSinkBox {
    fn render(&mut self, status: &Status) {
        (**self).render(status)
    }
}

#[async_trait]
impl Transport for TransportBox {
    async fn on_update(&mut self, callback: &mut (dyn FnMut(Status) + Send)) -> Result<Status> {
        (**self).on_update(callback).await
    }
}

#[async_trait]
impl Clock for ClockBox {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

#[async_trait]
impl StatusSource for StatusSourceBox {
    async fn fetch(&self) -> Result<Status> {
        (**self).fetch().await
    }
}

#[async_trait]
impl EventConnector for EventConnectorBox {
    async fn connect(&self, last_event_id: Option<&str>) -> Result<EventConnectionBox> {
        (**self).connect(last_event_id).await
    }
}
