//! Deployment configuration for one status watch.
//!
//! The transport is picked here, once. There is no runtime fallback from one
//! delivery mechanism to the other.

use crate::domain::invoice::InvoiceIdentity;
use crate::domain::ports::TransportBox;
use crate::error::Result;
use crate::infrastructure::clock::TokioClock;
use crate::infrastructure::http::{HttpStatusSource, build_client};
use crate::infrastructure::poll::{PollSchedule, PollTransport};
use crate::infrastructure::push::{DEFAULT_RECONNECT_DELAY, PushTransport};
use crate::infrastructure::sse::HttpEventConnector;
use clap::ValueEnum;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportKind {
    /// Re-request the invoice on a fixed schedule.
    #[default]
    Poll,
    /// Hold one event stream open.
    Push,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub invoice: InvoiceIdentity,
    /// Base of `GET /api/invoice/{id}`.
    pub api_base: Url,
    /// Base of `/pay/{id}/stream`, including any payment path prefix.
    pub stream_base: Url,
    pub transport: TransportKind,
    pub poll: PollSchedule,
    pub reconnect_delay: Duration,
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Creates a new config with default timings, streaming from `api_base`.
    pub fn new(invoice: InvoiceIdentity, api_base: Url) -> Self {
        Self {
            invoice,
            stream_base: api_base.clone(),
            api_base,
            transport: TransportKind::default(),
            poll: PollSchedule::default(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Builds the configured transport on the tokio clock.
    pub fn build_transport(&self) -> Result<TransportBox> {
        let http = build_client(self.request_timeout)?;
        let transport: TransportBox = match self.transport {
            TransportKind::Poll => {
                let source = HttpStatusSource::new(
                    http,
                    &self.api_base,
                    &self.invoice.id,
                    self.request_timeout,
                )?;
                tracing::debug!(url = %source.url(), "Polling invoice status");
                Box::new(PollTransport::new(source, TokioClock, self.poll))
            }
            TransportKind::Push => {
                let connector = HttpEventConnector::new(http, &self.stream_base, &self.invoice.id)?;
                tracing::debug!(url = %connector.url(), "Streaming invoice status");
                Box::new(
                    PushTransport::new(connector, TokioClock)
                        .with_reconnect_delay(self.reconnect_delay),
                )
            }
        };
        Ok(transport)
    }
}
