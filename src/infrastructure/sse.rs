//! Server-push connection over `text/event-stream`.
//!
//! [`SseDecoder`] turns raw body chunks into dispatched events following the
//! event-stream framing rules; [`HttpEventConnector`] opens the per-invoice
//! stream with reqwest and feeds its body through the decoder.

use super::http::join_segments;
use crate::domain::invoice::InvoiceId;
use crate::domain::ports::{EventConnection, EventConnectionBox, EventConnector, StreamEvent};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

const DEFAULT_EVENT: &str = "message";
const BOM: &[u8] = "\u{FEFF}".as_bytes();

/// Longest line kept. The rest of a longer line is discarded up to the next
/// line break.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Incremental `text/event-stream` parser.
///
/// Chunks may split lines (and CRLF pairs) anywhere. Events are dispatched on
/// a blank line; an event with no `data` field is dropped. `id` and `retry`
/// take effect even when no event is dispatched.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    line_overflow: bool,
    after_cr: bool,
    past_first_line: bool,
    event: Option<String>,
    data: Option<String>,
    id: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    /// Creates a new decoder for a fresh stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder for a reopened stream, carrying over the last event id.
    pub fn resuming(last_event_id: Option<&str>) -> Self {
        let last_event_id = last_event_id.map(str::to_string);
        Self {
            id: last_event_id.clone(),
            last_event_id,
            ..Self::default()
        }
    }

    /// The id to resume from, as of the last blank line. An empty `id:` clears it.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// The latest reconnection delay the server asked for.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Feeds one body chunk and returns every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\r' => {
                    self.after_cr = true;
                    self.end_line(&mut events);
                }
                b'\n' => self.end_line(&mut events),
                _ if self.line.len() < MAX_LINE_BYTES => self.line.push(byte),
                _ => self.line_overflow = true,
            }
        }
        events
    }

    fn end_line(&mut self, events: &mut Vec<StreamEvent>) {
        let mut line = std::mem::take(&mut self.line);
        let first_line = !std::mem::replace(&mut self.past_first_line, true);
        if std::mem::take(&mut self.line_overflow) {
            tracing::warn!(limit = MAX_LINE_BYTES, "Discarding oversized event-stream line");
            return;
        }
        if first_line && line.starts_with(BOM) {
            line = line.split_off(BOM.len());
        }

        if line.is_empty() {
            self.last_event_id = self.id.clone();
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line[0] == b':' {
            return;
        }

        let line = String::from_utf8_lossy(&line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" if !value.contains('\0') => {
                self.id = (!value.is_empty()).then(|| value.to_string());
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
                    && let Ok(ms) = value.parse::<u64>()
                {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<StreamEvent> {
        let event = self.event.take();
        let data = self.data.take()?;
        Some(StreamEvent {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_event_id.clone(),
        })
    }
}

/// Opens `GET {stream_base}/pay/{id}/stream` as an event stream.
#[derive(Debug, Clone)]
pub struct HttpEventConnector {
    http: reqwest::Client,
    url: Url,
}

impl HttpEventConnector {
    /// Creates a new connector for `invoice` under `stream_base`.
    pub fn new(http: reqwest::Client, stream_base: &Url, invoice: &InvoiceId) -> Result<Self> {
        let url = join_segments(stream_base, &["pay", invoice.as_str(), "stream"])?;
        Ok(Self { http, url })
    }

    /// The stream URL every connection opens.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl EventConnector for HttpEventConnector {
    async fn connect(&self, last_event_id: Option<&str>) -> Result<EventConnectionBox> {
        let mut req = self
            .http
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            req = req.header("Last-Event-ID", id);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        tracing::debug!(url = %self.url, "Event stream opened");
        Ok(Box::new(HttpEventStream {
            body: Some(resp.bytes_stream().boxed()),
            decoder: SseDecoder::resuming(last_event_id),
            ready: VecDeque::new(),
        }))
    }
}

struct HttpEventStream {
    body: Option<BoxStream<'static, reqwest::Result<bytes::Bytes>>>,
    decoder: SseDecoder,
    ready: VecDeque<StreamEvent>,
}

#[async_trait]
impl EventConnection for HttpEventStream {
    async fn next_event(&mut self) -> Result<Option<StreamEvent>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Ok(Some(event));
            }
            let Some(body) = self.body.as_mut() else {
                return Err(SyncError::StreamClosed);
            };
            match body.next().await {
                Some(Ok(chunk)) => self.ready.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    fn last_event_id(&self) -> Option<&str> {
        self.decoder.last_event_id()
    }

    fn retry(&self) -> Option<Duration> {
        self.decoder.retry()
    }

    async fn close(&mut self) {
        // Dropping the body releases the underlying connection.
        self.body = None;
        self.ready.clear();
    }
}
