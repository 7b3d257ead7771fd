//! Deterministic in-memory implementations of the ports.
//!
//! Used by the test suites and handy for wiring the synchronizer without a
//! network: a sink that records what it was asked to render, a clock that
//! records requested delays and returns at once, and scripted status sources,
//! event connectors and transports.

use crate::domain::ports::{
    Clock, EventConnection, EventConnectionBox, EventConnector, PresentationSink, StatusSource,
    StreamEvent, Transport,
};
use crate::domain::status::{Status, StatusPayload};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Sink that keeps every rendered status in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    rendered: Vec<Status>,
}

impl RecordingSink {
    /// Creates a new, empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every status rendered so far, oldest first.
    pub fn rendered(&self) -> &[Status] {
        &self.rendered
    }
}

impl PresentationSink for RecordingSink {
    fn render(&mut self, status: &Status) {
        self.rendered.push(status.clone());
    }
}

/// Clock that never waits. Each requested delay is recorded.
#[derive(Debug, Default, Clone)]
pub struct RecordingClock {
    delays: Arc<RwLock<Vec<Duration>>>,
}

impl RecordingClock {
    /// Creates a new clock with no recorded delays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub async fn delays(&self) -> Vec<Duration> {
        self.delays.read().await.clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.delays.write().await.push(duration);
        tokio::task::yield_now().await;
    }
}

/// Status source answering from a fixed script of successes and failures.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStatusSource {
    responses: Arc<Mutex<VecDeque<Option<Status>>>>,
    fetches: Arc<RwLock<usize>>,
}

impl ScriptedStatusSource {
    /// `None` entries answer with a request failure.
    pub fn new(responses: impl IntoIterator<Item = Option<Status>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
            fetches: Arc::default(),
        }
    }

    /// Number of `fetch` calls made so far.
    pub async fn fetches(&self) -> usize {
        *self.fetches.read().await
    }
}

#[async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn fetch(&self) -> Result<Status> {
        *self.fetches.write().await += 1;
        match self.responses.lock().await.pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(SyncError::UnexpectedStatus {
                status: 503,
                url: "scripted".into(),
            }),
            None => Err(SyncError::StreamClosed),
        }
    }
}

/// One frame of a scripted push connection.
#[derive(Debug, Clone)]
pub enum ScriptedFrame {
    /// Served as is. An `id` replaces the connection's last event id; an
    /// empty one clears it.
    Event(StreamEvent),
    /// A `retry:` field with no event attached.
    Retry(Duration),
    /// The connection fails while reading.
    Error,
}

impl ScriptedFrame {
    /// A `status` event carrying `{"status": <status>}`.
    pub fn status(status: impl Into<Status>) -> Self {
        let payload = StatusPayload {
            status: status.into(),
        };
        let data = serde_json::to_string(&payload).unwrap_or_default();
        ScriptedFrame::Event(StreamEvent {
            event: "status".into(),
            data,
            ..StreamEvent::default()
        })
    }
}

/// One scripted connection attempt.
#[derive(Debug, Clone)]
pub enum ScriptedConnection {
    Refused,
    /// Frames are served in order; the server ends the stream after the last one.
    Open(Vec<ScriptedFrame>),
}

/// What a [`ScriptedConnector`] observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectorLog {
    pub connects: usize,
    pub closes: usize,
    pub last_event_ids: Vec<Option<String>>,
    /// Frames still unread on each connection when it was closed.
    pub unread_at_close: Vec<usize>,
}

/// Event connector serving a fixed list of connections.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    connections: Arc<Mutex<VecDeque<ScriptedConnection>>>,
    log: Arc<RwLock<ConnectorLog>>,
}

impl ScriptedConnector {
    /// Creates a new connector answering connection attempts in order.
    /// Attempts past the end of the list are refused.
    pub fn new(connections: impl IntoIterator<Item = ScriptedConnection>) -> Self {
        Self {
            connections: Arc::new(Mutex::new(connections.into_iter().collect())),
            log: Arc::default(),
        }
    }

    /// Snapshot of what the connector has seen so far.
    pub async fn log(&self) -> ConnectorLog {
        self.log.read().await.clone()
    }
}

#[async_trait]
impl EventConnector for ScriptedConnector {
    async fn connect(&self, last_event_id: Option<&str>) -> Result<EventConnectionBox> {
        {
            let mut log = self.log.write().await;
            log.connects += 1;
            log.last_event_ids.push(last_event_id.map(str::to_string));
        }
        match self.connections.lock().await.pop_front() {
            Some(ScriptedConnection::Open(frames)) => Ok(Box::new(ScriptedStream {
                frames: frames.into(),
                log: Arc::clone(&self.log),
                last_event_id: last_event_id.map(str::to_string),
                retry: None,
                closed: false,
            })),
            Some(ScriptedConnection::Refused) | None => Err(SyncError::StreamClosed),
        }
    }
}

struct ScriptedStream {
    frames: VecDeque<ScriptedFrame>,
    log: Arc<RwLock<ConnectorLog>>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
    closed: bool,
}

#[async_trait]
impl EventConnection for ScriptedStream {
    async fn next_event(&mut self) -> Result<Option<StreamEvent>> {
        if self.closed {
            return Err(SyncError::StreamClosed);
        }
        loop {
            match self.frames.pop_front() {
                Some(ScriptedFrame::Event(event)) => {
                    if let Some(id) = &event.id {
                        self.last_event_id = (!id.is_empty()).then(|| id.clone());
                    }
                    return Ok(Some(event));
                }
                Some(ScriptedFrame::Retry(delay)) => self.retry = Some(delay),
                Some(ScriptedFrame::Error) => return Err(SyncError::StreamClosed),
                None => return Ok(None),
            }
        }
    }

    fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    fn retry(&self) -> Option<Duration> {
        self.retry
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut log = self.log.write().await;
        log.closes += 1;
        log.unread_at_close.push(self.frames.len());
    }
}

/// Transport delivering a fixed sequence, stopping after the first terminal value.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    statuses: VecDeque<Status>,
}

impl ScriptedTransport {
    /// Creates a new transport that delivers `statuses` in order.
    pub fn new(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn on_update(&mut self, callback: &mut (dyn FnMut(Status) + Send)) -> Result<Status> {
        while let Some(status) = self.statuses.pop_front() {
            callback(status.clone());
            if status.is_terminal() {
                return Ok(status);
            }
        }
        Err(SyncError::StreamClosed)
    }
}
