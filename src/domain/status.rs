use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an invoice's payment as reported by the server.
///
/// The server owns the state machine; the client only mirrors the last value it
/// saw. Any string outside the known set is kept as `Unrecognized` so newer
/// server-side states pass through without breaking the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Pending,
    Confirming,
    Sweeping,
    Completed,
    Expired,
    Failed,
    Unrecognized(String),
}

impl Status {
    /// The six values the page knows how to display.
    pub const KNOWN: [Status; 6] = [
        Status::Pending,
        Status::Confirming,
        Status::Sweeping,
        Status::Completed,
        Status::Expired,
        Status::Failed,
    ];

    /// True for `completed`, `expired` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Expired | Status::Failed)
    }

    /// The lowercase wire name, or the raw string for `Unrecognized`.
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Confirming => "confirming",
            Status::Sweeping => "sweeping",
            Status::Completed => "completed",
            Status::Expired => "expired",
            Status::Failed => "failed",
            Status::Unrecognized(raw) => raw,
        }
    }
}

/// Shared terminal predicate used by both transports and the synchronizer.
pub fn is_terminal(status: &Status) -> bool {
    status.is_terminal()
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => Status::Pending,
            "confirming" => Status::Confirming,
            "sweeping" => Status::Sweeping,
            "completed" => Status::Completed,
            "expired" => Status::Expired,
            "failed" => Status::Failed,
            _ => Status::Unrecognized(raw),
        }
    }
}

impl From<&str> for Status {
    fn from(raw: &str) -> Self {
        Status::from(raw.to_string())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a poll response or a pushed `status` event.
///
/// Only `status` is read; the poll endpoint returns the full invoice record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusPayload {
    pub status: Status,
}

impl StatusPayload {
    /// Parses a JSON body, ignoring every field but `status`.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
