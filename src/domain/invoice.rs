use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque invoice identifier issued by the payment server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(String);

impl InvoiceId {
    /// Creates a new `InvoiceId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as issued.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The invoice a page is watching. Fixed for the lifetime of the watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceIdentity {
    pub id: InvoiceId,
    pub expires_at: Option<DateTime<Utc>>,
}

impl InvoiceIdentity {
    /// Creates a new `InvoiceIdentity`.
    pub fn new(id: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: InvoiceId::new(id),
            expires_at,
        }
    }
}
