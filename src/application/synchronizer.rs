use crate::domain::ports::{PresentationSink, Transport};
use crate::domain::status::{Status, is_terminal};
use crate::error::Result;

/// Result of feeding one observation to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The value differed from the current one and was sent to the sink.
    Rendered,
    /// Same as the current value. Nothing happened.
    Duplicate,
}

/// The single authority over the displayed payment status.
///
/// Owns the current status (starting at `pending`) and the sink. Transports
/// never see the current value; they only hand observations to [`apply`].
///
/// [`apply`]: StatusSynchronizer::apply
pub struct StatusSynchronizer<S: PresentationSink> {
    current: Status,
    sink: S,
}

impl<S: PresentationSink> StatusSynchronizer<S> {
    /// Creates a new synchronizer showing `pending`. Nothing is rendered yet.
    pub fn new(sink: S) -> Self {
        Self {
            current: Status::Pending,
            sink,
        }
    }

    /// Applies an observed status.
    ///
    /// Repeated values are ignored, so the sink never sees the same value twice
    /// in a row. Ordering is not checked: the server is the source of truth, so
    /// even `completed -> pending` is rendered. Stopping at a terminal status is
    /// the transports' job.
    pub fn apply(&mut self, status: Status) -> Applied {
        if status == self.current {
            return Applied::Duplicate;
        }

        if is_terminal(&self.current) {
            tracing::debug!(from = %self.current, to = %status, "Status changed after a final status");
        }
        tracing::info!(from = %self.current, to = %status, "Payment status changed");
        self.current = status;
        self.sink.render(&self.current);
        Applied::Rendered
    }

    /// The last status handed to the sink, or `pending` before any change.
    pub fn current(&self) -> &Status {
        &self.current
    }

    /// Returns a reference to the presentation sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the synchronizer, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Drives `transport` into `synchronizer` until the transport stops on a
/// terminal status. Returns that status.
pub async fn watch<T, S>(transport: &mut T, synchronizer: &mut StatusSynchronizer<S>) -> Result<Status>
where
    T: Transport + ?Sized,
    S: PresentationSink,
{
    let mut callback = |status: Status| {
        synchronizer.apply(status);
    };
    transport.on_update(&mut callback).await
}
