use super::view::{Countdown, StatusView};
use crate::domain::ports::PresentationSink;
use crate::domain::status::Status;
use chrono::{DateTime, Utc};
use std::io::Write;

/// Writes one line per rendered status, e.g. `[14:32] Transaction detected, confirming…`.
///
/// The countdown prefix appears only when the invoice expiry is known.
/// Statuses without a view are skipped.
pub struct TerminalSink<W: Write + Send> {
    out: W,
    expires_at: Option<DateTime<Utc>>,
    now: fn() -> DateTime<Utc>,
}

impl<W: Write + Send> TerminalSink<W> {
    /// Creates a new sink writing to `out`, with a countdown when `expires_at` is known.
    pub fn new(out: W, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            out,
            expires_at,
            now: Utc::now,
        }
    }

    /// Replaces the wall clock used for the countdown.
    pub fn with_now(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&self, view: StatusView) -> String {
        match self.expires_at {
            Some(expires_at) => {
                let countdown = Countdown::until(expires_at, (self.now)());
                format!("[{}] {}", countdown.label(), view.text)
            }
            None => view.text.to_string(),
        }
    }
}

impl<W: Write + Send> PresentationSink for TerminalSink<W> {
    fn render(&mut self, status: &Status) {
        let Some(view) = StatusView::for_status(status) else {
            tracing::debug!(%status, "No view for status");
            return;
        };
        tracing::debug!(indicator = view.indicator, "Rendering status");
        let line = self.line(view);
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write status line: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn output(sink: TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_lines_without_expiry() {
        let mut sink = TerminalSink::new(Vec::new(), None);
        sink.render(&Status::Confirming);
        sink.render(&Status::Completed);
        assert_eq!(
            output(sink),
            "Transaction detected, confirming…\nPayment complete!\n"
        );
    }

    #[test]
    fn test_countdown_prefix() {
        let expires_at = fixed_now() + chrono::Duration::seconds(14 * 60 + 32);
        let mut sink = TerminalSink::new(Vec::new(), Some(expires_at)).with_now(fixed_now);
        sink.render(&Status::Sweeping);
        assert_eq!(output(sink), "[14:32] Forwarding to main wallet…\n");
    }

    #[test]
    fn test_unrecognized_renders_nothing() {
        let mut sink = TerminalSink::new(Vec::new(), None);
        sink.render(&Status::Unrecognized("underpaid".into()));
        assert!(output(sink).is_empty());
    }
}
