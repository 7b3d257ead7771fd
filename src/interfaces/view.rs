use crate::domain::status::Status;
use chrono::{DateTime, Utc};

/// Seconds under which the countdown is flagged urgent.
pub const URGENT_THRESHOLD_SECS: i64 = 120;

/// What the payment page shows for a status: an indicator name and a line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    pub indicator: &'static str,
    pub text: &'static str,
}

impl StatusView {
    /// `None` for statuses the page does not know how to show.
    pub fn for_status(status: &Status) -> Option<Self> {
        let (indicator, text) = match status {
            Status::Pending => ("pending", "Waiting for payment…"),
            Status::Confirming => ("confirming", "Transaction detected, confirming…"),
            Status::Sweeping => ("sweeping", "Forwarding to main wallet…"),
            Status::Completed => ("completed", "Payment complete!"),
            Status::Expired => ("expired", "Invoice expired"),
            Status::Failed => ("failed", "Payment failed"),
            Status::Unrecognized(_) => return None,
        };
        Some(Self { indicator, text })
    }
}

/// Time left until the invoice expires, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub remaining_secs: i64,
    pub urgent: bool,
}

impl Countdown {
    /// Time left from `now` to `expires_at`, never negative.
    pub fn until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining_secs = (expires_at - now).num_seconds().max(0);
        Self {
            remaining_secs,
            urgent: remaining_secs < URGENT_THRESHOLD_SECS,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// `MM:SS`, or `EXPIRED` once nothing is left. Minutes are not wrapped into hours.
    pub fn label(&self) -> String {
        if self.is_expired() {
            return "EXPIRED".to_string();
        }
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }
}
