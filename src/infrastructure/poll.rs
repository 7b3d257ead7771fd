use crate::domain::ports::{Clock, ClockBox, StatusSource, StatusSourceBox, Transport};
use crate::domain::status::{Status, is_terminal};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Delays between status requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Wait before the very first request.
    pub initial_delay: Duration,
    /// Wait after a request that returned a status.
    pub success_delay: Duration,
    /// Wait after a failed request.
    pub failure_delay: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(10),
            success_delay: Duration::from_secs(10),
            failure_delay: Duration::from_secs(15),
        }
    }
}

/// Client-initiated transport: one request per tick until a terminal status.
///
/// Failures are swallowed. They never reach the callback and only stretch
/// the next delay to `failure_delay`.
pub struct PollTransport<S = StatusSourceBox, C = ClockBox> {
    source: S,
    clock: C,
    schedule: PollSchedule,
}

impl<S: StatusSource, C: Clock> PollTransport<S, C> {
    /// Creates a new poll transport.
    pub fn new(source: S, clock: C, schedule: PollSchedule) -> Self {
        Self {
            source,
            clock,
            schedule,
        }
    }
}

#[async_trait]
impl<S: StatusSource, C: Clock> Transport for PollTransport<S, C> {
    async fn on_update(&mut self, callback: &mut (dyn FnMut(Status) + Send)) -> Result<Status> {
        let mut delay = self.schedule.initial_delay;
        loop {
            self.clock.sleep(delay).await;

            match self.source.fetch().await {
                Ok(status) => {
                    callback(status.clone());
                    if is_terminal(&status) {
                        tracing::debug!(%status, "Terminal status observed, polling stopped");
                        return Ok(status);
                    }
                    delay = self.schedule.success_delay;
                }
                Err(e) => {
                    tracing::warn!(
                        retry_in = ?self.schedule.failure_delay,
                        "Status request failed: {e}"
                    );
                    delay = self.schedule.failure_delay;
                }
            }
        }
    }
}
