//! # LogWriter: renders lifecycle events through `tracing`.
//!
//! The subscriber is the structured logger of an application: install it with
//! [`ApplicationBuilder::with_subscribers`](crate::ApplicationBuilder::with_subscribers)
//! and configure output with any `tracing` subscriber.
//!
//! ## Example output
//! ```text
//! INFO  signal received signal=SIGINT count=1
//! INFO  waiting for unready period before notifying signal=SIGINT delay_ms=5000
//! INFO  shutdown requested signal=SIGINT
//! INFO  waiting for run termination grace_ms=30000
//! WARN  application did not terminate within graceful period, forcing termination grace_ms=30000 stuck=["db"]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let child = e.child.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        let signal = e.signal.map(|s| s.as_str()).unwrap_or("");

        match e.kind {
            EventKind::SignalReceived => {
                tracing::info!(signal, count = e.count, "signal received");
            }
            EventKind::UnreadyPeriodStarted => {
                tracing::info!(
                    signal,
                    delay_ms = e.delay_ms,
                    "waiting for unready period before notifying (send the signal 3 more times to force kill)"
                );
            }
            EventKind::UnreadyPeriodElapsed => {
                tracing::info!(signal, delay_ms = e.delay_ms, "unready period elapsed");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(signal, "shutdown requested");
            }
            EventKind::ForcedExit => {
                tracing::error!(signal, count = e.count, code = e.code, "forcing kill");
            }
            EventKind::ApplicationTerminating => {
                tracing::info!(
                    from_signal = e.signaled,
                    with_error = !reason.is_empty(),
                    error = reason,
                    "run terminating"
                );
            }
            EventKind::WaitingForTermination => {
                tracing::info!(grace_ms = e.grace_ms, "waiting for run termination");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!("run terminated");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(
                    grace_ms = e.grace_ms,
                    stuck = reason,
                    "application did not terminate within graceful period, forcing termination"
                );
            }
            EventKind::ChildSupervised => {
                tracing::debug!(child, "child supervised");
            }
            EventKind::ChildStarted => {
                tracing::debug!(child, shape = reason, "child started");
            }
            EventKind::ChildStopped => {
                tracing::debug!(child, "child run returned");
            }
            EventKind::ChildFailed => {
                tracing::error!(child, error = reason, "child failed");
            }
            EventKind::ChildTerminated => {
                tracing::info!(child, error = reason, "child terminated");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = child, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = child, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
