//! # Lifecycle events emitted by the application and its collaborators.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Signal events**: OS termination requests as seen by the signal watcher
//! - **Application events**: the wait loop and graceful shutdown outcome
//! - **Child events**: supervision and run outcome of each child
//! - **Subscriber events**: delivery problems inside the subscriber set
//!
//! The [`Event`] struct carries additional metadata such as timestamps, child
//! name, signal, delays and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use termvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ChildFailed)
//!     .with_child("db-pool")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::ChildFailed);
//! assert_eq!(ev.child.as_deref(), Some("db-pool"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Signal;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Signal events ===
    /// A termination signal was received by the watcher.
    ///
    /// Sets: `signal`, `count` (signals seen so far).
    SignalReceived,

    /// First signal of the episode; notification deferred by the unready period.
    ///
    /// Sets: `signal`, `delay_ms`.
    UnreadyPeriodStarted,

    /// The unready period elapsed and the notification was forwarded.
    ///
    /// Sets: `signal`, `delay_ms`.
    UnreadyPeriodElapsed,

    /// Termination notification forwarded to the wait loop (graceful shutdown starts).
    ///
    /// Sets: `signal`.
    ShutdownRequested,

    /// Too many signals received; the process is being force-killed.
    ///
    /// Sets: `signal`, `count`, `code`.
    ForcedExit,

    // === Application events ===
    /// The root terminator began terminating on its own (not from a signal).
    ///
    /// Sets: `reason` (terminal error, if any), `signaled`.
    ApplicationTerminating,

    /// The wait loop is now waiting for the root terminator to complete.
    ///
    /// Sets: `grace_ms`.
    WaitingForTermination,

    /// The root terminator completed within the graceful shutdown delay.
    AllStoppedWithin,

    /// Graceful shutdown delay exceeded; waiting abandoned.
    ///
    /// Sets: `grace_ms`, `reason` (children that had not terminated).
    GraceExceeded,

    // === Child events ===
    /// A child was attached to the application's root terminator.
    ///
    /// Sets: `child`.
    ChildSupervised,

    /// A child's run was started on its own task.
    ///
    /// Sets: `child`, `reason` (run shape).
    ChildStarted,

    /// A child's run returned without error.
    ///
    /// Sets: `child`.
    ChildStopped,

    /// A child's run returned an error or panicked.
    ///
    /// Sets: `child`, `reason`.
    ChildFailed,

    /// A supervised child's terminator reached `Terminated`.
    ///
    /// Sets: `child`, `reason` (recorded error, if any).
    ChildTerminated,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `child` (subscriber name), `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `child` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the child (or subscriber), if applicable.
    pub child: Option<Arc<str>>,
    /// Signal that caused the event.
    pub signal: Option<Signal>,
    /// Number of signals seen by the watcher.
    pub count: Option<u32>,
    /// Unready period delay in milliseconds.
    pub delay_ms: Option<u64>,
    /// Graceful shutdown delay in milliseconds.
    pub grace_ms: Option<u64>,
    /// Process exit status.
    pub code: Option<i32>,
    /// Whether the watcher had been signaled when the event was produced.
    pub signaled: Option<bool>,
    /// Human-readable reason (errors, stuck children, run shape, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            child: None,
            signal: None,
            count: None,
            delay_ms: None,
            grace_ms: None,
            code: None,
            signaled: None,
            reason: None,
        }
    }

    /// Attaches a child name.
    #[inline]
    pub fn with_child(mut self, child: impl Into<Arc<str>>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// Attaches the signal.
    #[inline]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches the signal count.
    #[inline]
    pub fn with_count(mut self, n: u32) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches an unready period delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches a graceful shutdown delay (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        self.grace_ms = Some(millis(d));
        self
    }

    /// Attaches an exit status.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches the watcher's signaled flag.
    #[inline]
    pub fn with_signaled(mut self, signaled: bool) -> Self {
        self.signaled = Some(signaled);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_child(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_child(subscriber)
            .with_reason(info)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::SignalReceived);
        let b = Event::new(EventKind::SignalReceived);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_fill_metadata() {
        let ev = Event::new(EventKind::GraceExceeded)
            .with_grace(Duration::from_millis(1500))
            .with_reason("stuck=[\"db\"]");
        assert_eq!(ev.grace_ms, Some(1500));
        assert!(ev.child.is_none());

        let ev = Event::new(EventKind::ForcedExit)
            .with_signal(Signal::Interrupt)
            .with_count(4)
            .with_code(1);
        assert_eq!(ev.signal, Some(Signal::Interrupt));
        assert_eq!(ev.count, Some(4));
        assert_eq!(ev.code, Some(1));
    }
}
