//! # Termination signal watcher with debouncing and escalation.
//!
//! [`SignalWatcher`] consumes termination signals one at a time from a
//! [`SignalSource`] and forwards **one** logical "please terminate"
//! notification to its [`SignalWatch`].
//!
//! ## Per-signal state machine
//! ```text
//! signal ──► seen += 1
//!              ├─ seen > force_exit_after ──► ForcedExit ──► ExitHandlers::exit(1)
//!              ├─ first signal (readiness.signaled: false → true)
//!              │     ├─ unready == 0 ──► mark delay elapsed, forward now
//!              │     └─ unready  > 0 ──► spawn timer: sleep(unready) → mark elapsed, forward
//!              └─ later signal ──────────► forward now (skips the remaining delay)
//! ```
//!
//! ## Rules
//! - The receive loop never waits on the unready timer; a second signal during
//!   the delay is observed promptly.
//! - At most one notification is delivered per watcher; the channel has capacity 1.
//! - [`Readiness`] flips to "signaled" on the first signal, before the
//!   notification, so health probes can report the process unready while it
//!   drains.
//!
//! ## Sources
//! **Unix platforms:** `SIGINT` (Ctrl-C in terminal) and `SIGTERM` (default
//! kill signal, used by systemd/Kubernetes).
//!
//! **Other platforms:** `Ctrl-C` via [`tokio::signal::ctrl_c`].
//!
//! Any `mpsc::UnboundedReceiver<Signal>` is also a source, which lets tests
//! and embedders inject signals.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::exit::ExitHandlers;

/// Status used when repeated signals force the process down.
pub const FORCED_EXIT_CODE: i32 = 1;

/// A termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` / Ctrl-C.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
}

impl Signal {
    /// Conventional signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream of termination signals.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Waits for the next signal; `None` when the source is exhausted.
    async fn recv(&mut self) -> Option<Signal>;
}

#[async_trait]
impl SignalSource for mpsc::UnboundedReceiver<Signal> {
    async fn recv(&mut self) -> Option<Signal> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}

/// OS-backed signal source.
///
/// Registering replaces the default disposition of the signals for the rest
/// of the process lifetime.
#[cfg(unix)]
pub struct OsSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    /// Registers `SIGINT` and `SIGTERM` listeners.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }
}

#[cfg(unix)]
#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            s = self.sigint.recv() => s.map(|_| Signal::Interrupt),
            s = self.sigterm.recv() => s.map(|_| Signal::Terminate),
        }
    }
}

/// OS-backed signal source.
#[cfg(not(unix))]
pub struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    /// Ctrl-C is registered lazily on each `recv`.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<Signal> {
        tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt)
    }
}

/// Readiness flags driven by the signal watcher.
///
/// Cloning is cheap; clones share the flags.
#[derive(Clone, Debug, Default)]
pub struct Readiness {
    signaled: Arc<AtomicBool>,
    delay_elapsed: Arc<AtomicBool>,
}

impl Readiness {
    /// Fresh, ready flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the first termination signal arrived.
    pub fn has_been_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    /// True once the unready period fully elapsed (immediately when it is zero).
    pub fn waited_full_delay(&self) -> bool {
        self.delay_elapsed.load(Ordering::SeqCst)
    }

    /// What a readiness probe should report.
    pub fn is_ready(&self) -> bool {
        !self.has_been_signaled()
    }

    /// Returns true for the caller that flipped the flag.
    fn mark_signaled(&self) -> bool {
        !self.signaled.swap(true, Ordering::SeqCst)
    }

    fn mark_delay_elapsed(&self) {
        self.delay_elapsed.store(true, Ordering::SeqCst);
    }
}

/// Sending half shared by the receive loop and the unready timer.
#[derive(Clone)]
struct Notifier {
    tx: mpsc::Sender<Signal>,
    sent: Arc<AtomicBool>,
}

impl Notifier {
    fn forward(&self, signal: Signal) -> bool {
        if self.sent.swap(true, Ordering::SeqCst) {
            return false;
        }
        // Capacity 1 and a single send: never full.
        let _ = self.tx.try_send(signal);
        true
    }
}

/// Receiving side of a running watcher.
pub struct SignalWatch {
    rx: mpsc::Receiver<Signal>,
    readiness: Readiness,
    join: JoinHandle<()>,
}

impl SignalWatch {
    /// Waits for the forwarded notification.
    ///
    /// Returns `None` once the watcher (and its timer) are gone without notifying.
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    /// Readiness flags maintained by the watcher.
    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// See [`Readiness::has_been_signaled`].
    pub fn has_been_signaled(&self) -> bool {
        self.readiness.has_been_signaled()
    }

    /// See [`Readiness::waited_full_delay`].
    pub fn waited_full_delay(&self) -> bool {
        self.readiness.waited_full_delay()
    }

    /// Stops the receive loop.
    ///
    /// Dropping the watch does not; the loop keeps escalating repeated signals
    /// while the process tears down.
    pub fn abort(&self) {
        self.join.abort();
    }
}

/// Configures and spawns the signal receive loop.
pub struct SignalWatcher {
    unready: Duration,
    force_exit_after: u32,
    readiness: Readiness,
    bus: Bus,
    exit: ExitHandlers,
}

impl SignalWatcher {
    /// Creates a watcher deferring the first notification by `unready`.
    pub fn new(unready: Duration, bus: Bus, exit: ExitHandlers) -> Self {
        Self {
            unready,
            force_exit_after: 3,
            readiness: Readiness::new(),
            bus,
            exit,
        }
    }

    /// Uses shared readiness flags instead of fresh ones.
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Number of signals tolerated before forcing an exit.
    pub fn with_force_exit_after(mut self, n: u32) -> Self {
        self.force_exit_after = n;
        self
    }

    /// Spawns the receive loop over `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: SignalSource>(self, source: S) -> SignalWatch {
        let (tx, rx) = mpsc::channel(1);
        let notifier = Notifier {
            tx,
            sent: Arc::new(AtomicBool::new(false)),
        };
        let readiness = self.readiness.clone();
        let join = tokio::spawn(self.receive_loop(source, notifier));

        SignalWatch {
            rx,
            readiness,
            join,
        }
    }

    async fn receive_loop<S: SignalSource>(self, mut source: S, notifier: Notifier) {
        let mut seen: u32 = 0;

        while let Some(signal) = source.recv().await {
            seen = seen.saturating_add(1);
            self.bus.publish(
                Event::new(EventKind::SignalReceived)
                    .with_signal(signal)
                    .with_count(seen),
            );

            if seen > self.force_exit_after {
                self.force_exit(signal, seen);
                return;
            }

            if !self.readiness.mark_signaled() {
                notifier.forward(signal);
                continue;
            }

            if self.unready.is_zero() {
                self.readiness.mark_delay_elapsed();
                notifier.forward(signal);
                continue;
            }

            self.bus.publish(
                Event::new(EventKind::UnreadyPeriodStarted)
                    .with_signal(signal)
                    .with_delay(self.unready),
            );
            tokio::spawn(unready_timer(
                self.unready,
                signal,
                self.readiness.clone(),
                notifier.clone(),
                self.bus.clone(),
            ));
        }
    }

    fn force_exit(&self, signal: Signal, seen: u32) {
        self.bus.publish(
            Event::new(EventKind::ForcedExit)
                .with_signal(signal)
                .with_count(seen)
                .with_code(FORCED_EXIT_CODE),
        );
        // The bus is asynchronous and the process is about to end.
        tracing::error!(%signal, count = seen, "received termination signal {seen} times, forcing kill");
        self.exit.exit(FORCED_EXIT_CODE);
    }
}

async fn unready_timer(
    delay: Duration,
    signal: Signal,
    readiness: Readiness,
    notifier: Notifier,
    bus: Bus,
) {
    tokio::time::sleep(delay).await;
    readiness.mark_delay_elapsed();
    if notifier.forward(signal) {
        bus.publish(
            Event::new(EventKind::UnreadyPeriodElapsed)
                .with_signal(signal)
                .with_delay(delay),
        );
    }
}

/// Watches the process's `SIGINT`/`SIGTERM` with the default escalation threshold.
///
/// Must be called from within a tokio runtime.
pub fn setup_signal_handler(
    unready_period_delay: Duration,
    bus: Bus,
    exit: ExitHandlers,
) -> std::io::Result<SignalWatch> {
    let source = OsSignals::new()?;
    Ok(SignalWatcher::new(unready_period_delay, bus, exit).spawn(source))
}
