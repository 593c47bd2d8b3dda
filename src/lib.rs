//! # termvisor
//!
//! **Termvisor** coordinates the orderly shutdown of a process made of
//! concurrently running components.
//!
//! It provides a one-shot stop primitive ([`Terminator`]), an [`Application`]
//! that couples children to a root terminator, a termination signal watcher
//! with an unready period and forced-exit escalation, and a registry of exit
//! hooks that every deliberate process exit goes through.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Child     │   │    Child     │   │   Shutter    │
//!     │ (Runnable #1)│   │ (Runnable #2)│   │ (not started)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Application (root of the supervision tree)                       │
//! │  - root Terminator + bootstrap CancellationToken                  │
//! │  - Registry (supervised children, shutdown fan-out)               │
//! │  - Bus (broadcast events) + SubscriberSet                         │
//! │  - ExitHandlers (exit funnel)                                     │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  run task    │   │  run task    │   │SignalWatcher │   │
//!     │ (one per     │   │ (one per     │   │ (+ unready   │   │
//!     │  child)      │   │  child)      │   │   timer)     │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ ChildStarted     │ ChildFailed      │ SignalReceived  │
//!      │ ChildStopped     │ ChildTerminated  │ ForcedExit      │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter   worker2    workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! signal ──► SignalWatcher ──► wait_for_termination ──► root.shutdown(None)
//! child error ──► child.shutdown(Some(e)) ──► root.shutdown(Some(e))
//!
//! root.shutdown(err)
//!   ├─► cancel bootstrap token
//!   ├─► shut down every supervised child (concurrently, err = None)
//!   └─► Terminated
//!
//! wait_for_termination
//!   ├─ Terminated within grace ──► AllStoppedWithin
//!   ├─ grace elapsed           ──► GraceExceeded (stuck children listed)
//!   └─ returns the first recorded error ──► Application::exit ──► ExitHandlers::exit(0|1)
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------------|---------------------------------------------|
//! | **Termination**   | One-shot stop primitive with callbacks and first-error-wins.        | [`Terminator`], [`Shutter`]                 |
//! | **Supervision**   | Couple children to the root and start their work.                   | [`Application`], [`Child`], [`Runnable`]    |
//! | **Signals**       | Unready period, debouncing and forced exit on repeated signals.     | [`SignalWatcher`], [`Readiness`]            |
//! | **Exit hooks**    | Named cleanup hooks run once before the process ends.               | [`ExitHandlers`]                            |
//! | **Subscriber API**| Hook into lifecycle events (logging, custom subscribers).           | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed errors for children and the runtime.                          | [`TaskError`], [`RuntimeError`]             |
//! | **Configuration** | Centralize runtime settings.                                        | [`Config`]                                  |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use termvisor::{Application, ChildFn, Config, LogWriter, Runnable, Subscribe, TaskError, Terminator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut cfg = Config::default();
//!     cfg.unready_period = Duration::from_secs(5);
//!     cfg.grace = Duration::from_secs(30);
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let app = Application::builder(cfg).with_subscribers(subs).build();
//!
//!     app.supervise_and_start(ChildFn::arc("worker", |term: Terminator| {
//!         Runnable::run_error(async move {
//!             term.terminating().await;
//!             Ok::<(), TaskError>(())
//!         })
//!     }));
//!
//!     let res = app.wait().await;
//!     app.exit(&res);
//! }
//! ```
mod children;
mod core;
mod error;
mod events;
mod exit;
mod subscribers;
mod terminator;

// ---- Public re-exports ----

pub use children::{Child, ChildFn, Runnable};
pub use self::core::{
    Application, ApplicationBuilder, Config, FORCED_EXIT_CODE, OsSignals, Readiness, Signal,
    SignalSource, SignalWatch, SignalWatcher, setup_signal_handler,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use exit::{ExitHandlers, ExitHook, QUIT_CODE};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use terminator::{Callback, Phase, Shutter, Terminator};
