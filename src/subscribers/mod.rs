//! # Event subscribers for the termvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the built-in [`LogWriter`]
//! for handling lifecycle events broadcast through the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   SignalWatcher / runner / Application ── publish(Event) ──► Bus
//!                                                               │
//!                                            application listener
//!                                                               ▼
//!                                                        SubscriberSet
//!                                                    ┌────────┼─────────┐
//!                                                    ▼        ▼         ▼
//!                                               LogWriter  Custom   Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use termvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::GraceExceeded) {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//! }
//! ```

mod log;
mod subscriber;
mod subscriber_set;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_info;
