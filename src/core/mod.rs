//! Runtime core: supervision and lifecycle.
//!
//! The public entry point is [`Application`], which owns the root terminator,
//! supervises children and waits for termination.
//!
//! Internal modules:
//! - [`application`]: supervision bindings and the termination wait;
//! - [`builder`]: assembles bus, subscribers and exit funnel;
//! - [`registry`]: supervised children and the shutdown fan-out;
//! - [`runner`]: runs one child on its own task and routes its outcome;
//! - [`signals`]: signal watcher with unready period and forced exit;
//! - [`config`]: runtime settings.

mod application;
mod builder;
mod config;
mod registry;
mod runner;
mod signals;

pub use application::Application;
pub use builder::ApplicationBuilder;
pub use config::Config;
pub use signals::{
    FORCED_EXIT_CODE, OsSignals, Readiness, Signal, SignalSource, SignalWatch, SignalWatcher,
    setup_signal_handler,
};
