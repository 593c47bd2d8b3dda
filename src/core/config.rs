//! # Application configuration.
//!
//! Provides [`Config`] centralized settings for the application runtime.
//!
//! ## Sentinel values
//! - `unready_period = 0s` → the first signal is forwarded immediately
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for an [`Application`](crate::Application).
///
/// ## Field semantics
/// - `unready_period`: delay between the first termination signal and the start of shutdown
/// - `grace`: maximum wait for the root terminator to complete once shutdown began
/// - `force_exit_after`: signals tolerated before the process is force-killed
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Time the process stays up, reporting itself unready, after the first signal.
    ///
    /// Gives load balancers and orchestrators time to stop routing new work
    /// before shutdown starts. A second signal skips the remaining delay.
    pub unready_period: Duration,

    /// Maximum time to wait for graceful shutdown.
    ///
    /// When it elapses the wait is abandoned (a warning event is published) and
    /// the recorded terminal error, if any, is returned.
    pub grace: Duration,

    /// Number of signals tolerated; one more forces an immediate exit with status 1.
    pub force_exit_after: u32,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// True when the first signal is deferred.
    #[inline]
    pub fn has_unready_period(&self) -> bool {
        self.unready_period > Duration::ZERO
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `unready_period = 0s`
    /// - `grace = 60s`
    /// - `force_exit_after = 3`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            unready_period: Duration::ZERO,
            grace: Duration::from_secs(60),
            force_exit_after: 3,
            bus_capacity: 1024,
        }
    }
}
