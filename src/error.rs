//! Error types used by the termvisor runtime and supervised children.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`]: terminal errors recorded by a [`Terminator`](crate::Terminator)
//!   (a child failing its run, a panic, an explicit fatal shutdown).
//! - [`RuntimeError`]: errors surfaced once, at the application boundary, by
//!   [`Application::wait_for_termination`](crate::Application::wait_for_termination).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt::Display;

use thiserror::Error;

/// # Terminal errors recorded by a terminator.
///
/// A terminator keeps the first error it receives; this type is `Clone` so the
/// recorded value can be handed to every callback and propagated to the
/// application's root terminator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The child's run reported a failure.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error raised explicitly by a component.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The child's run panicked.
    #[error("child panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text.
        error: String,
    },
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use termvisor::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Builds a [`TaskError::Fatal`] from anything printable.
    pub fn fatal(error: impl Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use termvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Panicked { error } => format!("panic: {error}"),
        }
    }
}

/// # Errors produced by the application runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The application terminated with a recorded error (usually a failed child).
    #[error("application terminated: {0}")]
    Terminated(#[from] TaskError),

    /// Installing the OS signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    SignalSetup(#[source] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use termvisor::{RuntimeError, TaskError};
    ///
    /// let err = RuntimeError::Terminated(TaskError::fail("boom"));
    /// assert_eq!(err.as_label(), "runtime_terminated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Terminated(_) => "runtime_terminated",
            RuntimeError::SignalSetup(_) => "runtime_signal_setup",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Terminated(e) => format!("terminated with {}", e.as_message()),
            RuntimeError::SignalSetup(e) => format!("signal setup failed: {e}"),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Returns the recorded terminal error, if this is [`RuntimeError::Terminated`].
    pub fn task_error(&self) -> Option<&TaskError> {
        match self {
            RuntimeError::Terminated(e) => Some(e),
            RuntimeError::SignalSetup(_) => None,
        }
    }
}
