//! # Fatal assertions routed through the exit funnel.
//!
//! [`ExitHandlers::quit`], [`ExitHandlers::ensure`] and [`ExitHandlers::no_error`]
//! stop the process with status 1 after printing a message, running exit hooks
//! on the way out.

use std::fmt::Display;

use crate::exit::ExitHandlers;

/// Status used by [`ExitHandlers::quit`].
pub const QUIT_CODE: i32 = 1;

impl ExitHandlers {
    /// Prints `message` (when non-empty) to stderr and exits with status 1.
    pub fn quit(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if !message.is_empty() {
            tracing::error!(message, "quitting");
            eprintln!("{message}");
        }
        self.exit(QUIT_CODE);
    }

    /// Quits with `message` unless `condition` holds.
    ///
    /// Returns `condition`, which is only observable when the process exit
    /// returns (custom [`with_process_exit`](ExitHandlers::with_process_exit)).
    pub fn ensure(&self, condition: bool, message: impl AsRef<str>) -> bool {
        if !condition {
            self.quit(message);
        }
        condition
    }

    /// Unwraps `res`, or quits with `"{message}: {err}"`.
    ///
    /// `None` is only observable when the process exit returns.
    pub fn no_error<T, E: Display>(&self, res: Result<T, E>, message: impl AsRef<str>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(err) => {
                self.quit(format!("{}: {err}", message.as_ref()));
                None
            }
        }
    }
}
