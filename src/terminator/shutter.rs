//! # Shutter: the termination surface of a component.
//!
//! Anything the [`Application`](crate::Application) supervises implements
//! [`Shutter`]: it owns a [`Terminator`] and forwards the usual operations to it.
//!
//! ## Example
//! ```
//! use termvisor::{Shutter, Terminator};
//!
//! struct Cache {
//!     terminator: Terminator,
//! }
//!
//! impl Shutter for Cache {
//!     fn terminator(&self) -> &Terminator { &self.terminator }
//!     fn name(&self) -> &str { "cache" }
//! }
//!
//! let cache = Cache { terminator: Terminator::new() };
//! cache.on_terminating(|_| println!("flushing cache"));
//! cache.shutdown(None);
//! assert!(cache.terminator().is_terminated());
//! ```

use crate::error::TaskError;
use crate::terminator::Terminator;

/// A component that can be told to stop and reports when it has stopped.
pub trait Shutter: Send + Sync + 'static {
    /// The component's terminator.
    fn terminator(&self) -> &Terminator;

    /// Returns a stable, human-readable name used in events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// See [`Terminator::on_terminating`].
    fn on_terminating<F>(&self, f: F)
    where
        F: FnOnce(Option<&TaskError>) + Send + 'static,
        Self: Sized,
    {
        self.terminator().on_terminating(f)
    }

    /// See [`Terminator::on_terminated`].
    fn on_terminated<F>(&self, f: F)
    where
        F: FnOnce(Option<&TaskError>) + Send + 'static,
        Self: Sized,
    {
        self.terminator().on_terminated(f)
    }

    /// See [`Terminator::shutdown`].
    fn shutdown(&self, err: Option<TaskError>) {
        self.terminator().shutdown(err)
    }

    /// See [`Terminator::err`].
    fn err(&self) -> Option<TaskError> {
        self.terminator().err()
    }
}

impl Shutter for Terminator {
    fn terminator(&self) -> &Terminator {
        self
    }

    fn name(&self) -> &str {
        "terminator"
    }
}
