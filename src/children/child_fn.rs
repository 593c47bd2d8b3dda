//! # Function-backed child (`ChildFn`)
//!
//! [`ChildFn`] owns a [`Terminator`] and a closure that builds the child's
//! [`Runnable`] from a clone of that terminator. It saves writing a struct for
//! simple workers.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use termvisor::{ChildFn, Runnable, Terminator, TaskError};
//!
//! let ticker = ChildFn::arc("ticker", |term: Terminator| {
//!     Runnable::run_error(async move {
//!         loop {
//!             tokio::select! {
//!                 _ = term.terminating() => return Ok::<(), TaskError>(()),
//!                 _ = tokio::time::sleep(Duration::from_millis(250)) => {}
//!             }
//!         }
//!     })
//! });
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::children::{Child, Runnable};
use crate::terminator::{Shutter, Terminator};

/// Function-backed child implementation.
pub struct ChildFn<F> {
    name: Cow<'static, str>,
    terminator: Terminator,
    f: F,
}

impl<F> ChildFn<F>
where
    F: Fn(Terminator) -> Runnable + Send + Sync + 'static,
{
    /// Creates a new function-backed child with a fresh terminator.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            terminator: Terminator::new(),
            f,
        }
    }

    /// Creates the child and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Shutter for ChildFn<F>
where
    F: Fn(Terminator) -> Runnable + Send + Sync + 'static,
{
    fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> Child for ChildFn<F>
where
    F: Fn(Terminator) -> Runnable + Send + Sync + 'static,
{
    fn runnable(self: Arc<Self>) -> Option<Runnable> {
        Some((self.f)(self.terminator.clone()))
    }
}
