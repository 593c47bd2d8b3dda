//! # Child contract and run shapes.
//!
//! A child is a [`Shutter`] that also knows how to run. How it runs is
//! described by [`Runnable`], a closed set of four shapes:
//!
//! | Shape                          | Receives bootstrap token | Reports an error |
//! |--------------------------------|--------------------------|------------------|
//! | [`Runnable::Run`]              | no                       | no               |
//! | [`Runnable::RunError`]         | no                       | yes              |
//! | [`Runnable::RunContext`]       | yes                      | no               |
//! | [`Runnable::RunContextError`]  | yes                      | yes              |
//!
//! The bootstrap token is the application's derived scope. It is cancelled as
//! soon as the application starts terminating and must only guard start-up
//! work; long-running work stops through the child's own [`Terminator`](crate::Terminator).

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::terminator::Shutter;

type ContextFn<T> = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, T> + Send>;

/// How a child runs once started.
pub enum Runnable {
    /// Fire-and-forget work without an error result.
    Run(BoxFuture<'static, ()>),
    /// Work whose error is fed into the child's shutdown.
    RunError(BoxFuture<'static, Result<(), TaskError>>),
    /// Bootstrap-scope-aware work without an error result.
    RunContext(ContextFn<()>),
    /// Bootstrap-scope-aware work whose error is fed into the child's shutdown.
    RunContextError(ContextFn<Result<(), TaskError>>),
}

impl Runnable {
    /// Wraps a future as [`Runnable::Run`].
    pub fn run<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        Runnable::Run(fut.boxed())
    }

    /// Wraps a fallible future as [`Runnable::RunError`].
    pub fn run_error<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Runnable::RunError(fut.boxed())
    }

    /// Wraps a token-taking closure as [`Runnable::RunContext`].
    pub fn run_context<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Runnable::RunContext(Box::new(move |ctx| f(ctx).boxed()))
    }

    /// Wraps a fallible token-taking closure as [`Runnable::RunContextError`].
    pub fn run_context_error<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Runnable::RunContextError(Box::new(move |ctx| f(ctx).boxed()))
    }

    /// Short stable name of the shape, for events.
    pub fn shape(&self) -> &'static str {
        match self {
            Runnable::Run(_) => "run",
            Runnable::RunError(_) => "run_error",
            Runnable::RunContext(_) => "run_context",
            Runnable::RunContextError(_) => "run_context_error",
        }
    }

    /// Normalizes every shape into one fallible future.
    ///
    /// `ctx` is only handed to the context-aware shapes.
    pub(crate) fn into_future(self, ctx: CancellationToken) -> BoxFuture<'static, Result<(), TaskError>> {
        match self {
            Runnable::Run(fut) => fut.map(Ok).boxed(),
            Runnable::RunError(fut) => fut,
            Runnable::RunContext(f) => f(ctx).map(Ok).boxed(),
            Runnable::RunContextError(f) => f(ctx),
        }
    }
}

impl std::fmt::Debug for Runnable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Runnable").field(&self.shape()).finish()
    }
}

/// A supervised component that can be started by
/// [`Application::supervise_and_start`](crate::Application::supervise_and_start).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use termvisor::{Child, Runnable, Shutter, TaskError, Terminator};
///
/// struct Server {
///     terminator: Terminator,
/// }
///
/// impl Shutter for Server {
///     fn terminator(&self) -> &Terminator { &self.terminator }
///     fn name(&self) -> &str { "server" }
/// }
///
/// impl Child for Server {
///     fn runnable(self: Arc<Self>) -> Option<Runnable> {
///         Some(Runnable::run_error(async move {
///             // bind, serve until self.terminator is terminating...
///             self.terminator.terminating().await;
///             Ok::<(), TaskError>(())
///         }))
///     }
/// }
/// ```
pub trait Child: Shutter {
    /// Returns the child's run shape.
    ///
    /// `None` means the child cannot be started; starting it is a fatal
    /// programming error.
    fn runnable(self: Arc<Self>) -> Option<Runnable> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shapes_normalize_to_results() {
        let ctx = CancellationToken::new();
        ctx.cancel();

        assert_eq!(Runnable::run(async {}).into_future(ctx.clone()).await, Ok(()));
        assert_eq!(
            Runnable::run_error(async { Err(TaskError::fail("x")) })
                .into_future(ctx.clone())
                .await,
            Err(TaskError::fail("x"))
        );

        let seen = Runnable::run_context_error(|ctx: CancellationToken| async move {
            if ctx.is_cancelled() {
                Err(TaskError::fail("bootstrap aborted"))
            } else {
                Ok(())
            }
        });
        assert_eq!(seen.shape(), "run_context_error");
        assert_eq!(
            seen.into_future(ctx).await,
            Err(TaskError::fail("bootstrap aborted"))
        );
    }
}
