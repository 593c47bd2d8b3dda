//! # Start a child on its own task.
//!
//! Turns a [`Runnable`] into a tokio task and routes the outcome back into the
//! child's terminator.
//!
//! ## Outcome handling
//! ```text
//! Ok(())            ──► publish ChildStopped (the child keeps its terminator state)
//! Err(e)            ──► publish ChildFailed ──► terminator.shutdown(Some(e)) (blocking pool)
//! panic             ──► Err(TaskError::Panicked) ──► same as Err(e)
//! ```
//!
//! With the supervision binding in place, the child's shutdown makes its error
//! the application's terminal error.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::children::Runnable;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_info;
use crate::terminator::Terminator;

/// Spawns `runnable`; context-aware shapes receive `ctx`.
pub(crate) fn start(
    name: Arc<str>,
    terminator: Terminator,
    runnable: Runnable,
    ctx: CancellationToken,
    bus: Bus,
) -> JoinHandle<()> {
    bus.publish(
        Event::new(EventKind::ChildStarted)
            .with_child(Arc::clone(&name))
            .with_reason(runnable.shape()),
    );

    let fut = runnable.into_future(ctx);
    tokio::spawn(async move {
        let res = match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => Err(TaskError::Panicked {
                error: panic_info(&*payload),
            }),
        };

        match res {
            Ok(()) => bus.publish(Event::new(EventKind::ChildStopped).with_child(name)),
            Err(err) => {
                bus.publish(
                    Event::new(EventKind::ChildFailed)
                        .with_child(name)
                        .with_reason(err.to_string()),
                );
                let _ = terminator.spawn_shutdown(Some(err)).await;
            }
        }
    })
}
