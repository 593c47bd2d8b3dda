//! # Terminator: a one-shot "stop and report" primitive.
//!
//! A [`Terminator`] represents something that can be told to stop and that
//! reports when it has stopped. It moves strictly forward through
//! [`Phase::Running`] → [`Phase::Terminating`] → [`Phase::Terminated`].
//!
//! ## Shutdown sequence
//! ```text
//! shutdown(err)
//!   ├─ lock: record err if none recorded yet (first error wins)
//!   ├─ already past Running? ──► return
//!   ├─ phase = Terminating, take on_terminating callbacks
//!   ├─ unlock, fire `terminating` token
//!   ├─ run on_terminating callbacks in registration order
//!   ├─ lock: phase = Terminated, take on_terminated callbacks, read err
//!   ├─ unlock, run on_terminated callbacks in registration order
//!   └─ fire `terminated` token
//! ```
//!
//! ## Rules
//! - Callbacks run **without** the internal lock held, so a callback may call
//!   `shutdown` on this or any other terminator.
//! - Callbacks run on the thread that won the `shutdown` race and may block;
//!   use [`Terminator::spawn_shutdown`] from async code when they do.
//! - Each callback runs exactly once.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Callback fired on a terminator transition with the recorded error.
pub type Callback = Box<dyn FnOnce(Option<&TaskError>) + Send + 'static>;

/// Lifecycle phase of a [`Terminator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Not asked to stop yet.
    Running,
    /// `on_terminating` callbacks are running.
    Terminating,
    /// All callbacks have run.
    Terminated,
}

struct State {
    phase: Phase,
    err: Option<TaskError>,
    on_terminating: Vec<Callback>,
    on_terminated: Vec<Callback>,
}

struct Inner {
    state: Mutex<State>,
    terminating: CancellationToken,
    terminated: CancellationToken,
}

/// Shared handle to a termination state machine.
///
/// Cloning is cheap; clones observe and drive the same state.
///
/// # Example
/// ```
/// use termvisor::{TaskError, Terminator};
///
/// let t = Terminator::new();
/// t.on_terminated(|err| println!("stopped: {err:?}"));
///
/// t.shutdown(Some(TaskError::fail("boom")));
/// t.shutdown(None);
///
/// assert!(t.is_terminated());
/// assert_eq!(t.err(), Some(TaskError::fail("boom")));
/// ```
#[derive(Clone)]
pub struct Terminator {
    inner: Arc<Inner>,
}

impl Terminator {
    /// Creates a terminator in [`Phase::Running`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    phase: Phase::Running,
                    err: None,
                    on_terminating: Vec::new(),
                    on_terminated: Vec::new(),
                }),
                terminating: CancellationToken::new(),
                terminated: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Callbacks never run under the lock, so a poisoned guard still holds consistent state.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a callback fired when termination begins.
    ///
    /// If termination already began, the callback runs immediately with the
    /// recorded error.
    pub fn on_terminating<F>(&self, f: F)
    where
        F: FnOnce(Option<&TaskError>) + Send + 'static,
    {
        let mut state = self.lock();
        if state.phase == Phase::Running {
            state.on_terminating.push(Box::new(f));
            return;
        }
        let err = state.err.clone();
        drop(state);
        f(err.as_ref());
    }

    /// Registers a callback fired once termination completes.
    ///
    /// If the terminator is already terminated, the callback runs immediately
    /// with the recorded error.
    pub fn on_terminated<F>(&self, f: F)
    where
        F: FnOnce(Option<&TaskError>) + Send + 'static,
    {
        let mut state = self.lock();
        if state.phase != Phase::Terminated {
            state.on_terminated.push(Box::new(f));
            return;
        }
        let err = state.err.clone();
        drop(state);
        f(err.as_ref());
    }

    /// Requests termination.
    ///
    /// The first call runs the whole sequence synchronously; later calls only
    /// record `err` when no error was recorded yet.
    pub fn shutdown(&self, err: Option<TaskError>) {
        let (callbacks, recorded) = {
            let mut state = self.lock();
            if state.err.is_none() {
                state.err = err;
            }
            if state.phase != Phase::Running {
                return;
            }
            state.phase = Phase::Terminating;
            (std::mem::take(&mut state.on_terminating), state.err.clone())
        };

        self.inner.terminating.cancel();
        for cb in callbacks {
            cb(recorded.as_ref());
        }

        let (callbacks, recorded) = {
            let mut state = self.lock();
            state.phase = Phase::Terminated;
            (std::mem::take(&mut state.on_terminated), state.err.clone())
        };

        for cb in callbacks {
            cb(recorded.as_ref());
        }
        self.inner.terminated.cancel();
    }

    /// Runs [`shutdown`](Self::shutdown) on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_shutdown(&self, err: Option<TaskError>) -> JoinHandle<()> {
        let me = self.clone();
        tokio::task::spawn_blocking(move || me.shutdown(err))
    }

    /// Returns the recorded error, if any.
    pub fn err(&self) -> Option<TaskError> {
        self.lock().err.clone()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// True once termination began.
    pub fn is_terminating(&self) -> bool {
        self.inner.terminating.is_cancelled()
    }

    /// True once every `on_terminated` callback has run.
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.is_cancelled()
    }

    /// Completes when termination begins.
    pub async fn terminating(&self) {
        self.inner.terminating.cancelled().await
    }

    /// Completes when termination is done.
    pub async fn terminated(&self) {
        self.inner.terminated.cancelled().await
    }

    /// True when both handles drive the same state.
    pub fn ptr_eq(&self, other: &Terminator) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Terminator")
            .field("phase", &state.phase)
            .field("err", &state.err)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let make = move |tag: &'static str| -> Callback {
            let l = l.clone();
            Box::new(move |err: Option<&TaskError>| {
                l.lock().unwrap().push(format!("{tag}:{err:?}"));
            })
        };
        (log, make)
    }

    #[test]
    fn first_non_nil_error_wins() {
        let cases: Vec<(Vec<Option<TaskError>>, Option<TaskError>)> = vec![
            (vec![None, None], None),
            (
                vec![None, Some(TaskError::fail("a")), Some(TaskError::fail("b"))],
                Some(TaskError::fail("a")),
            ),
            (
                vec![Some(TaskError::fail("a")), None, Some(TaskError::fail("b"))],
                Some(TaskError::fail("a")),
            ),
        ];

        for (calls, expected) in cases {
            let t = Terminator::new();
            for err in calls {
                t.shutdown(err);
            }
            assert_eq!(t.err(), expected);
        }
    }

    #[test]
    fn callbacks_fire_once_in_order() {
        let t = Terminator::new();
        let (log, make) = recorder();
        t.on_terminated(make("ted-1"));
        t.on_terminating(make("ting-1"));
        t.on_terminating(make("ting-2"));
        t.on_terminated(make("ted-2"));

        t.shutdown(Some(TaskError::fail("x")));
        t.shutdown(None);
        t.shutdown(Some(TaskError::fail("y")));

        let err = format!("{:?}", Some(&TaskError::fail("x")));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                format!("ting-1:{err}"),
                format!("ting-2:{err}"),
                format!("ted-1:{err}"),
                format!("ted-2:{err}"),
            ]
        );
        assert_eq!(t.phase(), Phase::Terminated);
    }

    #[test]
    fn terminating_callbacks_finish_before_terminated() {
        let t = Terminator::new();
        let probe = t.clone();
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        t.on_terminating(move |_| {
            *s.lock().unwrap() = Some((probe.phase(), probe.is_terminated()));
        });

        t.shutdown(None);
        assert_eq!(*seen.lock().unwrap(), Some((Phase::Terminating, false)));
    }

    #[test]
    fn late_registration_runs_immediately() {
        let t = Terminator::new();
        t.shutdown(Some(TaskError::fatal("gone")));

        let (log, make) = recorder();
        t.on_terminating(make("ting"));
        t.on_terminated(make("ted"));

        let err = format!("{:?}", Some(&TaskError::fatal("gone")));
        assert_eq!(
            *log.lock().unwrap(),
            vec![format!("ting:{err}"), format!("ted:{err}")]
        );
    }

    #[test]
    fn callback_may_reenter_shutdown() {
        let t = Terminator::new();
        let again = t.clone();
        t.on_terminating(move |_| again.shutdown(Some(TaskError::fail("late"))));

        t.shutdown(None);
        assert!(t.is_terminated());
        assert_eq!(t.err(), Some(TaskError::fail("late")));
    }

    #[test]
    fn concurrent_shutdowns_run_callbacks_once() {
        let t = Terminator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        t.on_terminated(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::scope(|s| {
            for i in 0..8 {
                let t = t.clone();
                s.spawn(move || t.shutdown(Some(TaskError::fail(i))));
            }
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(t.err().is_some());
    }

    #[tokio::test]
    async fn waiters_observe_transitions() {
        let t = Terminator::new();
        let waiter = {
            let t = t.clone();
            tokio::spawn(async move {
                t.terminating().await;
                t.terminated().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        t.spawn_shutdown(None).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
        assert!(t.is_terminating());
        assert!(t.is_terminated());
    }
}
