//! # Registry of supervised children.
//!
//! Holds the downward half of every supervision binding: when the root
//! terminator starts terminating, the registry is closed and every child still
//! running is shut down gracefully, concurrently, on scoped threads. The root
//! reaches `Terminated` only after all of them returned.
//!
//! ```text
//! root.on_terminating ──► Registry::close() ──► [child A, child B, ...]
//!                                                  │         │
//!                                      thread: A.shutdown(None)
//!                                                 thread: B.shutdown(None)
//!                                                  └────┬────┘
//!                                                  join all ──► root Terminated
//! ```
//!
//! ## Rules
//! - A terminator is registered at most once.
//! - After `close()`, new registrations are refused; the caller shuts the child down itself.
//! - `stuck()` lists children that have not reached `Terminated`, for grace-exceeded reports.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::terminator::Terminator;

#[derive(Clone)]
struct Entry {
    name: Arc<str>,
    terminator: Terminator,
}

#[derive(Default)]
struct State {
    closed: bool,
    children: Vec<Entry>,
}

/// Outcome of [`Registry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Newly registered.
    Added,
    /// The same terminator is already registered.
    Duplicate,
    /// The root is terminating; nothing is registered anymore.
    Closed,
}

/// Supervised children, keyed by terminator identity.
#[derive(Default)]
pub(crate) struct Registry {
    state: Mutex<State>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn insert(&self, name: &str, terminator: &Terminator) -> Admission {
        let mut state = self.lock();
        if state.closed {
            return Admission::Closed;
        }
        if state.children.iter().any(|e| e.terminator.ptr_eq(terminator)) {
            return Admission::Duplicate;
        }
        state.children.push(Entry {
            name: name.into(),
            terminator: terminator.clone(),
        });
        Admission::Added
    }

    /// Refuses further registrations and shuts every running child down gracefully.
    ///
    /// Blocks until every child's `shutdown` returned.
    pub(crate) fn close_and_shutdown(&self) {
        let running: Vec<Terminator> = {
            let mut state = self.lock();
            state.closed = true;
            state
                .children
                .iter()
                .filter(|e| !e.terminator.is_terminating())
                .map(|e| e.terminator.clone())
                .collect()
        };

        match running.as_slice() {
            [] => {}
            [only] => only.shutdown(None),
            many => std::thread::scope(|s| {
                for t in many {
                    s.spawn(move || t.shutdown(None));
                }
            }),
        }
    }

    /// Sorted names of children that have not terminated yet.
    pub(crate) fn stuck(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .children
            .iter()
            .filter(|e| !e.terminator.is_terminated())
            .map(|e| e.name.to_string())
            .collect();
        names.sort_unstable();
        names
    }

    /// Names in supervision order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.lock()
            .children
            .iter()
            .map(|e| e.name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn duplicates_and_late_arrivals_are_refused() {
        let reg = Registry::new();
        let a = Terminator::new();
        assert_eq!(reg.insert("a", &a), Admission::Added);
        assert_eq!(reg.insert("a-again", &a.clone()), Admission::Duplicate);

        reg.close_and_shutdown();
        assert!(a.is_terminated());
        assert_eq!(reg.insert("b", &Terminator::new()), Admission::Closed);
        assert_eq!(reg.names(), vec!["a"]);
    }

    #[test]
    fn children_shut_down_concurrently() {
        let reg = Registry::new();
        let slow = Duration::from_millis(200);
        let children: Vec<Terminator> = (0..4).map(|_| Terminator::new()).collect();
        for (i, t) in children.iter().enumerate() {
            t.on_terminating(move |_| std::thread::sleep(slow));
            reg.insert(&format!("child-{i}"), t);
        }

        let start = Instant::now();
        reg.close_and_shutdown();

        assert!(start.elapsed() < slow * 3);
        assert!(children.iter().all(Terminator::is_terminated));
        assert!(reg.stuck().is_empty());
    }

    #[test]
    fn stuck_lists_unfinished_children() {
        let reg = Registry::new();
        let done = Terminator::new();
        let pending = Terminator::new();
        reg.insert("zeta", &pending);
        reg.insert("alpha", &done);
        reg.insert("beta", &Terminator::new());
        done.shutdown(None);

        assert_eq!(reg.stuck(), vec!["beta", "zeta"]);
    }
}
