//! # Exit hook registry: the single funnel for ending the process.
//!
//! [`ExitHandlers`] keeps an insertion-ordered list of named hooks. Calling
//! [`ExitHandlers::exit`] runs every hook with the exit status, then ends the
//! process. Every deliberate exit in this crate (forced kill from the signal
//! watcher, [`quit`](ExitHandlers::quit), [`Application::exit`](crate::Application::exit))
//! goes through it.
//!
//! ## Rules
//! - Registering an existing id replaces the hook in place (no duplicate invocation).
//! - Registering `None` for an id removes it.
//! - Hooks run at most once per registry, outside the internal lock, so a hook
//!   may itself register hooks or call `exit` without deadlocking.
//! - Panicking hooks are not caught.
//!
//! ## Example
//! ```
//! use std::sync::{Arc, Mutex};
//! use termvisor::ExitHandlers;
//!
//! let codes = Arc::new(Mutex::new(Vec::new()));
//! let c = codes.clone();
//! let exits = ExitHandlers::with_process_exit(|_code| { /* tests: don't exit */ });
//!
//! exits.register("flush", move |code| c.lock().unwrap().push(code));
//! exits.exit(0);
//!
//! assert_eq!(*codes.lock().unwrap(), vec![0]);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Hook invoked with the exit status.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync + 'static>;

type ProcessExit = Arc<dyn Fn(i32) + Send + Sync + 'static>;

struct Inner {
    hooks: Mutex<Vec<(String, ExitHook)>>,
    fired: AtomicBool,
    process_exit: ProcessExit,
}

/// Process-wide registry of named exit hooks.
///
/// Cloning is cheap; clones share the same hooks.
#[derive(Clone)]
pub struct ExitHandlers {
    inner: Arc<Inner>,
}

impl ExitHandlers {
    /// Creates a registry that ends the process with [`std::process::exit`].
    pub fn new() -> Self {
        Self::with_process_exit(|code| std::process::exit(code))
    }

    /// Creates a registry whose final step is `process_exit` instead of
    /// [`std::process::exit`].
    pub fn with_process_exit<F>(process_exit: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                hooks: Mutex::new(Vec::new()),
                fired: AtomicBool::new(false),
                process_exit: Arc::new(process_exit),
            }),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static ExitHandlers {
        static GLOBAL: OnceLock<ExitHandlers> = OnceLock::new();
        GLOBAL.get_or_init(ExitHandlers::new)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, ExitHook)>> {
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers, replaces (`Some`) or removes (`None`) the hook stored under `id`.
    pub fn exit_handler(&self, id: impl Into<String>, hook: Option<ExitHook>) {
        let id = id.into();
        let mut hooks = self.lock();
        let pos = hooks.iter().position(|(existing, _)| *existing == id);

        match (pos, hook) {
            (Some(i), Some(hook)) => hooks[i].1 = hook,
            (None, Some(hook)) => hooks.push((id, hook)),
            (Some(i), None) => {
                hooks.remove(i);
            }
            (None, None) => {}
        }
    }

    /// Registers or replaces the hook stored under `id`.
    pub fn register<F>(&self, id: impl Into<String>, hook: F)
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.exit_handler(id, Some(Arc::new(hook)));
    }

    /// Removes the hook stored under `id`, if any.
    pub fn unregister(&self, id: &str) {
        self.exit_handler(id, None);
    }

    /// Registered ids, in invocation order.
    pub fn ids(&self) -> Vec<String> {
        self.lock().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Runs every hook with `code`, in registration order, then ends the process.
    ///
    /// Only returns when the registry was built with a process exit that returns.
    pub fn exit(&self, code: i32) {
        if !self.inner.fired.swap(true, Ordering::SeqCst) {
            let hooks: Vec<ExitHook> = self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
            tracing::debug!(code, hooks = hooks.len(), "running exit hooks");
            for hook in hooks {
                hook(code);
            }
        }
        (self.inner.process_exit)(code);
    }
}

impl Default for ExitHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExitHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitHandlers")
            .field("ids", &self.ids())
            .field("fired", &self.inner.fired.load(Ordering::SeqCst))
            .finish()
    }
}
