//! # Application: root terminator, supervision, and the termination wait.
//!
//! The [`Application`] owns one root [`Terminator`], a bootstrap
//! [`CancellationToken`] derived from the caller's base token, the event bus,
//! and the exit funnel. It supervises children and blocks in
//! [`Application::wait_for_termination`] until the process should end.
//!
//! ## Supervision bindings
//! ```text
//!            (a) child.on_terminated ──► root.shutdown(child err)
//!   child ◄──────────────────────────────────────────────────── root
//!            (b) root.on_terminating ──► registry fan-out ──► child.shutdown(None)
//! ```
//! Any child failure is fatal to the whole application; an application-level
//! shutdown stops every child without blaming it.
//!
//! ## Wait sequence
//! ```text
//! wait_for_termination(unready, grace)
//!   ├─ spawn SignalWatcher(unready) over the signal source
//!   ├─ select:
//!   │    ├─ forwarded signal  ──► publish ShutdownRequested ──► root.spawn_shutdown(None)
//!   │    └─ root terminating  ──► publish ApplicationTerminating
//!   ├─ publish WaitingForTermination
//!   ├─ timeout(grace, root.terminated()):
//!   │    ├─ done     ──► publish AllStoppedWithin
//!   │    └─ elapsed  ──► publish GraceExceeded (children not terminated yet)
//!   └─ return root.err() as RuntimeError::Terminated
//! ```
//! Children still running after the grace period are abandoned, not killed.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use termvisor::{Application, ChildFn, Runnable, TaskError, Terminator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Application::new(&CancellationToken::new());
//!
//!     app.supervise_and_start(ChildFn::arc("ticker", |term: Terminator| {
//!         Runnable::run_error(async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = term.terminating() => return Ok::<(), TaskError>(()),
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => println!("tick"),
//!                 }
//!             }
//!         })
//!     }));
//!
//!     let res = app.wait_for_termination(Duration::ZERO, Duration::from_secs(10)).await;
//!     app.exit(&res);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::children::Child;
use crate::core::builder::ApplicationBuilder;
use crate::core::config::Config;
use crate::core::registry::{Admission, Registry};
use crate::core::runner;
use crate::core::signals::{OsSignals, Readiness, SignalSource, SignalWatcher};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::exit::ExitHandlers;
use crate::terminator::{Shutter, Terminator};

/// Root of a supervision tree.
pub struct Application {
    cfg: Config,
    ctx: CancellationToken,
    terminator: Terminator,
    registry: Arc<Registry>,
    readiness: Readiness,
    bus: Bus,
    exit: ExitHandlers,
}

impl Application {
    /// Creates an application with the default [`Config`], deriving its
    /// bootstrap token from `parent` and exiting through [`ExitHandlers::global`].
    pub fn new(parent: &CancellationToken) -> Self {
        Self::builder(Config::default())
            .with_parent(parent.clone())
            .build()
    }

    /// Starts building an application with `cfg`.
    pub fn builder(cfg: Config) -> ApplicationBuilder {
        ApplicationBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        parent: &CancellationToken,
        bus: Bus,
        exit: ExitHandlers,
    ) -> Self {
        let ctx = parent.child_token();
        let terminator = Terminator::new();
        let registry = Registry::new();

        let bootstrap = ctx.clone();
        terminator.on_terminating(move |_| bootstrap.cancel());
        let children = Arc::clone(&registry);
        terminator.on_terminating(move |_| children.close_and_shutdown());

        Self {
            cfg,
            ctx,
            terminator,
            registry,
            readiness: Readiness::new(),
            bus,
            exit,
        }
    }

    /// Bootstrap-only cancellation scope.
    ///
    /// Cancelled as soon as the application starts terminating (or the parent
    /// token is cancelled). Long-running work must stop through its own terminator.
    pub fn context(&self) -> CancellationToken {
        self.ctx.clone()
    }

    /// Readiness flags, marked by the signal watcher once waiting started.
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Event bus shared with the signal watcher and child runners.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Exit funnel used by this application.
    pub fn exit_handlers(&self) -> &ExitHandlers {
        &self.exit
    }

    /// Configuration the application was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Names of supervised children, in supervision order.
    pub fn supervised(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Couples `child` to the root terminator.
    ///
    /// A child failure becomes the application's terminal error; the
    /// application terminating shuts the child down gracefully.
    ///
    /// Returns `false` when the child was already supervised (nothing is bound
    /// twice) or when the application is already terminating, in which case the
    /// child is shut down on the calling thread before returning.
    pub fn supervise<S: Shutter + ?Sized>(&self, child: &S) -> bool {
        self.bind(child) == Admission::Added
    }

    fn bind<S: Shutter + ?Sized>(&self, child: &S) -> Admission {
        let name: Arc<str> = child.name().into();
        let child_term = child.terminator();

        let admission = self.registry.insert(&name, child_term);
        if admission == Admission::Duplicate {
            tracing::debug!(child = %name, "child already supervised");
            return admission;
        }

        let root = self.terminator.clone();
        let bus = self.bus.clone();
        let child_name = Arc::clone(&name);
        child_term.on_terminated(move |err| {
            let mut ev = Event::new(EventKind::ChildTerminated).with_child(child_name);
            if let Some(e) = err {
                ev = ev.with_reason(e.to_string());
            }
            bus.publish(ev);
            root.shutdown(err.cloned());
        });

        match admission {
            Admission::Added => self
                .bus
                .publish(Event::new(EventKind::ChildSupervised).with_child(name)),
            _ => child_term.shutdown(None),
        }
        admission
    }

    /// Supervises `child` and starts its run on a new task.
    ///
    /// A child supervised earlier is started without binding it again. A child
    /// without a run shape is a programming error: the process quits through
    /// the exit funnel. Returns the run task's handle when it started; nothing
    /// starts once the application is terminating.
    ///
    /// Must be called from within a tokio runtime.
    pub fn supervise_and_start<C: Child + ?Sized>(&self, child: Arc<C>) -> Option<JoinHandle<()>> {
        if self.bind(&*child) == Admission::Closed {
            return None;
        }

        let name: Arc<str> = child.name().into();
        let terminator = child.terminator().clone();
        let Some(runnable) = child.runnable() else {
            self.exit
                .quit(format!("unsupported child {name}: it exposes no run shape"));
            return None;
        };

        Some(runner::start(
            name,
            terminator,
            runnable,
            self.ctx.clone(),
            self.bus.clone(),
        ))
    }

    /// Waits on the process's `SIGINT`/`SIGTERM` for the application to end.
    ///
    /// See [`wait_for_termination_with`](Self::wait_for_termination_with).
    pub async fn wait_for_termination(
        &self,
        unready_period: Duration,
        grace: Duration,
    ) -> Result<(), RuntimeError> {
        let source = OsSignals::new().map_err(RuntimeError::SignalSetup)?;
        self.wait_for_termination_with(source, unready_period, grace)
            .await
    }

    /// [`wait_for_termination`](Self::wait_for_termination) with the delays from [`Config`].
    pub async fn wait(&self) -> Result<(), RuntimeError> {
        self.wait_for_termination(self.cfg.unready_period, self.cfg.grace)
            .await
    }

    /// Blocks until a forwarded signal or the root terminator starts the
    /// shutdown, then waits at most `grace` for it to complete.
    ///
    /// Returns the root terminator's recorded error, if any. The signal watcher
    /// keeps running afterwards so repeated signals still force an exit.
    pub async fn wait_for_termination_with<S: SignalSource>(
        &self,
        source: S,
        unready_period: Duration,
        grace: Duration,
    ) -> Result<(), RuntimeError> {
        let mut watch = SignalWatcher::new(unready_period, self.bus.clone(), self.exit.clone())
            .with_readiness(self.readiness.clone())
            .with_force_exit_after(self.cfg.force_exit_after)
            .spawn(source);

        tokio::select! {
            Some(signal) = watch.recv() => {
                self.bus
                    .publish(Event::new(EventKind::ShutdownRequested).with_signal(signal));
                drop(self.terminator.spawn_shutdown(None));
            }
            _ = self.terminator.terminating() => {
                let mut ev = Event::new(EventKind::ApplicationTerminating)
                    .with_signaled(self.readiness.has_been_signaled());
                if let Some(e) = self.terminator.err() {
                    ev = ev.with_reason(e.to_string());
                }
                self.bus.publish(ev);
            }
        }

        self.bus
            .publish(Event::new(EventKind::WaitingForTermination).with_grace(grace));
        match tokio::time::timeout(grace, self.terminator.terminated()).await {
            Ok(()) => self.bus.publish(Event::new(EventKind::AllStoppedWithin)),
            Err(_) => self.bus.publish(
                Event::new(EventKind::GraceExceeded)
                    .with_grace(grace)
                    .with_reason(self.registry.stuck().join(", ")),
            ),
        }

        match self.terminator.err() {
            Some(e) => Err(RuntimeError::Terminated(e)),
            None => Ok(()),
        }
    }

    /// Ends the process with the status matching `res` (0 or 1), running exit hooks first.
    pub fn exit(&self, res: &Result<(), RuntimeError>) {
        let code = match res {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(label = e.as_label(), "{}", e.as_message());
                e.exit_code()
            }
        };
        self.exit.exit(code);
    }
}

impl Shutter for Application {
    fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    fn name(&self) -> &str {
        "application"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::time::{Instant, sleep};

    use super::*;
    use crate::children::{ChildFn, Runnable};
    use crate::core::signals::Signal;
    use crate::error::TaskError;
    use crate::subscribers::Subscribe;

    fn test_app() -> (Application, Arc<Mutex<Vec<i32>>>) {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let c = codes.clone();
        let exits = ExitHandlers::with_process_exit(move |code| c.lock().unwrap().push(code));
        let app = Application::builder(Config::default())
            .with_exit_handlers(exits)
            .build();
        (app, codes)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    struct Named {
        name: &'static str,
        terminator: Terminator,
    }

    impl Named {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                terminator: Terminator::new(),
            }
        }
    }

    impl Shutter for Named {
        fn terminator(&self) -> &Terminator {
            &self.terminator
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    impl Child for Named {}

    #[test]
    fn child_error_becomes_terminal_error() {
        let (app, _) = test_app();
        let db = Named::new("db");
        let cache = Named::new("cache");
        assert!(app.supervise(&db));
        assert!(app.supervise(&cache));

        db.shutdown(Some(TaskError::fail("connection reset")));

        assert!(app.terminator().is_terminated());
        assert_eq!(app.err(), Some(TaskError::fail("connection reset")));
        assert!(cache.terminator().is_terminated());
        assert_eq!(cache.err(), None);
        assert!(app.context().is_cancelled());
    }

    #[test]
    fn application_shutdown_stops_children_gracefully() {
        let (app, _) = test_app();
        let child = Named::new("worker");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        child.on_terminating(move |err| s.lock().unwrap().push(err.cloned()));
        app.supervise(&child);

        app.shutdown(None);

        assert!(child.terminator().is_terminated());
        assert_eq!(*seen.lock().unwrap(), vec![None]);
        assert_eq!(app.err(), None);
    }

    #[test]
    fn supervising_twice_binds_once() {
        let (app, _) = test_app();
        let child = Named::new("worker");
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        app.on_terminating(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert!(app.supervise(&child));
        assert!(!app.supervise(&child));
        assert_eq!(app.supervised(), vec!["worker"]);

        child.shutdown(None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_supervision_shuts_child_down() {
        let (app, _) = test_app();
        app.shutdown(Some(TaskError::fatal("config invalid")));

        let late = Named::new("late");
        assert!(!app.supervise(&late));
        assert!(late.terminator().is_terminated());
        assert_eq!(late.err(), None);
        assert_eq!(app.err(), Some(TaskError::fatal("config invalid")));
    }

    #[test]
    fn bootstrap_scope_follows_parent() {
        let parent = CancellationToken::new();
        let app = Application::builder(Config::default())
            .with_parent(parent.clone())
            .with_exit_handlers(ExitHandlers::with_process_exit(|_| {}))
            .build();

        parent.cancel();
        assert!(app.context().is_cancelled());
        assert!(!app.terminator().is_terminating());
    }

    fn plain(n: Arc<AtomicUsize>) -> Runnable {
        Runnable::run(async move {
            n.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn plain_error(n: Arc<AtomicUsize>) -> Runnable {
        Runnable::run_error(async move {
            n.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::fail("run_error"))
        })
    }

    fn context(n: Arc<AtomicUsize>) -> Runnable {
        Runnable::run_context(move |ctx: CancellationToken| async move {
            assert!(!ctx.is_cancelled());
            n.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn context_error(n: Arc<AtomicUsize>) -> Runnable {
        Runnable::run_context_error(move |_ctx: CancellationToken| async move {
            n.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::fail("run_context_error"))
        })
    }

    #[tokio::test]
    async fn every_run_shape_dispatches_once() {
        let shapes: [(&'static str, fn(Arc<AtomicUsize>) -> Runnable, bool); 4] = [
            ("run", plain, false),
            ("run_error", plain_error, true),
            ("run_context", context, false),
            ("run_context_error", context_error, true),
        ];

        for (shape, build, fails) in shapes {
            let (app, _) = test_app();
            let calls = Arc::new(AtomicUsize::new(0));
            let c = calls.clone();
            let child = ChildFn::arc(shape, move |_t: Terminator| build(c.clone()));

            let handle = app.supervise_and_start(child.clone()).unwrap();
            handle.await.unwrap();

            assert_eq!(calls.load(Ordering::SeqCst), 1, "{shape}");
            if fails {
                assert_eq!(child.err(), Some(TaskError::fail(shape)), "{shape}");
                assert_eq!(app.err(), Some(TaskError::fail(shape)), "{shape}");
            } else {
                assert!(!child.terminator().is_terminating(), "{shape}");
                assert!(!app.terminator().is_terminating(), "{shape}");
            }
        }
    }

    #[tokio::test]
    async fn child_without_run_shape_quits() {
        let (app, codes) = test_app();

        let handle = app.supervise_and_start(Arc::new(Named::new("bare")));

        assert!(handle.is_none());
        assert_eq!(*codes.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn previously_supervised_child_still_starts() {
        let (app, _) = test_app();
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let child = ChildFn::arc("indexer", move |_t: Terminator| {
            let r = r.clone();
            Runnable::run(async move {
                r.fetch_add(1, Ordering::SeqCst);
            })
        });

        assert!(app.supervise(&*child));
        let handle = app.supervise_and_start(child.clone()).unwrap();
        handle.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(app.supervised(), vec!["indexer"]);
    }

    #[tokio::test]
    async fn previously_supervised_bare_child_still_quits() {
        let (app, codes) = test_app();
        let bare = Arc::new(Named::new("bare"));

        assert!(app.supervise(&*bare));
        assert!(app.supervise_and_start(bare).is_none());
        assert_eq!(*codes.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn nothing_starts_after_termination_began() {
        let (app, codes) = test_app();
        app.shutdown(None);

        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let late = ChildFn::arc("late", move |_t: Terminator| {
            let r = r.clone();
            Runnable::run(async move {
                r.fetch_add(1, Ordering::SeqCst);
            })
        });

        assert!(app.supervise_and_start(late.clone()).is_none());
        assert!(late.terminator().is_terminated());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(codes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signal_shuts_down_gracefully() {
        let (app, _) = test_app();
        let child = Named::new("server");
        app.supervise(&child);
        let mut events = app.bus().subscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Signal::Terminate).unwrap();
        let res = app
            .wait_for_termination_with(rx, Duration::ZERO, Duration::from_secs(5))
            .await;

        assert!(res.is_ok());
        assert!(child.terminator().is_terminated());
        assert!(app.readiness().has_been_signaled());
        assert!(!app.readiness().is_ready());

        let kinds: Vec<EventKind> = drain(&mut events).into_iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EventKind::ShutdownRequested));
        assert!(kinds.contains(&EventKind::AllStoppedWithin));
    }

    #[tokio::test]
    async fn failing_child_ends_the_wait_with_its_error() {
        let (app, _) = test_app();
        let sibling = Named::new("sibling");
        app.supervise(&sibling);
        app.supervise_and_start(ChildFn::arc("http", |_t: Terminator| {
            Runnable::run_error(async {
                sleep(Duration::from_millis(10)).await;
                Err(TaskError::fail("bind: address in use"))
            })
        }));

        let (_tx, rx) = mpsc::unbounded_channel::<Signal>();
        let res = app
            .wait_for_termination_with(rx, Duration::ZERO, Duration::from_secs(5))
            .await;

        let err = res.unwrap_err();
        assert_eq!(err.task_error(), Some(&TaskError::fail("bind: address in use")));
        assert!(sibling.terminator().is_terminated());
        assert!(!app.readiness().has_been_signaled());
    }

    #[tokio::test]
    async fn grace_expiry_abandons_stuck_children() {
        let (app, _) = test_app();
        let stuck = Named::new("stuck");
        stuck.on_terminating(|_| std::thread::sleep(Duration::from_millis(300)));
        app.supervise(&stuck);
        let mut events = app.bus().subscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Signal::Interrupt).unwrap();
        let start = Instant::now();
        let res = app
            .wait_for_termination_with(rx, Duration::ZERO, Duration::from_millis(50))
            .await;

        assert!(res.is_ok());
        assert!(start.elapsed() < Duration::from_millis(250));
        let exceeded = drain(&mut events)
            .into_iter()
            .find(|e| e.kind == EventKind::GraceExceeded)
            .unwrap();
        assert_eq!(exceeded.reason.as_deref(), Some("stuck"));
        assert_eq!(exceeded.grace_ms, Some(50));
    }

    #[tokio::test]
    async fn repeated_signals_force_exit_through_hooks() {
        let (app, codes) = test_app();
        let hooked = Arc::new(AtomicUsize::new(0));
        let h = hooked.clone();
        app.exit_handlers().register("flush", move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        let (tx, rx) = mpsc::unbounded_channel();
        for _ in 0..4 {
            tx.send(Signal::Interrupt).unwrap();
        }
        let res = app
            .wait_for_termination_with(rx, Duration::from_secs(30), Duration::from_secs(5))
            .await;
        assert!(res.is_ok());

        for _ in 0..50 {
            if !codes.lock().unwrap().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*codes.lock().unwrap(), vec![1]);
        assert_eq!(hooked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exit_maps_results_to_status() {
        let (app, codes) = test_app();
        app.exit(&Err(RuntimeError::Terminated(TaskError::fail("boom"))));
        app.exit(&Ok(()));
        assert_eq!(*codes.lock().unwrap(), vec![1, 0]);
    }

    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn subscribers_receive_lifecycle_events() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let app = Application::builder(Config::default())
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .with_exit_handlers(ExitHandlers::with_process_exit(|_| {}))
            .build();

        let child = Named::new("job");
        app.supervise(&child);
        child.shutdown(Some(TaskError::fail("boom")));

        let (_tx, rx) = mpsc::unbounded_channel::<Signal>();
        let res = app
            .wait_for_termination_with(rx, Duration::ZERO, Duration::from_secs(1))
            .await;
        assert!(res.is_err());

        sleep(Duration::from_millis(50)).await;
        let kinds = recorder.0.lock().unwrap().clone();
        assert_eq!(
            kinds,
            vec![
                EventKind::ChildSupervised,
                EventKind::ChildTerminated,
                EventKind::ApplicationTerminating,
                EventKind::WaitingForTermination,
                EventKind::AllStoppedWithin,
            ]
        );
    }
}
