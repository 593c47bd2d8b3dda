//! # Example: basic_app
//!
//! A long-running worker and a struct-based child under one [`Application`],
//! stopped by Ctrl-C (or `kill -TERM`).
//!
//! Demonstrates how to:
//! - Start a closure-backed child with [`ChildFn`].
//! - Implement [`Shutter`] + [`Child`] for your own type.
//! - Register an exit hook and exit through [`Application::exit`].
//!
//! ## Flow
//! ```text
//! supervise_and_start(ticker), supervise_and_start(server)
//!     └─► wait_for_termination()
//!           ├─► SIGINT ──► ShutdownRequested ──► root.shutdown(None)
//!           │                ├─► ticker.shutdown(None)
//!           │                └─► server.shutdown(None)
//!           ├─► AllStoppedWithin
//!           └─► app.exit(Ok) ──► exit hooks ──► status 0
//! ```
//!
//! Press Ctrl-C four times to see the forced exit.
//!
//! ## Run
//! ```bash
//! cargo run --example basic_app
//! ```

use std::sync::Arc;
use std::time::Duration;

use termvisor::{
    Application, Child, ChildFn, Config, LogWriter, Runnable, Shutter, Subscribe, TaskError,
    Terminator,
};
use tracing_subscriber::EnvFilter;

/// A fake server that "accepts connections" until told to stop.
struct Server {
    terminator: Terminator,
}

impl Shutter for Server {
    fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    fn name(&self) -> &str {
        "server"
    }
}

impl Child for Server {
    fn runnable(self: Arc<Self>) -> Option<Runnable> {
        Some(Runnable::run_context_error(move |ctx| async move {
            // Bootstrap: give up if the application is already going down.
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                _ = tokio::time::sleep(Duration::from_millis(100)) => println!("[server] listening"),
            }

            self.terminator.terminating().await;
            println!("[server] draining connections");
            Ok::<(), TaskError>(())
        }))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(5);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let app = Application::builder(cfg).with_subscribers(subs).build();
    app.exit_handlers()
        .register("goodbye", |code| println!("[exit] status {code}"));

    app.supervise_and_start(ChildFn::arc("ticker", |term: Terminator| {
        Runnable::run(async move {
            let mut n = 0u64;
            loop {
                tokio::select! {
                    _ = term.terminating() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        n += 1;
                        println!("[ticker] tick {n}");
                    }
                }
            }
        })
    }));
    app.supervise_and_start(Arc::new(Server {
        terminator: Terminator::new(),
    }));

    println!("running; press Ctrl-C to stop");
    let res = app.wait().await;
    app.exit(&res);
}
