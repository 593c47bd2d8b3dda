//! # Example: unready_period
//!
//! A readiness probe flips to "unready" on the first Ctrl-C while the process
//! keeps serving for the unready period; shutdown starts afterwards. A second
//! Ctrl-C skips the remaining delay.
//!
//! ## Flow
//! ```text
//! SIGINT #1 ──► readiness: unready ──► (5s) ──► ShutdownRequested
//! SIGINT #2 ──► ShutdownRequested (now)
//! SIGINT #4 ──► ForcedExit ──► exit hooks ──► status 1
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example unready_period
//! ```

use std::sync::Arc;
use std::time::Duration;

use termvisor::{Application, ChildFn, Config, LogWriter, Runnable, Subscribe, Terminator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cfg = Config::default();
    cfg.unready_period = Duration::from_secs(5);
    cfg.grace = Duration::from_secs(10);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let app = Application::builder(cfg).with_subscribers(subs).build();

    let readiness = app.readiness();
    app.supervise_and_start(ChildFn::arc("probe", move |term: Terminator| {
        let readiness = readiness.clone();
        Runnable::run(async move {
            loop {
                let status = if readiness.is_ready() { "ready" } else { "unready" };
                println!("[probe] {status}");
                tokio::select! {
                    _ = term.terminating() => break,
                    _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                }
            }
        })
    }));

    println!("press Ctrl-C once to start draining, twice to skip the delay");
    let res = app.wait().await;
    app.exit(&res);
}
