//! # Example: child_failure
//!
//! One child fails after a second; its error becomes the application's
//! terminal error and the healthy sibling is shut down gracefully.
//!
//! ## Flow
//! ```text
//! migrator: Err("schema mismatch")
//!     ├─► publish(ChildFailed)
//!     └─► migrator.shutdown(Some(err))
//!           └─► root.shutdown(Some(err))
//!                 └─► api.shutdown(None)
//! wait_for_termination() ──► Err(RuntimeError::Terminated) ──► status 1
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example child_failure
//! ```

use std::sync::Arc;
use std::time::Duration;

use termvisor::{Application, ChildFn, Config, LogWriter, Runnable, Subscribe, TaskError, Terminator};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let app = Application::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let api = ChildFn::arc("api", |term: Terminator| {
        Runnable::run(async move {
            term.terminating().await;
            println!("[api] stopped, recorded error: {:?}", term.err());
        })
    });
    app.supervise_and_start(api);

    app.supervise_and_start(ChildFn::arc("migrator", |_term: Terminator| {
        Runnable::run_error(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err(TaskError::fail("schema mismatch"))
        })
    }));

    let res = app.wait().await;
    if let Err(e) = &res {
        println!("application failed: {e}");
    }
    app.exit(&res);
}
