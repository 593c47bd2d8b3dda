use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    core::Config,
    events::Bus,
    exit::ExitHandlers,
    subscribers::{Subscribe, SubscriberSet},
};
use super::application::Application;

/// Builder for constructing an [`Application`] with optional features.
pub struct ApplicationBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    exit: Option<ExitHandlers>,
    parent: Option<CancellationToken>,
}

impl ApplicationBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            exit: None,
            parent: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (signals, child failures, grace
    /// expiry) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the exit funnel. Defaults to [`ExitHandlers::global`].
    pub fn with_exit_handlers(mut self, exit: ExitHandlers) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Sets the base token the bootstrap scope derives from.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the application.
    ///
    /// With subscribers configured this spawns their workers and the bus
    /// listener, so it must then be called from within a tokio runtime.
    pub fn build(self) -> Application {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, subs);
        }

        let exit = self
            .exit
            .unwrap_or_else(|| ExitHandlers::global().clone());
        let parent = self.parent.unwrap_or_default();
        Application::new_internal(self.cfg, &parent, bus, exit)
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
fn subscriber_listener(bus: &Bus, subs: SubscriberSet) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => subs.emit(ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        subs.shutdown().await;
    });
}
