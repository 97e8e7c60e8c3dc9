//! In-process event delivery: subscribers register on an [`EventBus`] and an
//! [`OutboxRelay`] feeds it from the orders outbox.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::errors::DomainError;
use crate::domain::events::Event;
use crate::domain::ports::{EventHandler, OutboxRepository};
use crate::telemetry::LogContext;

pub struct EventBus {
    handlers: HashMap<(String, String), Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn subscribe(&mut self, source: &str, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .entry((source.to_string(), event_type.to_string()))
            .or_default()
            .push(handler);
    }

    /// Run every handler subscribed to the event, stopping at the first
    /// failure. Returns how many handlers ran.
    pub fn dispatch(&self, event: &Event) -> Result<usize, DomainError> {
        let key = (event.source.clone(), event.event_type.clone());
        let Some(handlers) = self.handlers.get(&key) else {
            return Ok(0);
        };
        for handler in handlers {
            handler.handle(event)?;
        }
        Ok(handlers.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct OutboxRelayConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
}

impl Default for OutboxRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 100,
        }
    }
}

/// Moves recorded events from the outbox to the bus. An event is marked
/// published only after all of its subscribers succeeded, so failed events
/// are retried on the next pass.
pub struct OutboxRelay {
    outbox: Arc<dyn OutboxRepository>,
    bus: Arc<EventBus>,
    config: OutboxRelayConfig,
    log: LogContext,
}

impl OutboxRelay {
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        bus: Arc<EventBus>,
        config: OutboxRelayConfig,
        log: LogContext,
    ) -> Self {
        Self {
            outbox,
            bus,
            config,
            log,
        }
    }

    /// One relay pass. Returns the number of events marked published.
    pub fn run_once(&self) -> Result<usize, DomainError> {
        let events = self.outbox.fetch_unpublished(self.config.batch_size)?;
        if events.is_empty() {
            return Ok(0);
        }

        let mut delivered = Vec::with_capacity(events.len());
        for event in &events {
            match self.bus.dispatch(event) {
                Ok(0) => {
                    log::debug!(
                        target: self.log.target(),
                        "No subscribers for {}.{} ({})",
                        event.source,
                        event.event_type,
                        event.id
                    );
                    delivered.push(event.id);
                }
                Ok(_) => delivered.push(event.id),
                Err(e) => log::warn!(
                    target: self.log.target(),
                    "Delivery of {}.{} ({}) failed, will retry: {}",
                    event.source,
                    event.event_type,
                    event.id,
                    e
                ),
            }
        }

        self.outbox.mark_published(&delivered)?;
        log::info!(
            target: self.log.target(),
            "{} of {} outbox events delivered",
            delivered.len(),
            events.len()
        );
        Ok(delivered.len())
    }

    /// Poll the outbox until `shutdown` flips to `true` or its sender is
    /// dropped.
    pub fn start(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!(target: self.log.target(), "Outbox relay started");
            let mut ticker = interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let relay = Arc::clone(&self);
                        match tokio::task::spawn_blocking(move || relay.run_once()).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => log::error!(target: self.log.target(), "Outbox relay pass failed: {}", e),
                            Err(e) => log::error!(target: self.log.target(), "Outbox relay task panicked: {}", e),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            log::info!(target: self.log.target(), "Outbox relay stopped");
        })
    }
}
