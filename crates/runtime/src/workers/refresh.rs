//! Polls the engine for entity state and publishes snapshots.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::manager::EntityManager;
use crate::transport::Transport;

pub struct RefreshWorker<T: Transport> {
    manager: EntityManager<T>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<T: Transport> RefreshWorker<T> {
    pub fn new(
        manager: EntityManager<T>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            manager,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.manager.refresh().await {
                        Ok(snapshot) => {
                            trace!(
                                target: "vanguard::refresh",
                                version = snapshot.version,
                                entities = snapshot.iter().count(),
                                "snapshot published"
                            );
                        }
                        Err(error) => {
                            // Stale snapshot stays current; the connection
                            // worker is already rebuilding the link.
                            debug!(target: "vanguard::refresh", %error, "refresh failed");
                        }
                    }
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(target: "vanguard::refresh", "refresh worker stopping");
                        break;
                    }
                }
            }
        }
    }
}
