//! Keeps the engine connection alive.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::transport::Transport;

/// Reconnect backoff schedule.
#[derive(Clone, Copy, Debug)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    /// How often the worker re-checks a healthy connection.
    pub probe_interval: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
            probe_interval: Duration::from_secs(1),
        }
    }
}

/// Retries the connection forever with exponential backoff and jitter.
/// The engine and this process start independently, so "not listening
/// yet" is a normal state, not an error to give up on.
pub struct ConnectionWorker<T: Transport> {
    transport: Arc<T>,
    config: BackoffConfig,
    shutdown: watch::Receiver<bool>,
}

impl<T: Transport> ConnectionWorker<T> {
    pub fn new(transport: Arc<T>, config: BackoffConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            transport,
            config,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut backoff = self.config.initial;
        loop {
            let delay = if self.transport.is_connected() {
                backoff = self.config.initial;
                self.config.probe_interval
            } else {
                match self.transport.ensure_connected().await {
                    Ok(()) => {
                        backoff = self.config.initial;
                        self.config.probe_interval
                    }
                    Err(error) => {
                        debug!(
                            target: "vanguard::connection",
                            %error,
                            retry_in_ms = backoff.as_millis() as u64,
                            "connect attempt failed"
                        );
                        let jittered = jitter(backoff);
                        backoff = next_backoff(backoff, &self.config);
                        jittered
                    }
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(target: "vanguard::connection", "connection worker stopping");
                        break;
                    }
                }
            }
        }
    }
}

/// Up to +25% random spread so several controllers do not hammer the
/// engine in lockstep after it restarts.
fn jitter(base: Duration) -> Duration {
    let spread = rand::thread_rng().gen_range(0.0..0.25);
    base.mul_f64(1.0 + spread)
}

/// Doubles the delay up to the configured ceiling.
fn next_backoff(current: Duration, config: &BackoffConfig) -> Duration {
    (current * 2).min(config.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vanguard_core::{EntityId, Faction, MoveOrder, ObservedActor};

    use crate::error::TransportError;

    struct HealthyTransport;

    #[async_trait]
    impl Transport for HealthyTransport {
        async fn ensure_connected(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn query_actors(
            &self,
            _: Faction,
        ) -> Result<Vec<ObservedActor>, TransportError> {
            Ok(Vec::new())
        }

        async fn attack(&self, _: EntityId, _: EntityId) -> Result<(), TransportError> {
            Ok(())
        }

        async fn move_actor(&self, _: &MoveOrder) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[test]
    fn backoff_doubles_until_the_cap() {
        let config = BackoffConfig {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(4),
            probe_interval: Duration::from_secs(1),
        };
        let mut backoff = config.initial;
        backoff = next_backoff(backoff, &config);
        assert_eq!(backoff, Duration::from_secs(1));
        backoff = next_backoff(backoff, &config);
        assert_eq!(backoff, Duration::from_secs(2));
        backoff = next_backoff(backoff, &config);
        assert_eq!(backoff, Duration::from_secs(4));
        backoff = next_backoff(backoff, &config);
        assert_eq!(backoff, Duration::from_secs(4));
    }

    #[test]
    fn jitter_spreads_within_a_quarter() {
        let base = Duration::from_secs(2);
        for _ in 0..100 {
            let delayed = jitter(base);
            assert!(delayed >= base);
            assert!(delayed < base.mul_f64(1.25));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn worker_exits_when_the_shutdown_sender_is_dropped() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = ConnectionWorker::new(
            Arc::new(HealthyTransport),
            BackoffConfig::default(),
            shutdown_rx,
        );
        let handle = tokio::spawn(worker.run());

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker must stop once the controller is gone")
            .expect("worker task");
    }
}
