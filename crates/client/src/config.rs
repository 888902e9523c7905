//! Environment-driven client configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use vanguard_runtime::{ControllerConfig, TransportConfig};

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

/// Everything the binary needs, resolved from the environment with
/// sensible defaults for a local game bridge.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub controller: ControllerConfig,
    /// Interval of the status log line; `None` disables it.
    pub status_interval: Option<Duration>,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let mut transport = TransportConfig::default();
        if let Ok(endpoint) = env::var("VANGUARD_ENDPOINT") {
            transport.endpoint = endpoint;
        }
        if let Ok(language) = env::var("VANGUARD_LANGUAGE") {
            transport.language = language;
        }
        if let Some(millis) = read_env::<u64>("VANGUARD_REQUEST_TIMEOUT_MS") {
            transport.request_timeout = Duration::from_millis(millis.max(1));
        }

        let mut controller = ControllerConfig::default();
        if let Some(millis) = read_env::<u64>("VANGUARD_TICK_MS") {
            controller.tick_interval = Duration::from_millis(millis.max(10));
        }
        if let Some(millis) = read_env::<u64>("VANGUARD_REFRESH_MS") {
            controller.refresh_interval = Duration::from_millis(millis.max(10));
        }
        if let Some(misses) = read_env::<u32>("VANGUARD_EVICTION_MISSES") {
            controller.manager.eviction_misses = misses.max(1);
        }

        let status_interval = match read_env::<u64>("VANGUARD_STATUS_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(Duration::from_secs(5)),
        };

        Self {
            transport,
            controller,
            status_interval,
        }
    }
}
