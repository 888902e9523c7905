//! Tactical micro-control client binary.
//!
//! Composition root: builds the TCP transport to the game bridge, starts
//! the controller, and logs a periodic status line until interrupted.
//! Assignments arrive from an upstream commander through the controller
//! handle; this binary itself only observes.
//!
//! Configuration is environment-driven (a `.env` file is honored):
//!
//! - `VANGUARD_ENDPOINT`: bridge address, default `127.0.0.1:7445`
//! - `VANGUARD_TICK_MS` / `VANGUARD_REFRESH_MS`: loop cadences
//! - `VANGUARD_STATUS_SECS`: status line interval, `0` disables
//! - `RUST_LOG`: tracing filter, e.g. `vanguard=debug`

mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vanguard_runtime::{Controller, TcpTransport};

use crate::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    info!(target: "vanguard::client", endpoint = %config.transport.endpoint, "starting");

    let transport = TcpTransport::new(config.transport);
    let controller = Controller::builder(transport)
        .config(config.controller)
        .build();

    let status_task = config.status_interval.map(|interval| {
        let handle = controller.handle();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match handle.status().await {
                    Ok(status) => info!(
                        target: "vanguard::client",
                        version = status.snapshot_version,
                        allies = status.ally_count,
                        enemies = status.enemy_count,
                        connected = status.connected,
                        assignments = status.active_assignments,
                        interrupts = status.active_interrupts.len(),
                        cycles = status.cycles_completed,
                        "status"
                    ),
                    // Controller is gone; shutdown is in progress.
                    Err(_) => break,
                }
            }
        })
    });

    tokio::signal::ctrl_c().await?;
    info!(target: "vanguard::client", "interrupt received");

    controller.shutdown().await?;
    if let Some(task) = status_task {
        task.abort();
    }
    info!(target: "vanguard::client", "stopped");
    Ok(())
}
