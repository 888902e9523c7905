//! High-level controller orchestrator.
//!
//! The controller owns the background workers, wires up the snapshot and
//! command channels, and exposes a builder-based API plus a cloneable
//! [`ControllerHandle`] for upstream collaborators. Global singletons are
//! deliberately absent: every dependency is injected, several controllers
//! can coexist, and shutdown is deterministic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use vanguard_core::{EngineConfig, EntityId, TacticalEngine, UnitCatalog};

use crate::error::{Result, RuntimeError};
use crate::manager::{EntityManager, ManagerConfig};
use crate::transport::Transport;
use crate::workers::{BackoffConfig, Command, ConnectionWorker, ControlWorker, RefreshWorker, StatusReport};

/// Timing and channel configuration for one controller instance.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Control loop tick. Sub-second: this is real-time micro, not the
    /// slow strategic cadence upstream.
    pub tick_interval: Duration,
    /// Snapshot refresh cadence.
    pub refresh_interval: Duration,
    pub command_buffer: usize,
    pub manager: ManagerConfig,
    pub backoff: BackoffConfig,
    pub engine: EngineConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            refresh_interval: Duration::from_millis(100),
            command_buffer: 32,
            manager: ManagerConfig::default(),
            backoff: BackoffConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Client-facing handle. Cheap to clone; all operations go through the
/// control worker's command channel.
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: mpsc::Sender<Command>,
}

impl ControllerHandle {
    /// Submit upstream attacker→target pairs. The sole external write
    /// into the assignment set; applied by the control worker before its
    /// next cycle.
    pub async fn submit_assignments(&self, pairs: Vec<(u32, u32)>) -> Result<()> {
        let pairs = pairs
            .into_iter()
            .map(|(a, t)| (EntityId(a), EntityId(t)))
            .collect();
        self.command_tx
            .send(Command::SubmitAssignments { pairs })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Read-only diagnostics pass-through.
    pub async fn status(&self) -> Result<StatusReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::QueryStatus { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }
}

/// Owns the worker tasks for one tactical engine instance.
pub struct Controller<T: Transport> {
    handle: ControllerHandle,
    transport: Arc<T>,
    shutdown_tx: watch::Sender<bool>,
    control_handle: JoinHandle<()>,
    refresh_handle: JoinHandle<()>,
    connection_handle: JoinHandle<()>,
}

impl<T: Transport> Controller<T> {
    pub fn builder(transport: T) -> ControllerBuilder<T> {
        ControllerBuilder::new(transport)
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    /// Stop all workers, then release the transport. Loop shutdown is
    /// awaited before the socket goes away so no command is sent on a
    /// closed connection.
    pub async fn shutdown(self) -> Result<()> {
        info!(target: "vanguard::controller", "shutting down");
        let _ = self.shutdown_tx.send(true);

        self.control_handle.await.map_err(RuntimeError::WorkerJoin)?;
        self.refresh_handle.await.map_err(RuntimeError::WorkerJoin)?;
        self.connection_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        drop(self.transport);
        info!(target: "vanguard::controller", "shutdown complete");
        Ok(())
    }
}

/// Builder for [`Controller`] with injected dependencies.
pub struct ControllerBuilder<T: Transport> {
    transport: T,
    config: ControllerConfig,
    catalog: Arc<UnitCatalog>,
}

impl<T: Transport> ControllerBuilder<T> {
    fn new(transport: T) -> Self {
        Self {
            transport,
            config: ControllerConfig::default(),
            catalog: Arc::new(UnitCatalog::standard()),
        }
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap in a different unit normalization table (other mods, other
    /// languages).
    pub fn catalog(mut self, catalog: UnitCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Spawn the workers and hand back the running controller.
    pub fn build(self) -> Controller<T> {
        let transport = Arc::new(self.transport);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer);

        let (manager, snapshot_rx) = EntityManager::new(
            transport.clone(),
            self.catalog.clone(),
            self.config.manager,
        );

        let engine = TacticalEngine::new(self.catalog, self.config.engine);

        let connection_worker = ConnectionWorker::new(
            transport.clone(),
            self.config.backoff,
            shutdown_rx.clone(),
        );
        let refresh_worker =
            RefreshWorker::new(manager, self.config.refresh_interval, shutdown_rx.clone());
        let control_worker = ControlWorker::new(
            engine,
            transport.clone(),
            snapshot_rx,
            command_rx,
            self.config.tick_interval,
            shutdown_rx,
        );

        let connection_handle = tokio::spawn(connection_worker.run());
        let refresh_handle = tokio::spawn(refresh_worker.run());
        let control_handle = tokio::spawn(control_worker.run());

        info!(target: "vanguard::controller", "controller started");
        Controller {
            handle: ControllerHandle { command_tx },
            transport,
            shutdown_tx,
            control_handle,
            refresh_handle,
            connection_handle,
        }
    }
}
