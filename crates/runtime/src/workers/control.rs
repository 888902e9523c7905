//! Per-tick tactical control loop.
//!
//! Owns the [`TacticalEngine`] and the assignment map. Upstream
//! assignment submissions arrive as commands on the same channel as
//! status queries, so this worker is the single writer of the map and an
//! upstream override can never race an internal fallback retarget.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use vanguard_core::{
    AssignmentMap, CyclePlan, EntityId, Faction, InterruptState, Snapshot, TacticalEngine,
};

use crate::transport::Transport;

/// Commands accepted by the control worker.
pub enum Command {
    /// Replace/extend assignments: one pair per attacker, newest wins.
    SubmitAssignments { pairs: Vec<(EntityId, EntityId)> },
    /// Read-only diagnostics snapshot.
    QueryStatus { reply: oneshot::Sender<StatusReport> },
}

/// Pass-through diagnostics for log viewers. Serializable, derived
/// entirely from state this worker already owns; producing one mutates
/// nothing.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub snapshot_version: u64,
    pub ally_count: usize,
    pub enemy_count: usize,
    pub connected: bool,
    pub active_assignments: usize,
    pub active_interrupts: Vec<(EntityId, InterruptState)>,
    pub cycles_completed: u64,
}

pub struct ControlWorker<T: Transport> {
    engine: TacticalEngine,
    assignments: AssignmentMap,
    transport: Arc<T>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    command_rx: mpsc::Receiver<Command>,
    tick_interval: Duration,
    shutdown: watch::Receiver<bool>,
    cycles: u64,
}

impl<T: Transport> ControlWorker<T> {
    pub fn new(
        engine: TacticalEngine,
        transport: Arc<T>,
        snapshot_rx: watch::Receiver<Arc<Snapshot>>,
        command_rx: mpsc::Receiver<Command>,
        tick_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            assignments: AssignmentMap::new(),
            transport,
            snapshot_rx,
            command_rx,
            tick_interval,
            shutdown,
            cycles: 0,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_cycle().await,
                Some(cmd) = self.command_rx.recv() => self.handle_command(cmd),
                changed = self.shutdown.changed() => {
                    // A closed channel means the controller is gone and no
                    // stop signal can ever arrive.
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!(target: "vanguard::control", "control worker stopping");
                        break;
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SubmitAssignments { pairs } => {
                debug!(target: "vanguard::control", count = pairs.len(), "assignments received");
                for (attacker, target) in pairs {
                    self.assignments.insert(attacker, target);
                }
            }
            Command::QueryStatus { reply } => {
                if reply.send(self.status()).is_err() {
                    debug!(target: "vanguard::control", "status reply channel closed");
                }
            }
        }
    }

    fn status(&self) -> StatusReport {
        let snapshot = self.snapshot_rx.borrow().clone();
        StatusReport {
            snapshot_version: snapshot.version,
            ally_count: snapshot.count(Faction::Ally),
            enemy_count: snapshot.count(Faction::Enemy),
            connected: self.transport.is_connected(),
            active_assignments: self.assignments.len(),
            active_interrupts: self.engine.active_interrupts(),
            cycles_completed: self.cycles,
        }
    }

    /// One control cycle over the latest published snapshot. Runs to
    /// completion even when the transport is failing; a cycle that
    /// cannot dispatch still advances interrupt state deterministically.
    async fn run_cycle(&mut self) {
        let snapshot = self.snapshot_rx.borrow().clone();
        if snapshot.version == 0 {
            // Nothing observed yet; nothing to command.
            return;
        }

        let plan = self.engine.plan_cycle(&snapshot, &mut self.assignments);
        self.cycles += 1;
        if plan.is_empty() {
            return;
        }
        self.dispatch(plan).await;
    }

    async fn dispatch(&mut self, plan: CyclePlan) {
        for attack in &plan.attacks {
            if let Err(error) = self.transport.attack(attack.attacker, attack.target).await {
                warn!(
                    target: "vanguard::control",
                    attacker = %attack.attacker,
                    target = %attack.target,
                    %error,
                    "attack dispatch failed"
                );
            }
        }
        for movement in &plan.moves {
            if let Err(error) = self.transport.move_actor(movement).await {
                warn!(
                    target: "vanguard::control",
                    actor = %movement.actor,
                    %error,
                    "move dispatch failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vanguard_core::{EngineConfig, MoveOrder, ObservedActor, UnitCatalog};

    use crate::error::TransportError;

    struct IdleTransport;

    #[async_trait]
    impl Transport for IdleTransport {
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

    #[tokio::test(start_paused = true)]
    async fn worker_exits_when_the_shutdown_sender_is_dropped() {
        let engine = TacticalEngine::new(
            Arc::new(UnitCatalog::standard()),
            EngineConfig::default(),
        );
        let (_snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::default()));
        let (_command_tx, command_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = ControlWorker::new(
            engine,
            Arc::new(IdleTransport),
            snapshot_rx,
            command_rx,
            Duration::from_millis(100),
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
