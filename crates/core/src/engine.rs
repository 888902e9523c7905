//! Per-cycle tactical pipeline.
//!
//! [`TacticalEngine`] composes the guard, interrupt, and field stages in
//! fixed priority order and produces one [`CyclePlan`] per tick. It owns
//! no I/O and no clock: callers hand it a snapshot and the assignment map
//! and dispatch whatever comes back.

use std::sync::Arc;

use crate::catalog::UnitCatalog;
use crate::config::EngineConfig;
use crate::field;
use crate::guard::{self, GuardOutcome};
use crate::interrupt::{InterruptState, InterruptTracker};
use crate::orders::{AssignmentMap, CyclePlan};
use crate::snapshot::Snapshot;
use crate::types::EntityId;

pub struct TacticalEngine {
    config: EngineConfig,
    catalog: Arc<UnitCatalog>,
    interrupts: InterruptTracker,
}

impl TacticalEngine {
    pub fn new(catalog: Arc<UnitCatalog>, config: EngineConfig) -> Self {
        Self {
            config,
            catalog,
            interrupts: InterruptTracker::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<UnitCatalog> {
        &self.catalog
    }

    /// Interrupt state for one unit, for diagnostics.
    pub fn interrupt_state(&self, id: EntityId) -> InterruptState {
        self.interrupts.state_of(id)
    }

    /// All active interrupt states, for diagnostics.
    pub fn active_interrupts(&self) -> Vec<(EntityId, InterruptState)> {
        self.interrupts.active().collect()
    }

    /// Run one full cycle over `snapshot`.
    ///
    /// Stage order is fixed: guard validation/fallback first, then
    /// interrupt evaluation, then field computation for every allied
    /// mobile unit not claimed by an interrupt. Interrupt output strictly
    /// preempts the other stages for its units.
    ///
    /// `assignments` is rewritten in place by guard fallback and clearing;
    /// the caller is the single writer of the map between cycles.
    pub fn plan_cycle(&mut self, snapshot: &Snapshot, assignments: &mut AssignmentMap) -> CyclePlan {
        let GuardOutcome { orders, cleared: _ } =
            guard::resolve(snapshot, assignments, &self.catalog, &self.config.guard);

        let interrupts = self
            .interrupts
            .evaluate(snapshot, &self.catalog, &self.config.interrupt);

        let free_units: Vec<EntityId> = snapshot
            .allies()
            .filter(|a| !interrupts.overridden.contains(&a.id))
            .map(|a| a.id)
            .collect();

        let free_orders: Vec<_> = orders
            .iter()
            .filter(|o| !interrupts.overridden.contains(&o.attacker))
            .copied()
            .collect();

        let field_moves = field::compute_moves(
            snapshot,
            &free_orders,
            &free_units,
            &self.catalog,
            &self.config.field,
        );

        let mut plan = CyclePlan::default();
        plan.attacks.extend(interrupts.attacks);
        plan.attacks.extend(free_orders);
        plan.moves.extend(interrupts.moves);
        plan.moves.extend(field_moves);
        plan
    }
}
