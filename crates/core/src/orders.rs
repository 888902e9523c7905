//! Order types flowing between the guard, interrupt, and field stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CompassDir, EntityId};

/// Attacker -> target pairings. At most one target per attacker; a newer
/// pairing for the same attacker supersedes the old one. Ordered map so
/// per-cycle processing is deterministic.
pub type AssignmentMap = BTreeMap<EntityId, EntityId>;

/// Where an attack order came from, for diagnostics and dispatch logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderOrigin {
    /// Upstream planner pairing, validated as-is.
    Upstream,
    /// Guard replaced an invalidated target.
    Fallback,
    /// Priority interrupt override.
    Interrupt,
}

/// A validated attack to dispatch this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub attacker: EntityId,
    pub target: EntityId,
    pub origin: OrderOrigin,
}

/// Why a movement command was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// Potential-field micro adjustment.
    Field,
    /// Interrupt-driven disengage; always a plain move, never assault.
    Retreat,
}

/// A movement to dispatch this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveOrder {
    pub actor: EntityId,
    pub direction: CompassDir,
    pub distance: u32,
    /// Crush-move flag for battle tanks under field control.
    pub assault: bool,
    pub kind: MoveKind,
}

/// Everything the control loop dispatches for one tick, already merged in
/// priority order (interrupt output wins per unit).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CyclePlan {
    pub attacks: Vec<AttackOrder>,
    pub moves: Vec<MoveOrder>,
}

impl CyclePlan {
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty() && self.moves.is_empty()
    }
}
