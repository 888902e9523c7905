//! Pure tactical domain logic for the Vanguard micro-control engine.
//!
//! This crate holds everything that can be computed from an immutable
//! battlefield [`Snapshot`] without touching a socket or a clock:
//!
//! - [`catalog`] normalizes raw engine unit names into standard codes and
//!   classifies them into combat roles
//! - [`snapshot`] builds the versioned, order-independent entity state
//!   that every downstream stage reads from
//! - [`guard`] validates upstream target assignments and retargets or
//!   clears invalid ones deterministically
//! - [`field`] derives potential-field movement from attraction and
//!   repulsion forces
//! - [`interrupt`] implements the priority overrides (retreat, forced
//!   focus) that preempt everything else
//! - [`engine`] composes the stages into the fixed per-cycle pipeline
//!
//! The runtime crate owns the sockets, workers, and clocks and drives
//! [`engine::TacticalEngine`] once per tick.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod field;
pub mod guard;
pub mod interrupt;
pub mod orders;
pub mod snapshot;
pub mod types;

pub use catalog::{UnitCatalog, UnitCategory, UnitCode, UnitProfile};
pub use config::{EngineConfig, FieldConfig, GuardConfig, InterruptConfig, ThreatConfig};
pub use engine::TacticalEngine;
pub use guard::GuardOutcome;
pub use interrupt::{InterruptState, InterruptTracker};
pub use orders::{AssignmentMap, AttackOrder, CyclePlan, MoveKind, MoveOrder, OrderOrigin};
pub use snapshot::{ObservedActor, Snapshot, SnapshotBuilder, TacticalEntity};
pub use types::{CompassDir, EntityId, Faction, HealthMeter, Position};
