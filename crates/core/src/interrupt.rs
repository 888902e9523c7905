//! Priority interrupt overrides.
//!
//! Interrupts sit above the guard and the field: when one fires for a
//! unit, that unit's command for the cycle comes from here and nothing
//! else. Two families exist:
//!
//! - **Retreating**: a fragile unit at low health disengages from the
//!   nearest battle-line threat. Entered below `retreat_enter`, left only
//!   above `retreat_exit`, so the unit cannot flicker at the threshold.
//! - **ForcedFocus**: fire concentration overriding the current target,
//!   either a detected stealth hostile or a nearly-dead hostile vehicle
//!   inside a tank's weapon reach (finish it before it repairs).
//!
//! Focus is re-evaluated from scratch every cycle; only the retreat state
//! carries history, and that history is the tracker's entire mutable
//! state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{UnitCatalog, UnitCategory};
use crate::config::InterruptConfig;
use crate::orders::{AttackOrder, MoveKind, MoveOrder, OrderOrigin};
use crate::snapshot::{Snapshot, TacticalEntity};
use crate::types::{CompassDir, EntityId};

/// Per-unit override state. Mutually exclusive; `Retreating` wins over
/// `ForcedFocus` when both would apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterruptState {
    #[default]
    Normal,
    Retreating,
    ForcedFocus(EntityId),
}

/// Everything the interrupt layer decided for one cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterruptOutcome {
    pub moves: Vec<MoveOrder>,
    pub attacks: Vec<AttackOrder>,
    /// Units under any active interrupt; the field engine and guard
    /// dispatch must skip these entirely this cycle.
    pub overridden: BTreeSet<EntityId>,
}

/// Tracks interrupt state across cycles.
#[derive(Clone, Debug, Default)]
pub struct InterruptTracker {
    states: BTreeMap<EntityId, InterruptState>,
}

impl InterruptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, id: EntityId) -> InterruptState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Currently active (non-normal) states, for diagnostics.
    pub fn active(&self) -> impl Iterator<Item = (EntityId, InterruptState)> + '_ {
        self.states
            .iter()
            .filter(|(_, s)| **s != InterruptState::Normal)
            .map(|(id, s)| (*id, *s))
    }

    /// Evaluate all triggers against `snapshot` and advance the state
    /// machine.
    pub fn evaluate(
        &mut self,
        snapshot: &Snapshot,
        catalog: &UnitCatalog,
        config: &InterruptConfig,
    ) -> InterruptOutcome {
        // Forget units that left the snapshot.
        self.states.retain(|id, _| snapshot.contains(*id));

        let detected_stealth = detected_stealth_hostiles(snapshot, catalog, config);

        let mut outcome = InterruptOutcome::default();
        for ally in snapshot.allies() {
            let state = self.next_state(ally, snapshot, catalog, config, &detected_stealth);
            if state == InterruptState::Normal {
                self.states.remove(&ally.id);
                continue;
            }
            self.states.insert(ally.id, state);
            outcome.overridden.insert(ally.id);

            match state {
                InterruptState::Retreating => {
                    if let Some(m) = retreat_move(ally, snapshot, config) {
                        outcome.moves.push(m);
                    }
                }
                InterruptState::ForcedFocus(target) => {
                    outcome.attacks.push(AttackOrder {
                        attacker: ally.id,
                        target,
                        origin: OrderOrigin::Interrupt,
                    });
                }
                InterruptState::Normal => unreachable!(),
            }
        }
        outcome
    }

    fn next_state(
        &self,
        ally: &TacticalEntity,
        snapshot: &Snapshot,
        catalog: &UnitCatalog,
        config: &InterruptConfig,
        detected_stealth: &[&TacticalEntity],
    ) -> InterruptState {
        // Retreat carries hysteresis: once in, only recovered health gets
        // the unit back out.
        let retreating_now = self.state_of(ally.id) == InterruptState::Retreating;
        if retreating_now {
            if ally.health_ratio() < config.retreat_exit {
                return InterruptState::Retreating;
            }
        } else if catalog.is_fragile(&ally.code)
            && ally.health_ratio() < config.retreat_enter
            && nearest_line_threat(ally, snapshot, config).is_some()
        {
            return InterruptState::Retreating;
        }

        // Stealth focus: any detected stealth hostile in this unit's
        // sensor reach pulls eligible shooters onto it.
        if ally.category.is_vehicle() || ally.category.is_infantry() {
            if let Some(target) = nearest_in_range(ally, detected_stealth, config.sensor_radius) {
                return InterruptState::ForcedFocus(target.id);
            }
        }

        // Harvest focus: tanks finish hostile vehicles that are nearly
        // dead and already inside weapon reach.
        if ally.category == UnitCategory::MainBattleTank {
            if let Some(target) = harvest_target(ally, snapshot, catalog, config) {
                return InterruptState::ForcedFocus(target);
            }
        }

        InterruptState::Normal
    }
}

/// Stealth hostiles currently revealed by one of our detector units.
fn detected_stealth_hostiles<'a>(
    snapshot: &'a Snapshot,
    catalog: &UnitCatalog,
    config: &InterruptConfig,
) -> Vec<&'a TacticalEntity> {
    let detectors: Vec<&TacticalEntity> = snapshot
        .allies()
        .filter(|a| catalog.is_detector(&a.code))
        .collect();
    if detectors.is_empty() {
        return Vec::new();
    }
    snapshot
        .enemies()
        .filter(|e| catalog.is_stealth(&e.code))
        .filter(|e| {
            detectors
                .iter()
                .any(|d| d.position.euclidean(e.position) <= config.sensor_radius)
        })
        .collect()
}

fn nearest_in_range<'a>(
    ally: &TacticalEntity,
    candidates: &[&'a TacticalEntity],
    range: f32,
) -> Option<&'a TacticalEntity> {
    candidates
        .iter()
        .filter_map(|e| {
            let dist = ally.position.euclidean(e.position);
            (dist <= range).then_some((dist, *e))
        })
        .min_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        })
        .map(|(_, e)| e)
}

/// Nearest hostile battle tank within the retreat threat radius. Lesser
/// units do not trigger disengagement; fleeing from rifle infantry would
/// concede the field for nothing.
fn nearest_line_threat<'a>(
    ally: &TacticalEntity,
    snapshot: &'a Snapshot,
    config: &InterruptConfig,
) -> Option<&'a TacticalEntity> {
    snapshot
        .hostiles_of(ally.faction)
        .filter(|e| e.category == UnitCategory::MainBattleTank)
        .filter_map(|e| {
            let dist = ally.position.manhattan(e.position);
            (dist <= config.threat_radius).then_some((dist, e))
        })
        .min_by(|(da, a), (db, b)| da.cmp(db).then(a.id.cmp(&b.id)))
        .map(|(_, e)| e)
}

/// Move directly away from the nearest line threat. No move if no threat
/// is in radius (the unit is retreating but already safe).
fn retreat_move(
    ally: &TacticalEntity,
    snapshot: &Snapshot,
    config: &InterruptConfig,
) -> Option<MoveOrder> {
    let threat = nearest_line_threat(ally, snapshot, config)?;
    let toward = ally.position.delta_to(threat.position);
    let direction = CompassDir::from_vec(toward, 0.0)?.opposite();
    Some(MoveOrder {
        actor: ally.id,
        direction,
        distance: config.retreat_step,
        assault: false,
        kind: MoveKind::Retreat,
    })
}

/// Lowest-health hostile vehicle below the harvest ratio inside the
/// tank's weapon reach; ties by distance, then id.
fn harvest_target(
    ally: &TacticalEntity,
    snapshot: &Snapshot,
    catalog: &UnitCatalog,
    config: &InterruptConfig,
) -> Option<EntityId> {
    let reach = catalog.engagement_range(&ally.code);
    snapshot
        .hostiles_of(ally.faction)
        .filter(|e| e.category.is_vehicle() && e.health_ratio() < config.harvest_ratio)
        .filter_map(|e| {
            let dist = ally.position.euclidean(e.position);
            (dist <= reach).then_some((e.health.current, dist, e))
        })
        .min_by(|(ha, da, a), (hb, db, b)| {
            ha.cmp(hb)
                .then(da.partial_cmp(db).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.id.cmp(&b.id))
        })
        .map(|(_, _, e)| e.id)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ThreatConfig;
    use crate::snapshot::{ObservedActor, SnapshotBuilder};
    use crate::types::{Faction, Position};

    fn snapshot(actors: &[(u32, &str, Faction, i32, i32, u32)]) -> Snapshot {
        let mut b = SnapshotBuilder::new(
            Arc::new(UnitCatalog::standard()),
            ThreatConfig::default(),
            1,
        );
        for &(id, name, faction, x, y, hp) in actors {
            b.observe(ObservedActor {
                id: EntityId(id),
                type_name: name.to_string(),
                faction,
                position: Position::new(x, y),
                hp: Some(hp),
                max_hp: Some(100),
            });
        }
        b.build()
    }

    fn evaluate(tracker: &mut InterruptTracker, snap: &Snapshot) -> InterruptOutcome {
        tracker.evaluate(snap, &UnitCatalog::standard(), &InterruptConfig::default())
    }

    #[test]
    fn wounded_fragile_unit_retreats_away_from_threat() {
        // v2rl at 30% with a heavy tank 4 cells east.
        let snap = snapshot(&[
            (1, "v2rl", Faction::Ally, 0, 0, 30),
            (2, "3tnk", Faction::Enemy, 4, 0, 100),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);

        assert_eq!(tracker.state_of(EntityId(1)), InterruptState::Retreating);
        assert_eq!(out.moves.len(), 1);
        let m = &out.moves[0];
        assert_eq!(m.direction, CompassDir::West);
        assert_eq!(m.distance, 3);
        assert!(!m.assault);
        assert_eq!(m.kind, MoveKind::Retreat);
        assert!(out.overridden.contains(&EntityId(1)));
    }

    #[test]
    fn sturdy_unit_at_low_health_does_not_retreat() {
        let snap = snapshot(&[
            (1, "4tnk", Faction::Ally, 0, 0, 20),
            (2, "3tnk", Faction::Enemy, 4, 0, 100),
        ]);
        let mut tracker = InterruptTracker::new();
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(1)), InterruptState::Normal);
    }

    #[test]
    fn retreat_holds_through_the_hysteresis_band() {
        let threat = (2, "3tnk", Faction::Enemy, 4, 0, 100);
        let mut tracker = InterruptTracker::new();

        let snap = snapshot(&[(1, "v2rl", Faction::Ally, 0, 0, 30), threat]);
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(1)), InterruptState::Retreating);

        // Recovered to 45%: above enter, below exit. Still retreating.
        let snap = snapshot(&[(1, "v2rl", Faction::Ally, 0, 0, 45), threat]);
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(1)), InterruptState::Retreating);

        // Recovered past the exit threshold: back to normal.
        let snap = snapshot(&[(1, "v2rl", Faction::Ally, 0, 0, 60), threat]);
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(1)), InterruptState::Normal);
    }

    #[test]
    fn detected_stealth_hostile_forces_focus() {
        // Dog reveals the spy; the nearby flak truck is pulled onto it.
        let snap = snapshot(&[
            (1, "dog", Faction::Ally, 0, 0, 100),
            (2, "ftrk", Faction::Ally, 2, 0, 100),
            (3, "spy", Faction::Enemy, 4, 0, 100),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);

        assert_eq!(
            tracker.state_of(EntityId(2)),
            InterruptState::ForcedFocus(EntityId(3))
        );
        assert!(out.attacks.iter().any(|a| {
            a.attacker == EntityId(2)
                && a.target == EntityId(3)
                && a.origin == OrderOrigin::Interrupt
        }));
    }

    #[test]
    fn undetected_stealth_hostile_is_ignored() {
        // No detector anywhere: the spy stays invisible to the override.
        let snap = snapshot(&[
            (2, "ftrk", Faction::Ally, 2, 0, 100),
            (3, "spy", Faction::Enemy, 4, 0, 100),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);
        assert!(out.attacks.is_empty());
        assert_eq!(tracker.state_of(EntityId(2)), InterruptState::Normal);
    }

    #[test]
    fn focus_clears_when_stealth_target_leaves_range() {
        let mut tracker = InterruptTracker::new();
        let snap = snapshot(&[
            (1, "dog", Faction::Ally, 0, 0, 100),
            (2, "ftrk", Faction::Ally, 2, 0, 100),
            (3, "spy", Faction::Enemy, 4, 0, 100),
        ]);
        evaluate(&mut tracker, &snap);

        let snap = snapshot(&[
            (1, "dog", Faction::Ally, 0, 0, 100),
            (2, "ftrk", Faction::Ally, 2, 0, 100),
            (3, "spy", Faction::Enemy, 40, 0, 100),
        ]);
        let out = evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(2)), InterruptState::Normal);
        assert!(out.attacks.is_empty());
    }

    #[test]
    fn tank_harvests_the_weakest_vehicle_in_reach() {
        let snap = snapshot(&[
            (1, "3tnk", Faction::Ally, 0, 0, 100),
            (2, "2tnk", Faction::Enemy, 3, 0, 30),
            (3, "2tnk", Faction::Enemy, 2, 0, 20),
            // Below ratio but out of reach.
            (4, "2tnk", Faction::Enemy, 20, 0, 10),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);
        assert_eq!(
            tracker.state_of(EntityId(1)),
            InterruptState::ForcedFocus(EntityId(3))
        );
        assert_eq!(out.attacks.len(), 1);
        assert_eq!(out.attacks[0].target, EntityId(3));
    }

    #[test]
    fn healthy_vehicles_in_reach_are_not_harvested() {
        let snap = snapshot(&[
            (1, "3tnk", Faction::Ally, 0, 0, 100),
            (2, "2tnk", Faction::Enemy, 3, 0, 80),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);
        assert!(out.attacks.is_empty());
    }

    #[test]
    fn retreat_takes_precedence_over_focus() {
        // Wounded flak truck next to a detected spy and a tank threat:
        // getting out alive beats shooting the spy.
        let snap = snapshot(&[
            (1, "dog", Faction::Ally, 0, 1, 100),
            (2, "ftrk", Faction::Ally, 0, 0, 20),
            (3, "spy", Faction::Enemy, 3, 0, 100),
            (4, "3tnk", Faction::Enemy, 5, 0, 100),
        ]);
        let mut tracker = InterruptTracker::new();
        let out = evaluate(&mut tracker, &snap);
        assert_eq!(tracker.state_of(EntityId(2)), InterruptState::Retreating);
        assert!(out.attacks.iter().all(|a| a.attacker != EntityId(2)));
    }

    #[test]
    fn states_for_vanished_units_are_dropped() {
        let mut tracker = InterruptTracker::new();
        let snap = snapshot(&[
            (1, "v2rl", Faction::Ally, 0, 0, 30),
            (2, "3tnk", Faction::Enemy, 4, 0, 100),
        ]);
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.active().count(), 1);

        let snap = snapshot(&[(2, "3tnk", Faction::Enemy, 4, 0, 100)]);
        evaluate(&mut tracker, &snap);
        assert_eq!(tracker.active().count(), 0);
    }
}
