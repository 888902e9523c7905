//! Assignment validation and deterministic fallback retargeting.
//!
//! Runs once per cycle, after refresh and before any movement
//! computation. The guard is a pure function over one snapshot: given the
//! same snapshot and assignment set it always produces the same outcome.

use std::cmp::Ordering;

use crate::catalog::UnitCatalog;
use crate::config::GuardConfig;
use crate::orders::{AssignmentMap, AttackOrder, OrderOrigin};
use crate::snapshot::{Snapshot, TacticalEntity};
use crate::types::{EntityId, Faction};

/// Result of one guard pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuardOutcome {
    /// Validated (possibly retargeted) attack orders.
    pub orders: Vec<AttackOrder>,
    /// Attackers whose assignment was cleared: no valid target remained
    /// within reach. These units idle this cycle.
    pub cleared: Vec<EntityId>,
}

/// Validate every assignment against `snapshot`, rewriting or clearing
/// invalid ones in place.
///
/// Rules, in order:
/// - attacker gone from the snapshot: assignment dropped silently;
/// - target present and hostile: passed through unchanged;
/// - otherwise: retarget to the nearest hostile within the attacker's
///   fallback search radius, ties broken by lowest threat then lowest id;
/// - no qualifying hostile: assignment cleared, attacker idles.
pub fn resolve(
    snapshot: &Snapshot,
    assignments: &mut AssignmentMap,
    catalog: &UnitCatalog,
    config: &GuardConfig,
) -> GuardOutcome {
    let mut outcome = GuardOutcome::default();

    let attackers: Vec<EntityId> = assignments.keys().copied().collect();
    for attacker_id in attackers {
        let Some(attacker) = snapshot.get(attacker_id) else {
            // Attacker destroyed or out of view; nothing left to command.
            assignments.remove(&attacker_id);
            continue;
        };
        if attacker.faction != Faction::Ally {
            assignments.remove(&attacker_id);
            continue;
        }

        let target_id = assignments[&attacker_id];
        if target_is_valid(snapshot, attacker.faction, target_id) {
            outcome.orders.push(AttackOrder {
                attacker: attacker_id,
                target: target_id,
                origin: OrderOrigin::Upstream,
            });
            continue;
        }

        match fallback_target(snapshot, attacker, catalog, config) {
            Some(new_target) => {
                assignments.insert(attacker_id, new_target);
                outcome.orders.push(AttackOrder {
                    attacker: attacker_id,
                    target: new_target,
                    origin: OrderOrigin::Fallback,
                });
            }
            None => {
                assignments.remove(&attacker_id);
                outcome.cleared.push(attacker_id);
            }
        }
    }

    outcome
}

fn target_is_valid(snapshot: &Snapshot, attacker_faction: Faction, target: EntityId) -> bool {
    snapshot
        .get(target)
        .is_some_and(|t| attacker_faction.is_hostile_to(t.faction))
}

/// Nearest hostile within the attacker's fallback search radius.
/// Equidistant candidates are ordered by lowest threat rating, then
/// lowest id, so repeated runs over the same snapshot pick the same
/// target.
fn fallback_target(
    snapshot: &Snapshot,
    attacker: &TacticalEntity,
    catalog: &UnitCatalog,
    config: &GuardConfig,
) -> Option<EntityId> {
    let radius = catalog.engagement_range(&attacker.code) * config.fallback_search_multiplier;

    snapshot
        .hostiles_of(attacker.faction)
        .filter_map(|e| {
            let dist = attacker.position.euclidean(e.position);
            (dist <= radius).then_some((dist, e))
        })
        .min_by(|(da, a), (db, b)| {
            da.partial_cmp(db)
                .unwrap_or(Ordering::Equal)
                .then(
                    a.threat
                        .partial_cmp(&b.threat)
                        .unwrap_or(Ordering::Equal),
                )
                .then(a.id.cmp(&b.id))
        })
        .map(|(_, e)| e.id)
}
