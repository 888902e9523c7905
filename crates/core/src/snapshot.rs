//! Immutable point-in-time view of the battlefield.
//!
//! A [`Snapshot`] is built once per refresh from raw engine observations,
//! then shared read-only with every downstream consumer for the cycle.
//! Entities are keyed in a `BTreeMap` so two snapshots built from the same
//! observations compare equal regardless of engine response ordering.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{UnitCatalog, UnitCategory, UnitCode};
use crate::config::ThreatConfig;
use crate::types::{EntityId, Faction, HealthMeter, Position};

/// One unit as tracked by the tactical core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TacticalEntity {
    pub id: EntityId,
    pub faction: Faction,
    pub code: UnitCode,
    pub category: UnitCategory,
    pub position: Position,
    pub health: HealthMeter,
    /// Pressure this unit is under from nearby hostiles; derived at
    /// snapshot build time, zero when nothing threatens it.
    pub threat: f32,
}

impl TacticalEntity {
    pub fn health_ratio(&self) -> f32 {
        self.health.ratio()
    }
}

/// A raw engine observation before normalization.
#[derive(Clone, Debug)]
pub struct ObservedActor {
    pub id: EntityId,
    pub type_name: String,
    pub faction: Faction,
    pub position: Position,
    pub hp: Option<u32>,
    pub max_hp: Option<u32>,
}

/// Versioned, immutable battlefield state. Published behind an `Arc`;
/// never mutated after [`SnapshotBuilder::build`] returns.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    entities: BTreeMap<EntityId, TacticalEntity>,
}

impl Snapshot {
    pub fn get(&self, id: EntityId) -> Option<&TacticalEntity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TacticalEntity> {
        self.entities.values()
    }

    pub fn faction(&self, faction: Faction) -> impl Iterator<Item = &TacticalEntity> {
        self.iter().filter(move |e| e.faction == faction)
    }

    pub fn allies(&self) -> impl Iterator<Item = &TacticalEntity> {
        self.faction(Faction::Ally)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &TacticalEntity> {
        self.faction(Faction::Enemy)
    }

    /// Hostiles as seen from `faction`.
    pub fn hostiles_of(&self, faction: Faction) -> impl Iterator<Item = &TacticalEntity> {
        self.iter().filter(move |e| faction.is_hostile_to(e.faction))
    }

    pub fn count(&self, faction: Faction) -> usize {
        self.faction(faction).count()
    }

    /// Nearest hostile to `position` (Euclidean metric) within
    /// `max_range`, with deterministic tie-breaking by id.
    pub fn nearest_hostile(
        &self,
        faction: Faction,
        position: Position,
        max_range: f32,
    ) -> Option<&TacticalEntity> {
        self.hostiles_of(faction)
            .filter_map(|e| {
                let dist = position.euclidean(e.position);
                (dist <= max_range).then_some((dist, e))
            })
            .min_by(|(da, a), (db, b)| {
                da.partial_cmp(db)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            })
            .map(|(_, e)| e)
    }
}

/// Accumulates observations for one refresh and seals them into a
/// [`Snapshot`].
pub struct SnapshotBuilder {
    catalog: Arc<UnitCatalog>,
    threat: ThreatConfig,
    version: u64,
    entities: BTreeMap<EntityId, TacticalEntity>,
}

impl SnapshotBuilder {
    pub fn new(catalog: Arc<UnitCatalog>, threat: ThreatConfig, version: u64) -> Self {
        Self {
            catalog,
            threat,
            version,
            entities: BTreeMap::new(),
        }
    }

    /// Normalize and admit one observation. Marker entities on the ignore
    /// list are dropped; observations without a usable position are
    /// rejected upstream at decode time.
    pub fn observe(&mut self, actor: ObservedActor) {
        let code = self.catalog.normalize(&actor.type_name);
        if self.catalog.is_ignored(&code) {
            return;
        }
        let category = self.catalog.category(&code);
        let health = match (actor.hp, actor.max_hp) {
            (Some(hp), Some(max)) => HealthMeter::new(hp, max),
            _ => HealthMeter::default(),
        };
        self.entities.insert(
            actor.id,
            TacticalEntity {
                id: actor.id,
                faction: actor.faction,
                code,
                category,
                position: actor.position,
                health,
                threat: 0.0,
            },
        );
    }

    /// Re-admit an entity carried over from the previous snapshot (missing
    /// from this refresh but still inside its eviction grace window).
    pub fn carry(&mut self, entity: TacticalEntity) {
        self.entities.entry(entity.id).or_insert(entity);
    }

    /// Seal the snapshot: derive threat ratings, then freeze.
    pub fn build(mut self) -> Snapshot {
        let ratings: Vec<(EntityId, f32)> = self
            .entities
            .values()
            .map(|e| (e.id, self.threat_rating(e)))
            .collect();
        for (id, rating) in ratings {
            if let Some(e) = self.entities.get_mut(&id) {
                e.threat = rating;
            }
        }
        Snapshot {
            version: self.version,
            entities: self.entities,
        }
    }

    /// Pressure on one unit: sum of `weight / max(1, manhattan)` over
    /// hostiles within the threat radius. Artillery weighs heavier
    /// universally, anti-tank infantry weighs heavier against vehicles.
    fn threat_rating(&self, subject: &TacticalEntity) -> f32 {
        let cfg = &self.threat;
        let mut rating = 0.0;
        for other in self.entities.values() {
            if !subject.faction.is_hostile_to(other.faction) {
                continue;
            }
            let dist = subject.position.manhattan(other.position);
            if dist > cfg.radius {
                continue;
            }
            let weight = match other.category {
                UnitCategory::Artillery => cfg.artillery_weight,
                UnitCategory::AntiTankInfantry if subject.category.is_vehicle() => {
                    cfg.anti_tank_weight
                }
                _ => cfg.base_weight,
            };
            rating += weight / (dist.max(1) as f32);
        }
        rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThreatConfig;

    fn observed(id: u32, name: &str, faction: Faction, x: i32, y: i32) -> ObservedActor {
        ObservedActor {
            id: EntityId(id),
            type_name: name.to_string(),
            faction,
            position: Position::new(x, y),
            hp: Some(100),
            max_hp: Some(100),
        }
    }

    fn builder(version: u64) -> SnapshotBuilder {
        SnapshotBuilder::new(
            Arc::new(UnitCatalog::standard()),
            ThreatConfig::default(),
            version,
        )
    }

    #[test]
    fn identical_observations_build_equal_snapshots_in_any_order() {
        let mut a = builder(1);
        a.observe(observed(1, "3tnk", Faction::Ally, 0, 0));
        a.observe(observed(2, "e1", Faction::Enemy, 5, 5));

        let mut b = builder(1);
        b.observe(observed(2, "e1", Faction::Enemy, 5, 5));
        b.observe(observed(1, "3tnk", Faction::Ally, 0, 0));

        assert_eq!(a.build(), b.build());
    }

    #[test]
    fn marker_entities_never_enter_the_snapshot() {
        let mut b = builder(1);
        b.observe(observed(1, "mpspawn", Faction::Neutral, 0, 0));
        b.observe(observed(2, "camera", Faction::Ally, 0, 0));
        b.observe(observed(3, "3tnk", Faction::Ally, 0, 0));
        let snap = b.build();
        assert_eq!(snap.iter().count(), 1);
        assert!(snap.contains(EntityId(3)));
    }

    #[test]
    fn threat_weighs_artillery_and_anti_tank() {
        let mut b = builder(1);
        b.observe(observed(1, "3tnk", Faction::Ally, 0, 0));
        b.observe(observed(2, "e3", Faction::Enemy, 2, 0));
        b.observe(observed(3, "v2rl", Faction::Enemy, 4, 0));
        let snap = b.build();

        let tank = snap.get(EntityId(1)).unwrap();
        // e3 vs vehicle: 20/2, v2rl: 15/4
        assert!((tank.threat - (20.0 / 2.0 + 15.0 / 4.0)).abs() < 1e-5);

        // The rocket soldier feels pressure from the tank back.
        let e3 = snap.get(EntityId(2)).unwrap();
        assert!(e3.threat > 0.0);
    }

    #[test]
    fn nearest_hostile_breaks_distance_ties_by_id() {
        let mut b = builder(1);
        b.observe(observed(1, "3tnk", Faction::Ally, 0, 0));
        b.observe(observed(9, "e1", Faction::Enemy, 3, 0));
        b.observe(observed(4, "e1", Faction::Enemy, 0, 3));
        let snap = b.build();

        let found = snap
            .nearest_hostile(Faction::Ally, Position::ORIGIN, 10.0)
            .unwrap();
        assert_eq!(found.id, EntityId(4));
    }

    #[test]
    fn carry_does_not_overwrite_fresh_observations() {
        let mut b = builder(2);
        b.observe(observed(1, "3tnk", Faction::Ally, 5, 5));
        let stale = TacticalEntity {
            id: EntityId(1),
            faction: Faction::Ally,
            code: UnitCode::new("3tnk"),
            category: UnitCategory::MainBattleTank,
            position: Position::ORIGIN,
            health: HealthMeter::new(10, 100),
            threat: 0.0,
        };
        b.carry(stale);
        let snap = b.build();
        assert_eq!(snap.get(EntityId(1)).unwrap().position, Position::new(5, 5));
    }
}
