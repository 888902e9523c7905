//! Potential-field movement computation.
//!
//! Each controlled unit is steered by the vector sum of an attraction
//! toward its assigned target, repulsion from nearby allies (formation
//! keeping), and repulsion from hostile static defenses. The resultant is
//! clamped and collapsed onto the engine's four-way move command.
//!
//! Everything here is a pure function over one snapshot; coefficients come
//! exclusively from [`FieldConfig`].

use std::collections::HashMap;

use glam::Vec2;

use crate::catalog::{UnitCatalog, UnitCategory};
use crate::config::FieldConfig;
use crate::orders::{AttackOrder, MoveKind, MoveOrder};
use crate::snapshot::{Snapshot, TacticalEntity};
use crate::types::{CompassDir, EntityId, Position};

/// Coarse spatial bucketing of allied units, so the ally-repulsion term
/// scans a 3x3 cell neighborhood instead of the whole army.
struct SpatialGrid<'a> {
    cell_size: i32,
    cells: HashMap<(i32, i32), Vec<&'a TacticalEntity>>,
}

impl<'a> SpatialGrid<'a> {
    fn build(units: &[&'a TacticalEntity], cell_size: i32) -> Self {
        let mut cells: HashMap<(i32, i32), Vec<&TacticalEntity>> = HashMap::new();
        for unit in units {
            cells
                .entry(Self::key(unit.position, cell_size))
                .or_default()
                .push(unit);
        }
        Self { cell_size, cells }
    }

    fn key(pos: Position, cell_size: i32) -> (i32, i32) {
        (pos.x.div_euclid(cell_size), pos.y.div_euclid(cell_size))
    }

    fn neighbors(&self, pos: Position) -> impl Iterator<Item = &&'a TacticalEntity> {
        let (cx, cy) = Self::key(pos, self.cell_size);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
            })
        })
    }
}

/// Compute one movement order per unit in `units` whose resultant force
/// escapes the dead zone. Units appearing in `orders` are attracted
/// toward their target; every unit is repelled by close allies and
/// hostile static defenses.
pub fn compute_moves(
    snapshot: &Snapshot,
    orders: &[AttackOrder],
    units: &[EntityId],
    catalog: &UnitCatalog,
    config: &FieldConfig,
) -> Vec<MoveOrder> {
    let targets: HashMap<EntityId, EntityId> =
        orders.iter().map(|o| (o.attacker, o.target)).collect();

    let mobile: Vec<&TacticalEntity> = units
        .iter()
        .filter_map(|id| snapshot.get(*id))
        .filter(|e| e.category.is_mobile())
        .collect();
    let grid = SpatialGrid::build(&mobile, config.cell_size);

    let obstacles: Vec<&TacticalEntity> = snapshot
        .iter()
        .filter(|e| e.category == UnitCategory::Defense)
        .collect();

    let mut moves = Vec::new();
    for &me in &mobile {
        let mut force = Vec2::ZERO;

        if let Some(target) = targets.get(&me.id).and_then(|tid| snapshot.get(*tid)) {
            force += attraction(me, target, catalog, config);
        }

        for &other in grid.neighbors(me.position) {
            if other.id != me.id {
                force += separation(me, other, config);
            }
        }

        for &obstacle in &obstacles {
            if me.faction.is_hostile_to(obstacle.faction) {
                force += obstacle_repulsion(me, obstacle, config);
            }
        }

        let force = force.clamp_length_max(config.max_step);
        if let Some(direction) = CompassDir::from_vec(force, config.dead_zone) {
            moves.push(MoveOrder {
                actor: me.id,
                direction,
                // Single-cell steps keep the micro smooth; the next cycle
                // re-evaluates from the new position.
                distance: 1,
                assault: me.category == UnitCategory::MainBattleTank,
                kind: MoveKind::Field,
            });
        }
    }
    moves
}

/// Pull toward the assigned target, linear in the distance beyond weapon
/// reach and capped. Inside reach the unit holds position and shoots.
fn attraction(
    me: &TacticalEntity,
    target: &TacticalEntity,
    catalog: &UnitCatalog,
    config: &FieldConfig,
) -> Vec2 {
    let dist = me.position.euclidean(target.position);
    let reach = catalog.engagement_range(&me.code);
    if dist <= reach {
        return Vec2::ZERO;
    }
    let magnitude = (config.attraction_gain * (dist - reach)).min(config.attraction_cap);
    me.position.delta_to(target.position).normalize_or_zero() * magnitude
}

/// Push away from a close ally, inverse-distance scaled. Perfectly
/// stacked units split along the x axis by id order so the tie resolves
/// the same way every cycle.
fn separation(me: &TacticalEntity, other: &TacticalEntity, config: &FieldConfig) -> Vec2 {
    let dist = me.position.euclidean(other.position);
    if dist >= config.separation_radius {
        return Vec2::ZERO;
    }
    let magnitude = config.separation_gain / (dist + 0.1);
    let away = other.position.delta_to(me.position);
    if away == Vec2::ZERO {
        let axis = if me.id < other.id { -Vec2::X } else { Vec2::X };
        return axis * magnitude;
    }
    away.normalize_or_zero() * magnitude
}

fn obstacle_repulsion(
    me: &TacticalEntity,
    obstacle: &TacticalEntity,
    config: &FieldConfig,
) -> Vec2 {
    let dist = me.position.euclidean(obstacle.position);
    if dist >= config.obstacle_radius {
        return Vec2::ZERO;
    }
    let magnitude = config.obstacle_gain / (dist + 0.1);
    obstacle
        .position
        .delta_to(me.position)
        .normalize_or_zero()
        * magnitude
}
