//! Wire-level request/response structures for the engine socket protocol.
//!
//! One JSON object per line in each direction. Field names follow the
//! engine's camelCase convention; everything the core consumes is
//! converted into [`vanguard_core`] types immediately after decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vanguard_core::{EntityId, Faction, ObservedActor, Position};

pub const API_VERSION: &str = "1.0";

/// Envelope for every outbound request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub api_version: &'static str,
    pub request_id: u64,
    pub command: &'static str,
    pub params: Value,
    pub language: String,
}

/// Envelope for every inbound response. The engine omits `data` for
/// fire-and-forget commands and reports failures through `error`.
#[derive(Debug, Deserialize, Default)]
pub struct Response {
    #[serde(default)]
    pub data: Option<ResponseData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResponseData {
    #[serde(default)]
    pub actors: Vec<ActorRecord>,
}

/// One unit as reported by `query_actor`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRecord {
    pub id: u32,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub position: Option<WirePosition>,
    #[serde(default)]
    pub hp: Option<u32>,
    #[serde(rename = "maxHp", default)]
    pub max_hp: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WirePosition {
    pub x: i32,
    pub y: i32,
}

impl ActorRecord {
    /// Convert to a core observation. Records without a position are
    /// dropped: the engine only omits it for units that are not really on
    /// the map (fogged, loading, dying).
    pub fn into_observed(self, faction: Faction) -> Option<ObservedActor> {
        let pos = self.position?;
        Some(ObservedActor {
            id: EntityId(self.id),
            type_name: self.type_name,
            faction,
            position: Position::new(pos.x, pos.y),
            hp: self.hp,
            max_hp: self.max_hp,
        })
    }
}

/// Engine-side labels for faction filters in `query_actor`.
#[derive(Debug, Clone)]
pub struct FactionLabels {
    pub ally: String,
    pub enemy: String,
    pub neutral: String,
}

impl Default for FactionLabels {
    fn default() -> Self {
        Self {
            ally: "ally".to_string(),
            enemy: "enemy".to_string(),
            neutral: "neutral".to_string(),
        }
    }
}

impl FactionLabels {
    pub fn label(&self, faction: Faction) -> &str {
        match faction {
            Faction::Ally => &self.ally,
            Faction::Enemy => &self.enemy,
            Faction::Neutral => &self.neutral,
        }
    }
}

pub fn query_params(faction_label: &str) -> Value {
    serde_json::json!({
        "targets": { "faction": faction_label, "range": "all" }
    })
}

pub fn attack_params(attacker: EntityId, target: EntityId) -> Value {
    serde_json::json!({
        "attackers": { "actorId": [attacker.0] },
        "targets": { "actorId": [target.0] }
    })
}

pub fn move_params(
    actor: EntityId,
    direction: &str,
    distance: u32,
    assault: bool,
    attack_move: bool,
) -> Value {
    serde_json::json!({
        "targets": { "actorId": [actor.0] },
        "direction": direction,
        "distance": distance,
        "isAttackMove": attack_move as u8,
        "isAssaultMove": assault as u8
    })
}
