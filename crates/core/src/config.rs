//! Tunable parameters for the tactical algorithms.
//!
//! Every coefficient that shapes emergent behavior lives here with a
//! documented default; nothing in the guard, field, or interrupt code
//! hard-codes a magic number. Defaults reproduce the stock unit set's
//! tuning.

use serde::{Deserialize, Serialize};

/// Threat-rating derivation parameters (applied at snapshot build time).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatConfig {
    /// Hostiles beyond this Manhattan distance contribute nothing.
    pub radius: u32,
    /// Weight of an ordinary hostile.
    pub base_weight: f32,
    /// Weight of hostile artillery (indirect fire threatens everything).
    pub artillery_weight: f32,
    /// Weight of anti-tank infantry against vehicle subjects.
    pub anti_tank_weight: f32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            radius: 15,
            base_weight: 10.0,
            artillery_weight: 15.0,
            anti_tank_weight: 20.0,
        }
    }
}

/// Decision-guard validation and fallback parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Fallback targets are searched within `engagement_range * multiplier`
    /// of the attacker. 1.0 keeps the search inside weapon reach.
    pub fallback_search_multiplier: f32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            fallback_search_multiplier: 1.0,
        }
    }
}

/// Potential-field force coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Attraction per cell of distance beyond weapon reach.
    pub attraction_gain: f32,
    /// Attraction magnitude ceiling.
    pub attraction_cap: f32,
    /// Allies inside this Euclidean radius repel each other.
    pub separation_radius: f32,
    /// Ally repulsion strength (inverse-distance scaled).
    pub separation_gain: f32,
    /// Hostile static defenses repel inside this radius.
    pub obstacle_radius: f32,
    /// Obstacle repulsion strength.
    pub obstacle_gain: f32,
    /// Resultant force is clamped to this magnitude before conversion.
    pub max_step: f32,
    /// Forces below this magnitude issue no command (anti-jitter).
    pub dead_zone: f32,
    /// Spatial-grid cell size for the neighbor lookup.
    pub cell_size: i32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            attraction_gain: 0.5,
            attraction_cap: 3.0,
            separation_radius: 2.0,
            separation_gain: 6.0,
            obstacle_radius: 5.0,
            obstacle_gain: 4.0,
            max_step: 3.0,
            dead_zone: 0.1,
            cell_size: 10,
        }
    }
}

/// Priority-interrupt thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterruptConfig {
    /// Fragile units below this health ratio start retreating.
    pub retreat_enter: f32,
    /// A retreating unit resumes normal behavior above this ratio.
    /// Must exceed `retreat_enter`; the gap is the hysteresis band.
    pub retreat_exit: f32,
    /// Retreat triggers only when a battle-line hostile sits within this
    /// Manhattan distance.
    pub threat_radius: u32,
    /// Step distance of a retreat move (larger than field micro steps so
    /// the unit actually disengages).
    pub retreat_step: u32,
    /// Stealth hostiles within this Euclidean range of a detector set
    /// forced focus.
    pub sensor_radius: f32,
    /// Hostile vehicles below this health ratio inside a tank's weapon
    /// reach get focus-fired down.
    pub harvest_ratio: f32,
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            retreat_enter: 0.35,
            retreat_exit: 0.50,
            threat_radius: 6,
            retreat_step: 3,
            sensor_radius: 8.0,
            harvest_ratio: 0.35,
        }
    }
}

/// Aggregate configuration for one tactical engine instance.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub threat: ThreatConfig,
    pub guard: GuardConfig,
    pub field: FieldConfig,
    pub interrupt: InterruptConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retreat_hysteresis_band_is_open_by_default() {
        let cfg = InterruptConfig::default();
        assert!(cfg.retreat_exit > cfg.retreat_enter);
    }
}
