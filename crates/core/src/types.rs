//! Primitive identifiers and measures shared across the tactical core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for any entity observed in the engine.
///
/// Identity is assigned by the game engine and stable for the lifetime of
/// the unit; the core never mints ids of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete grid position expressed in map cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, used for coarse range and threat checks.
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Euclidean distance, used for precise engagement-radius checks.
    pub fn euclidean(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx.hypot(dy)
    }

    /// Offset from `self` toward `other` as a float vector.
    pub fn delta_to(self, other: Self) -> glam::Vec2 {
        glam::Vec2::new((other.x - self.x) as f32, (other.y - self.y) as f32)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which side an observed entity belongs to, relative to the controlled
/// player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Ally,
    Enemy,
    Neutral,
}

impl Faction {
    /// True if `other` is a legitimate attack target for this faction.
    pub fn is_hostile_to(self, other: Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Ally, Faction::Enemy) | (Faction::Enemy, Faction::Ally)
        )
    }
}

/// Hit-point meter tracked per entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthMeter {
    pub current: u32,
    pub maximum: u32,
}

impl HealthMeter {
    pub fn new(current: u32, maximum: u32) -> Self {
        Self { current, maximum }
    }

    /// Health fraction in `[0, 1]`. A unit with an unknown maximum is
    /// treated as healthy rather than dying.
    pub fn ratio(self) -> f32 {
        if self.maximum == 0 {
            return 1.0;
        }
        self.current as f32 / self.maximum as f32
    }
}

/// Cardinal movement direction understood by the engine's move command.
/// Displays as the lowercase wire label (`north`, `south`, ...).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum CompassDir {
    North,
    South,
    East,
    West,
}

impl CompassDir {
    pub fn opposite(self) -> Self {
        match self {
            CompassDir::North => CompassDir::South,
            CompassDir::South => CompassDir::North,
            CompassDir::East => CompassDir::West,
            CompassDir::West => CompassDir::East,
        }
    }

    /// Collapse a force vector onto the dominant axis. Returns `None` when
    /// both components sit inside the dead zone, so callers can skip the
    /// move entirely instead of jittering in place.
    ///
    /// Positive `y` points south, matching the engine's screen-space grid.
    pub fn from_vec(force: glam::Vec2, dead_zone: f32) -> Option<Self> {
        if force.x.abs() < dead_zone && force.y.abs() < dead_zone {
            return None;
        }
        if force.x.abs() >= force.y.abs() {
            Some(if force.x > 0.0 {
                CompassDir::East
            } else {
                CompassDir::West
            })
        } else {
            Some(if force.y > 0.0 {
                CompassDir::South
            } else {
                CompassDir::North
            })
        }
    }

    /// Engine wire label for move commands.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_and_euclidean_agree_on_axes() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 0);
        assert_eq!(a.manhattan(b), 3);
        assert!((a.euclidean(b) - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn hostility_is_symmetric_and_excludes_neutral() {
        assert!(Faction::Ally.is_hostile_to(Faction::Enemy));
        assert!(Faction::Enemy.is_hostile_to(Faction::Ally));
        assert!(!Faction::Ally.is_hostile_to(Faction::Neutral));
        assert!(!Faction::Ally.is_hostile_to(Faction::Ally));
    }

    #[test]
    fn zero_maximum_health_reads_as_full() {
        assert_eq!(HealthMeter::new(50, 0).ratio(), 1.0);
        assert_eq!(HealthMeter::new(25, 100).ratio(), 0.25);
    }

    #[test]
    fn compass_wire_labels_are_lowercase() {
        assert_eq!(CompassDir::North.as_str(), "north");
        assert_eq!(CompassDir::South.as_str(), "south");
        assert_eq!(CompassDir::West.to_string(), "west");
    }

    #[test]
    fn compass_picks_dominant_axis() {
        let v = glam::Vec2::new(2.0, -0.5);
        assert_eq!(CompassDir::from_vec(v, 0.1), Some(CompassDir::East));
        let v = glam::Vec2::new(0.2, 3.0);
        assert_eq!(CompassDir::from_vec(v, 0.1), Some(CompassDir::South));
        assert_eq!(CompassDir::from_vec(glam::Vec2::ZERO, 0.1), None);
    }
}
