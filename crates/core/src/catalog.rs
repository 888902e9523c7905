//! Unit identity normalization and combat-role classification.
//!
//! The engine reports unit types as display names that may be localized,
//! so raw names are folded through an alias table into short standard
//! codes before anything downstream looks at them. The catalog also owns
//! the per-code combat profile (role, weapon reach, fragility, stealth and
//! detection flags) and the ignore list of non-combat marker entities.
//!
//! The catalog is plain immutable data injected at construction time;
//! callers with a different mod or language set supply their own table.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Standardized lowercase unit-type code (e.g. `3tnk`, `v2rl`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCode(String);

impl UnitCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combat role a unit code falls into. Drives force weighting, interrupt
/// eligibility, and fallback rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    /// Long reach, fragile, area damage.
    Artillery,
    /// High hit points, mid reach, the line of battle.
    MainBattleTank,
    /// Fast, fragile, anti-light-armor.
    LightVehicle,
    /// Cheap line infantry, damage sponges.
    AssaultInfantry,
    /// Low health, heavy armor damage; lethal to vehicles at close range.
    AntiTankInfantry,
    /// Static defensive structure; immobile, treated as an obstacle.
    Defense,
    /// Anything combat-capable that fits no other bucket.
    Other,
}

impl UnitCategory {
    /// True for categories that can receive movement commands.
    pub fn is_mobile(self) -> bool {
        !matches!(self, UnitCategory::Defense)
    }

    /// True for vehicle categories (crush-capable, soft to AT infantry).
    pub fn is_vehicle(self) -> bool {
        matches!(
            self,
            UnitCategory::Artillery | UnitCategory::MainBattleTank | UnitCategory::LightVehicle
        )
    }

    pub fn is_infantry(self) -> bool {
        matches!(
            self,
            UnitCategory::AssaultInfantry | UnitCategory::AntiTankInfantry
        )
    }
}

/// Combat profile attached to a standard code.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitProfile {
    pub code: UnitCode,
    pub category: UnitCategory,
    /// Weapon reach in cells (conservative value).
    pub engagement_range: f32,
    /// Fragile units trigger the retreat interrupt at low health.
    pub fragile: bool,
    /// Hidden from normal sensors; only detectors reveal it.
    pub stealth: bool,
    /// Can reveal stealth units within sensor range.
    pub detector: bool,
}

/// Immutable lookup table: raw engine names -> standard codes -> profiles.
#[derive(Clone, Debug)]
pub struct UnitCatalog {
    aliases: HashMap<String, UnitCode>,
    profiles: HashMap<UnitCode, UnitProfile>,
    ignored: HashSet<String>,
    default_range: f32,
}

/// One row of the builder table: (category, code, range, aliases).
struct CatalogRow {
    category: UnitCategory,
    code: &'static str,
    range: f32,
    fragile: bool,
    stealth: bool,
    detector: bool,
    aliases: &'static [&'static str],
}

fn row(
    category: UnitCategory,
    code: &'static str,
    range: f32,
    aliases: &'static [&'static str],
) -> CatalogRow {
    CatalogRow {
        category,
        code,
        range,
        fragile: false,
        stealth: false,
        detector: false,
        aliases,
    }
}

impl UnitCatalog {
    /// Catalog for the stock unit set. Ranges are conservative values in
    /// cells; aliases cover the localized display names the engine is known
    /// to emit alongside the internal codes.
    pub fn standard() -> Self {
        use UnitCategory::*;

        let mut rows = vec![
            row(Artillery, "v2rl", 10.0, &["v2 rocket launcher"]),
            row(Artillery, "arty", 9.0, &["artillery"]),
            row(MainBattleTank, "3tnk", 4.75, &["heavy tank"]),
            row(MainBattleTank, "4tnk", 4.75, &["mammoth tank"]),
            row(MainBattleTank, "2tnk", 4.75, &["medium tank"]),
            row(MainBattleTank, "ttnk", 4.0, &["tesla tank"]),
            row(MainBattleTank, "ctnk", 4.0, &["chrono tank"]),
            row(LightVehicle, "ftrk", 6.0, &["flak truck"]),
            row(LightVehicle, "1tnk", 4.0, &["light tank"]),
            row(LightVehicle, "jeep", 5.0, &["ranger"]),
            row(LightVehicle, "apc", 4.0, &["armored personnel carrier"]),
            row(AssaultInfantry, "e1", 5.0, &["rifle infantry"]),
            row(AssaultInfantry, "e2", 4.0, &["grenadier"]),
            row(AntiTankInfantry, "e3", 5.0, &["rocket soldier"]),
            row(AntiTankInfantry, "e4", 2.0, &["flamethrower"]),
            row(AntiTankInfantry, "shok", 3.0, &["shock trooper"]),
            row(Defense, "pbox", 5.0, &["pillbox"]),
            row(Defense, "hbox", 5.0, &["camo pillbox"]),
            row(Defense, "gun", 6.0, &["turret"]),
            row(Defense, "tsla", 7.0, &["tesla coil"]),
            row(Defense, "ftur", 3.0, &["flame tower"]),
            row(Other, "spy", 0.0, &["spy"]),
            row(Other, "stnk", 5.0, &["phase transport"]),
            row(Other, "dog", 1.0, &["attack dog"]),
        ];

        // Flags that do not fit the positional row constructor.
        for r in &mut rows {
            match r.code {
                // Fragile back-line units eligible for the retreat interrupt.
                "v2rl" | "arty" | "ftrk" | "1tnk" | "jeep" | "apc" => r.fragile = true,
                // Cloaked units that trigger forced focus when detected.
                "spy" | "stnk" => r.stealth = true,
                // Units that can reveal cloaked hostiles.
                "dog" | "hbox" => r.detector = true,
                _ => {}
            }
        }

        Self::from_rows(
            rows,
            // Non-combat marker entities the engine reports but which must
            // never enter the tactical state.
            ["mpspawn", "camera", "husk"],
            4.0,
        )
    }

    fn from_rows(
        rows: Vec<CatalogRow>,
        ignored: impl IntoIterator<Item = &'static str>,
        default_range: f32,
    ) -> Self {
        let mut aliases = HashMap::new();
        let mut profiles = HashMap::new();
        for r in rows {
            let code = UnitCode::new(r.code);
            aliases.insert(r.code.to_string(), code.clone());
            for alias in r.aliases {
                aliases.insert(alias.to_lowercase(), code.clone());
            }
            profiles.insert(
                code.clone(),
                UnitProfile {
                    code,
                    category: r.category,
                    engagement_range: r.range,
                    fragile: r.fragile,
                    stealth: r.stealth,
                    detector: r.detector,
                },
            );
        }
        Self {
            aliases,
            profiles,
            ignored: ignored.into_iter().map(str::to_owned).collect(),
            default_range,
        }
    }

    /// Fold a raw engine type name into a standard code. Unknown names pass
    /// through lowercased so new units degrade to `Other` instead of
    /// disappearing.
    pub fn normalize(&self, raw: &str) -> UnitCode {
        let lowered = raw.to_lowercase();
        self.aliases
            .get(&lowered)
            .cloned()
            .unwrap_or(UnitCode(lowered))
    }

    /// True if the code names a marker entity that must be dropped at
    /// ingest. Matches on containment: the engine suffixes some markers.
    pub fn is_ignored(&self, code: &UnitCode) -> bool {
        self.ignored.iter().any(|ig| code.as_str().contains(ig))
    }

    pub fn category(&self, code: &UnitCode) -> UnitCategory {
        self.profiles
            .get(code)
            .map(|p| p.category)
            .unwrap_or(UnitCategory::Other)
    }

    pub fn engagement_range(&self, code: &UnitCode) -> f32 {
        self.profiles
            .get(code)
            .map(|p| p.engagement_range)
            .unwrap_or(self.default_range)
    }

    pub fn is_fragile(&self, code: &UnitCode) -> bool {
        self.profiles.get(code).is_some_and(|p| p.fragile)
    }

    pub fn is_stealth(&self, code: &UnitCode) -> bool {
        self.profiles.get(code).is_some_and(|p| p.stealth)
    }

    pub fn is_detector(&self, code: &UnitCode) -> bool {
        self.profiles.get(code).is_some_and(|p| p.detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_aliases_and_case() {
        let catalog = UnitCatalog::standard();
        assert_eq!(catalog.normalize("Heavy Tank"), UnitCode::new("3tnk"));
        assert_eq!(catalog.normalize("3TNK"), UnitCode::new("3tnk"));
        assert_eq!(catalog.normalize("V2 Rocket Launcher"), UnitCode::new("v2rl"));
    }

    #[test]
    fn unknown_names_pass_through_lowercased() {
        let catalog = UnitCatalog::standard();
        let code = catalog.normalize("MysteryUnit");
        assert_eq!(code.as_str(), "mysteryunit");
        assert_eq!(catalog.category(&code), UnitCategory::Other);
        assert_eq!(catalog.engagement_range(&code), 4.0);
    }

    #[test]
    fn marker_entities_are_ignored_by_containment() {
        let catalog = UnitCatalog::standard();
        assert!(catalog.is_ignored(&UnitCode::new("mpspawn")));
        assert!(catalog.is_ignored(&UnitCode::new("3tnk.husk")));
        assert!(!catalog.is_ignored(&UnitCode::new("3tnk")));
    }

    #[test]
    fn combat_flags_cover_roles() {
        let catalog = UnitCatalog::standard();
        assert!(catalog.is_fragile(&UnitCode::new("v2rl")));
        assert!(!catalog.is_fragile(&UnitCode::new("4tnk")));
        assert!(catalog.is_stealth(&UnitCode::new("spy")));
        assert!(catalog.is_detector(&UnitCode::new("dog")));
        assert_eq!(
            catalog.category(&UnitCode::new("e3")),
            UnitCategory::AntiTankInfantry
        );
    }
}
