//! Weapon and chassis catalog entries, and the compositions built from them.

use serde::{Deserialize, Serialize};

use super::building_data::BuildingType;
use crate::math::{decimal_serde, Fixed};

/// Weapon a unit carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    /// Cheap rapid-fire gun, hits everything.
    Gatling,
    /// Ground-only artillery.
    Cannon,
    /// Anti-air missiles.
    Rocket,
    /// Sphenix special.
    Laser,
    /// Quadrumm special.
    Lightning,
    /// Trionic special.
    Plasma,
}

impl WeaponType {
    /// All weapons in build-menu order.
    pub const ALL: [Self; 6] = [
        Self::Gatling,
        Self::Cannon,
        Self::Rocket,
        Self::Laser,
        Self::Lightning,
        Self::Plasma,
    ];
}

/// Body a unit is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChassisType {
    /// Fast and light.
    Wheels,
    /// Sturdier, slower.
    Tracks,
    /// Flying; cannot hold zones.
    Aircraft,
    /// Sphenix special.
    HoverTracks,
    /// Trionic special.
    HoverWheels,
    /// Quadrumm special.
    Bipedal,
}

impl ChassisType {
    /// All chassis in build-menu order.
    pub const ALL: [Self; 6] = [
        Self::Wheels,
        Self::Tracks,
        Self::Aircraft,
        Self::HoverTracks,
        Self::HoverWheels,
        Self::Bipedal,
    ];
}

/// What a weapon is allowed to engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetClass {
    /// Buildings and non-aerial units.
    Ground,
    /// Aerial units only.
    Air,
    /// Anything hostile.
    Any,
}

impl TargetClass {
    /// Whether a target with the given airborne flag passes this filter.
    #[must_use]
    pub const fn permits(self, target_is_aerial: bool) -> bool {
        match self {
            Self::Ground => !target_is_aerial,
            Self::Air => target_is_aerial,
            Self::Any => true,
        }
    }
}

/// Weapon statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponData {
    /// Which weapon this entry describes.
    pub weapon: WeaponType,
    /// Display name.
    pub name: String,
    /// Damage per projectile.
    pub damage: u32,
    /// Target filter.
    pub target: TargetClass,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Engagement range in world units (inclusive).
    #[serde(with = "decimal_serde")]
    pub range: Fixed,
    /// Price added to the chassis cost.
    #[serde(default)]
    pub cost: i32,
    /// Building that must be owned before this weapon can be fitted.
    #[serde(default)]
    pub unlocked_by: Option<BuildingType>,
}

/// Chassis statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChassisData {
    /// Which chassis this entry describes.
    pub chassis: ChassisType,
    /// Display name.
    pub name: String,
    /// Hit points of a unit built on this chassis.
    pub armor: u32,
    /// World units moved per tick.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Base unit price.
    pub cost: i32,
    /// Building that must be owned before this chassis can be built.
    #[serde(default)]
    pub unlocked_by: Option<BuildingType>,
    /// Flying units ignore zones and are only hit by `Any` and `Air` weapons.
    #[serde(default)]
    pub aerial: bool,
}

/// A production order: one weapon on one chassis.
///
/// Immutable once queued; the cost is what was charged and what a
/// queue clear refunds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitComposition {
    /// Weapon fitted.
    pub weapon: WeaponType,
    /// Chassis used.
    pub chassis: ChassisType,
    /// Price charged when queued.
    pub cost: i32,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UnitComposition {
    /// Create an unnamed composition.
    #[must_use]
    pub const fn new(weapon: WeaponType, chassis: ChassisType, cost: i32) -> Self {
        Self {
            weapon,
            chassis,
            cost,
            name: None,
        }
    }

    /// Whether two compositions describe the same unit subtype.
    #[must_use]
    pub fn same_subtype(&self, other: &Self) -> bool {
        self.weapon == other.weapon && self.chassis == other.chassis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_class_filter() {
        assert!(TargetClass::Ground.permits(false));
        assert!(!TargetClass::Ground.permits(true));
        assert!(TargetClass::Air.permits(true));
        assert!(!TargetClass::Air.permits(false));
        assert!(TargetClass::Any.permits(true));
        assert!(TargetClass::Any.permits(false));
    }

    #[test]
    fn test_chassis_speed_reads_decimal() {
        let ron_str = r#"
            ChassisData(
                chassis: Tracks,
                name: "Tracks",
                armor: 70,
                speed: 1.5,
                cost: 75,
                unlocked_by: Some(TracksLab),
            )
        "#;
        let chassis: ChassisData = ron::from_str(ron_str).expect("Failed to parse RON");
        assert_eq!(chassis.speed, Fixed::from_num(1.5));
        assert!(!chassis.aerial);
    }

    #[test]
    fn test_same_subtype_ignores_cost_and_name() {
        let a = UnitComposition::new(WeaponType::Gatling, ChassisType::Wheels, 50);
        let mut b = UnitComposition::new(WeaponType::Gatling, ChassisType::Wheels, 999);
        b.name = Some("Scout".to_string());
        assert!(a.same_subtype(&b));
        let c = UnitComposition::new(WeaponType::Cannon, ChassisType::Wheels, 75);
        assert!(!a.same_subtype(&c));
    }
}
