//! Building catalog entries.

use serde::{Deserialize, Serialize};

/// Every structure a side can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Mines an owned zone for money.
    Refinery,
    /// Produces units.
    Factory,
    /// Raises the unit cap.
    Depot,
    /// Unlocks turrets.
    Armory,
    /// Static defense.
    Turret,
    /// Unlocks tracked chassis.
    TracksLab,
    /// Unlocks cannons.
    CannonLab,
    /// Unlocks aircraft.
    AirLab,
    /// Unlocks heavy chassis.
    MechLab,
    /// Unlocks rockets.
    RocketLab,
    /// Unlocks energy weapons.
    TechLab,
}

impl BuildingType {
    /// All building types in build-menu order.
    pub const ALL: [Self; 11] = [
        Self::Refinery,
        Self::Factory,
        Self::Depot,
        Self::Armory,
        Self::Turret,
        Self::TracksLab,
        Self::CannonLab,
        Self::AirLab,
        Self::MechLab,
        Self::RocketLab,
        Self::TechLab,
    ];

    /// Resource-producing buildings keep a side alive and earn money.
    #[must_use]
    pub const fn is_resource_producer(self) -> bool {
        matches!(self, Self::Refinery)
    }

    /// Buildings that contribute to the unit cap.
    #[must_use]
    pub const fn provides_population(self) -> bool {
        matches!(self, Self::Depot)
    }
}

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     building_type: Turret,
///     name: "Turret",
///     cost: 100,
///     health: 150,
///     requires: Some(Armory),
///     tier: 2,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Which building this entry describes.
    pub building_type: BuildingType,

    /// Display name.
    pub name: String,

    /// Money cost to place.
    pub cost: i32,

    /// Maximum health once completed.
    pub health: u32,

    /// Building that must be owned and completed before this one can be placed.
    #[serde(default)]
    pub requires: Option<BuildingType>,

    /// Build-menu row (1, 2 or 3).
    #[serde(default = "default_tier")]
    pub tier: u8,
}

/// Default tier for buildings without explicit tier.
const fn default_tier() -> u8 {
    1
}

impl BuildingData {
    /// Convenience constructor used by the built-in catalog.
    #[must_use]
    pub fn new(
        building_type: BuildingType,
        name: &str,
        cost: i32,
        health: u32,
        requires: Option<BuildingType>,
        tier: u8,
    ) -> Self {
        Self {
            building_type,
            name: name.to_string(),
            cost,
            health,
            requires,
            tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_building() {
        let ron_str = r#"
            BuildingData(
                building_type: Turret,
                name: "Turret",
                cost: 100,
                health: 150,
                requires: Some(Armory),
            )
        "#;

        let building: BuildingData = ron::from_str(ron_str).expect("Failed to parse RON");
        assert_eq!(building.building_type, BuildingType::Turret);
        assert_eq!(building.requires, Some(BuildingType::Armory));
        assert_eq!(building.tier, 1);
    }

    #[test]
    fn test_only_refinery_produces_resources() {
        let producers: Vec<_> = BuildingType::ALL
            .into_iter()
            .filter(|b| b.is_resource_producer())
            .collect();
        assert_eq!(producers, vec![BuildingType::Refinery]);
    }
}
