//! The static tables the simulation reads: buildings, weapons, chassis and
//! faction specials.

use serde::{Deserialize, Serialize};

use super::building_data::{BuildingData, BuildingType};
use super::faction_data::FactionSpecial;
use super::unit_data::{
    ChassisData, ChassisType, TargetClass, UnitComposition, WeaponData, WeaponType,
};
use crate::error::{GameError, Result};
use crate::factions::FactionId;
use crate::math::Fixed;

/// A weapon or chassis, for unlock checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitPart {
    /// A weapon.
    Weapon(WeaponType),
    /// A chassis.
    Chassis(ChassisType),
}

/// Read-only configuration tables, loaded once per match.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     buildings: [BuildingData(building_type: Refinery, name: "Refinery", cost: 200, health: 150)],
///     weapons: [...],
///     chassis: [...],
///     specials: [FactionSpecial(faction: Quadrumm, weapon: Lightning, chassis: Bipedal)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Building definitions.
    pub buildings: Vec<BuildingData>,
    /// Weapon definitions.
    pub weapons: Vec<WeaponData>,
    /// Chassis definitions.
    pub chassis: Vec<ChassisData>,
    /// Faction signature tech.
    #[serde(default)]
    pub specials: Vec<FactionSpecial>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The stock MechCom tables.
    #[must_use]
    pub fn standard() -> Self {
        use BuildingType as B;
        use ChassisType as C;
        use WeaponType as W;

        let buildings = vec![
            BuildingData::new(B::Refinery, "Refinery", 200, 150, None, 1),
            BuildingData::new(B::Factory, "Factory", 150, 250, None, 1),
            BuildingData::new(B::Depot, "Depot", 100, 100, None, 1),
            BuildingData::new(B::Armory, "Armory", 150, 200, None, 1),
            BuildingData::new(B::Turret, "Turret", 100, 150, Some(B::Armory), 2),
            BuildingData::new(B::TracksLab, "Tracks Lab", 200, 200, Some(B::Factory), 2),
            BuildingData::new(B::CannonLab, "Cannon Lab", 200, 200, Some(B::Factory), 2),
            BuildingData::new(B::AirLab, "Airport", 250, 250, Some(B::TracksLab), 3),
            BuildingData::new(B::MechLab, "Mech Lab", 300, 250, Some(B::TracksLab), 3),
            BuildingData::new(B::RocketLab, "Rocket Lab", 250, 250, Some(B::CannonLab), 3),
            BuildingData::new(B::TechLab, "Tech Lab", 300, 250, Some(B::CannonLab), 3),
        ];

        let weapon = |weapon, name: &str, damage, target, cooldown, range: i32, cost, unlock| {
            WeaponData {
                weapon,
                name: name.to_string(),
                damage,
                target,
                cooldown,
                range: Fixed::from_num(range),
                cost,
                unlocked_by: Some(unlock),
            }
        };
        let weapons = vec![
            weapon(W::Gatling, "Gatling", 5, TargetClass::Any, 30, 150, 0, B::Factory),
            weapon(W::Cannon, "Cannon", 8, TargetClass::Ground, 60, 180, 25, B::CannonLab),
            weapon(W::Rocket, "Rocket", 12, TargetClass::Air, 50, 220, 25, B::RocketLab),
            weapon(W::Laser, "Laser", 16, TargetClass::Ground, 40, 160, 75, B::TechLab),
            weapon(W::Lightning, "Lightning", 20, TargetClass::Ground, 50, 140, 75, B::TechLab),
            weapon(W::Plasma, "Plasma", 12, TargetClass::Ground, 25, 170, 75, B::TechLab),
        ];

        let chassis = |chassis, name: &str, armor, speed: f64, cost, unlock, aerial| ChassisData {
            chassis,
            name: name.to_string(),
            armor,
            speed: Fixed::from_num(speed),
            cost,
            unlocked_by: Some(unlock),
            aerial,
        };
        let chassis = vec![
            chassis(C::Wheels, "Wheels", 50, 2.0, 50, B::Factory, false),
            chassis(C::Tracks, "Tracks", 70, 1.5, 75, B::TracksLab, false),
            chassis(C::Aircraft, "Aircraft", 65, 2.5, 100, B::AirLab, true),
            chassis(C::HoverTracks, "Hover Tracks", 120, 1.5, 100, B::MechLab, false),
            chassis(C::HoverWheels, "Hover Wheels", 80, 2.0, 100, B::MechLab, false),
            chassis(C::Bipedal, "Bipedal", 100, 1.8, 100, B::MechLab, false),
        ];

        Self {
            buildings,
            weapons,
            chassis,
            specials: FactionId::ALL.map(FactionSpecial::standard).to_vec(),
        }
    }

    /// Parse and validate a catalog from a RON document.
    pub fn from_ron_str(label: &str, source: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(source).map_err(|e| GameError::ron(label, &e))?;
        let errors = catalog.validate();
        if errors.is_empty() {
            Ok(catalog)
        } else {
            Err(GameError::InvalidCatalog(errors))
        }
    }

    /// Check that every table is complete and every reference resolves.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for building in BuildingType::ALL {
            match self.buildings.iter().filter(|b| b.building_type == building).count() {
                0 => errors.push(format!("Missing building '{building:?}'")),
                1 => {}
                _ => errors.push(format!("Duplicate building '{building:?}'")),
            }
        }
        for weapon in WeaponType::ALL {
            if self.weapon(weapon).is_none() {
                errors.push(format!("Missing weapon '{weapon:?}'"));
            }
        }
        for chassis in ChassisType::ALL {
            if self.chassis(chassis).is_none() {
                errors.push(format!("Missing chassis '{chassis:?}'"));
            }
        }

        for building in &self.buildings {
            if building.requires == Some(building.building_type) {
                errors.push(format!("Building '{:?}' requires itself", building.building_type));
            }
            if building.cost < 0 {
                errors.push(format!("Building '{:?}' has a negative cost", building.building_type));
            }
            if building.health == 0 {
                errors.push(format!("Building '{:?}' has no health", building.building_type));
            }
        }
        for weapon in &self.weapons {
            if weapon.cost < 0 {
                errors.push(format!("Weapon '{:?}' has a negative cost", weapon.weapon));
            }
        }
        for chassis in &self.chassis {
            if chassis.armor == 0 {
                errors.push(format!("Chassis '{:?}' has no armor", chassis.chassis));
            }
            if chassis.cost < 0 {
                errors.push(format!("Chassis '{:?}' has a negative cost", chassis.chassis));
            }
        }

        errors
    }

    /// Look up a building definition.
    #[must_use]
    pub fn building(&self, building: BuildingType) -> Option<&BuildingData> {
        self.buildings.iter().find(|b| b.building_type == building)
    }

    /// Look up a weapon definition.
    #[must_use]
    pub fn weapon(&self, weapon: WeaponType) -> Option<&WeaponData> {
        self.weapons.iter().find(|w| w.weapon == weapon)
    }

    /// Look up a chassis definition.
    #[must_use]
    pub fn chassis(&self, chassis: ChassisType) -> Option<&ChassisData> {
        self.chassis.iter().find(|c| c.chassis == chassis)
    }

    /// Catalog cost of a building, or 0 for unknown entries.
    #[must_use]
    pub fn building_cost(&self, building: BuildingType) -> i32 {
        self.building(building).map_or(0, |b| b.cost)
    }

    /// Price a weapon/chassis pairing: chassis cost plus the weapon surcharge.
    #[must_use]
    pub fn compose(&self, weapon: WeaponType, chassis: ChassisType) -> Option<UnitComposition> {
        let weapon_data = self.weapon(weapon)?;
        let chassis_data = self.chassis(chassis)?;
        Some(UnitComposition {
            weapon,
            chassis,
            cost: chassis_data.cost + weapon_data.cost,
            name: Some(format!("{} {}", weapon_data.name, chassis_data.name)),
        })
    }

    /// Building that must be owned before `part` can be fitted, if any.
    #[must_use]
    pub fn part_requirement(&self, part: UnitPart) -> Option<BuildingType> {
        match part {
            UnitPart::Weapon(w) => self.weapon(w).and_then(|d| d.unlocked_by),
            UnitPart::Chassis(c) => self.chassis(c).and_then(|d| d.unlocked_by),
        }
    }

    /// Whether a part is in the catalog and not another faction's special.
    #[must_use]
    pub fn is_part_offered(&self, part: UnitPart, faction: FactionId) -> bool {
        match part {
            UnitPart::Weapon(w) => self.offered_weapons(faction).contains(&w),
            UnitPart::Chassis(c) => self.offered_chassis(faction).contains(&c),
        }
    }

    /// Whether a part can be fitted given the completed buildings a side owns.
    #[must_use]
    pub fn is_part_unlocked(&self, part: UnitPart, owned: &[BuildingType]) -> bool {
        let requirement = match part {
            UnitPart::Weapon(w) => self.weapon(w).map(|d| d.unlocked_by),
            UnitPart::Chassis(c) => self.chassis(c).map(|d| d.unlocked_by),
        };
        match requirement {
            Some(Some(building)) => owned.contains(&building),
            Some(None) => true,
            None => false,
        }
    }

    /// Whether a building's prerequisite is among the completed buildings.
    #[must_use]
    pub fn is_building_unlocked(&self, building: BuildingType, owned: &[BuildingType]) -> bool {
        match self.building(building) {
            Some(data) => data.requires.map_or(true, |req| owned.contains(&req)),
            None => false,
        }
    }

    /// Weapons a faction may choose from: the common ones plus its own special.
    #[must_use]
    pub fn offered_weapons(&self, faction: FactionId) -> Vec<WeaponType> {
        self.weapons
            .iter()
            .map(|w| w.weapon)
            .filter(|w| {
                self.specials
                    .iter()
                    .all(|s| s.weapon != *w || s.faction == faction)
            })
            .collect()
    }

    /// Chassis a faction may choose from: the common ones plus its own special.
    #[must_use]
    pub fn offered_chassis(&self, faction: FactionId) -> Vec<ChassisType> {
        self.chassis
            .iter()
            .map(|c| c.chassis)
            .filter(|c| {
                self.specials
                    .iter()
                    .all(|s| s.chassis != *c || s.faction == faction)
            })
            .collect()
    }
}
