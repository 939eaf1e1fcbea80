//! Scenario loading and configuration.
//!
//! Scenarios define the initial match state for headless runs: tables,
//! tunables, zones and the units and buildings each side starts with.
//!
//! ```ron
//! Scenario(
//!     name: "Refinery duel",
//!     seed: 7,
//!     zones: [(x: 500.0, y: 500.0, radius: 150.0, resources: 12000, owner: Player)],
//!     buildings: [(building: Refinery, x: 500.0, y: 500.0, owner: Player)],
//!     units: [(weapon: Gatling, chassis: Wheels, x: 600.0, y: 500.0, owner: Opponent)],
//! )
//! ```

use std::path::Path;

use mechcom_core::config::SimConfig;
use mechcom_core::data::{BuildingType, Catalog, ChassisType, WeaponType};
use mechcom_core::error::GameError;
use mechcom_core::factions::{FactionId, Owner};
use mechcom_core::map::populate_skirmish;
use mechcom_core::math::Fixed;
use mechcom_core::simulation::Simulation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{world_point, IntentError};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario's tables or placements were rejected by the simulation.
    #[error("Invalid scenario: {0}")]
    Setup(#[from] GameError),
    /// A placement coordinate cannot be represented in world units.
    #[error("Invalid placement: {0}")]
    Placement(#[from] IntentError),
}

/// A zone to create at match start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePlacement {
    /// Centre X.
    pub x: f64,
    /// Centre Y.
    pub y: f64,
    /// Radius in world units.
    pub radius: f64,
    /// Starting resources.
    pub resources: u32,
    /// Starting owner.
    #[serde(default)]
    pub owner: Owner,
}

/// A building present at match start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Building type.
    pub building: BuildingType,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Owner.
    pub owner: Owner,
    /// Place as a fresh construction site instead of a finished building.
    #[serde(default)]
    pub under_construction: bool,
}

/// A unit present at match start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Weapon.
    pub weapon: WeaponType,
    /// Chassis.
    pub chassis: ChassisType,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Owner.
    pub owner: Owner,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// The local player's faction.
    pub faction: FactionId,
    /// Seed for placement and order scatter. Overrides the config seed.
    pub seed: u64,
    /// Tunable overrides; stock values when absent.
    pub config: Option<SimConfig>,
    /// Catalog overrides; stock tables when absent.
    pub catalog: Option<Catalog>,
    /// Start from the standard skirmish layout before adding placements.
    pub skirmish_layout: bool,
    /// Extra zones.
    pub zones: Vec<ZonePlacement>,
    /// Extra buildings.
    pub buildings: Vec<BuildingPlacement>,
    /// Extra units.
    pub units: Vec<UnitPlacement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "Empty".to_string(),
            faction: FactionId::default(),
            seed: 0,
            config: None,
            catalog: None,
            skirmish_layout: false,
            zones: Vec::new(),
            buildings: Vec::new(),
            units: Vec::new(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The standard skirmish: five zones and one refinery per side.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Standard Skirmish".to_string(),
            skirmish_layout: true,
            ..Self::default()
        }
    }

    /// Build a fresh simulation from this scenario.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let mut config = self.config.clone().unwrap_or_default();
        config.seed = self.seed;
        config.check()?;

        let catalog = self.catalog.clone().unwrap_or_default();
        let problems = catalog.validate();
        if !problems.is_empty() {
            return Err(GameError::InvalidCatalog(problems).into());
        }

        let mut sim = Simulation::new(config, catalog, self.faction);
        if self.skirmish_layout {
            populate_skirmish(&mut sim)?;
        }

        for zone in &self.zones {
            let radius = Fixed::checked_from_num(zone.radius)
                .ok_or_else(|| IntentError::OutOfRange(zone.radius.to_string()))?;
            let center = world_point(zone.x, zone.y)?;
            sim.add_zone(center, radius, zone.resources, zone.owner);
        }
        for b in &self.buildings {
            let position = world_point(b.x, b.y)?;
            sim.spawn_building(b.owner, b.building, position, !b.under_construction)?;
        }
        for u in &self.units {
            let position = world_point(u.x, u.y)?;
            sim.spawn_unit(u.owner, u.weapon, u.chassis, position)?;
        }

        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechcom_core::math::Vec2Fixed;

    #[test]
    fn test_skirmish_builds_standard_layout() {
        let sim = Scenario::skirmish().build().unwrap();
        assert_eq!(sim.zones().len(), 5);
        assert_eq!(sim.entities().len(), 2);
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let scenario = Scenario::from_ron_str(
            r#"Scenario(
                name: "Refinery duel",
                seed: 7,
                zones: [(x: 500.0, y: 500.0, radius: 150.0, resources: 12000, owner: Player)],
                buildings: [(building: Refinery, x: 500.0, y: 500.0, owner: Player)],
                units: [(weapon: Gatling, chassis: Wheels, x: 600.0, y: 500.0, owner: Opponent)],
            )"#,
        )
        .unwrap();
        assert_eq!(scenario.seed, 7);
        assert!(!scenario.skirmish_layout);

        let sim = scenario.build().unwrap();
        assert_eq!(sim.zones().len(), 1);
        assert_eq!(sim.entities().len(), 2);
        assert_eq!(sim.zones()[0].center, Vec2Fixed::from_ints(500, 500));
    }

    #[test]
    fn test_config_override_is_applied() {
        let scenario = Scenario::from_ron_str(
            "Scenario(skirmish_layout: true, config: Some(SimConfig(starting_money: 2000)))",
        )
        .unwrap();
        let sim = scenario.build().unwrap();
        assert_eq!(sim.money(), 2000);
        assert_eq!(sim.config().mining_interval, 600);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let scenario =
            Scenario::from_ron_str("Scenario(config: Some(SimConfig(build_time: 0)))").unwrap();
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::Setup(GameError::DataParseError { .. }))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.ron");
        std::fs::write(
            &path,
            "Scenario(name: \"Duel\", units: [(weapon: Gatling, chassis: Wheels, x: 0.0, y: 0.0, owner: Player)])",
        )
        .unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.name, "Duel");
        assert_eq!(scenario.build().unwrap().entities().len(), 1);
    }

    #[test]
    fn test_non_finite_placement_rejected() {
        let mut scenario = Scenario::default();
        scenario.units.push(UnitPlacement {
            weapon: WeaponType::Gatling,
            chassis: ChassisType::Wheels,
            x: f64::INFINITY,
            y: 0.0,
            owner: Owner::Player,
        });
        assert!(matches!(scenario.build(), Err(ScenarioError::Placement(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/nonexistent/scenario.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
