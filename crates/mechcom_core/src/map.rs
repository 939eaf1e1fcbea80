//! The standard skirmish layout.
//!
//! Five zones: one home zone per side in opposite corners, three neutral
//! zones between them. Each side starts with a finished refinery on its
//! home zone.

use crate::config::SimConfig;
use crate::data::{BuildingType, Catalog};
use crate::error::Result;
use crate::factions::{FactionId, Owner};
use crate::math::{Fixed, Vec2Fixed};
use crate::simulation::Simulation;

/// Radius of every skirmish zone.
pub const ZONE_RADIUS: i32 = 150;

/// Zone centres and their starting owners.
pub const ZONES: [((i32, i32), Owner); 5] = [
    ((200, 200), Owner::Player),
    ((1800, 1300), Owner::Opponent),
    ((1000, 750), Owner::Neutral),
    ((200, 1300), Owner::Neutral),
    ((1800, 200), Owner::Neutral),
];

/// Starting refinery positions.
pub const START_REFINERIES: [((i32, i32), Owner); 2] = [
    ((250, 250), Owner::Player),
    ((1750, 1250), Owner::Opponent),
];

/// Add the skirmish zones and starting buildings to a simulation.
///
/// # Errors
///
/// Fails if the catalog has no refinery entry.
pub fn populate_skirmish(sim: &mut Simulation) -> Result<()> {
    let resources = sim.config().zone_resources;
    for ((x, y), owner) in ZONES {
        sim.add_zone(
            Vec2Fixed::from_ints(x, y),
            Fixed::from_num(ZONE_RADIUS),
            resources,
            owner,
        );
    }

    let radius = sim.config().start_building_radius;
    for ((x, y), owner) in START_REFINERIES {
        sim.spawn_building_with_radius(
            owner,
            BuildingType::Refinery,
            Vec2Fixed::from_ints(x, y),
            radius,
            true,
        )?;
    }
    Ok(())
}

impl Simulation {
    /// A ready-to-play skirmish.
    ///
    /// # Errors
    ///
    /// Fails if the catalog has no refinery entry.
    pub fn skirmish(config: SimConfig, catalog: Catalog, faction: FactionId) -> Result<Self> {
        let mut sim = Self::new(config, catalog, faction);
        populate_skirmish(&mut sim)?;
        Ok(sim)
    }

    /// The skirmish with stock configuration and catalog.
    #[must_use]
    pub fn skirmish_default() -> Self {
        let mut sim = Self::default();
        // The stock catalog always contains a refinery.
        let _ = populate_skirmish(&mut sim);
        sim
    }
}
