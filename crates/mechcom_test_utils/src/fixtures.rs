//! Test fixtures and helpers.
//!
//! Pre-built game states and entity configurations
//! for consistent testing.

use fixed::types::I32F32;
use mechcom_core::config::SimConfig;
use mechcom_core::data::{BuildingType, Catalog, ChassisType, WeaponType};
use mechcom_core::factions::{FactionId, Owner};
use mechcom_core::math::Vec2Fixed;
use mechcom_core::simulation::Simulation;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a world position from integers.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Empty simulation with stock tables.
#[must_use]
pub fn empty_sim() -> Simulation {
    Simulation::new(SimConfig::default(), Catalog::standard(), FactionId::Quadrumm)
}

/// Empty simulation with a custom configuration.
#[must_use]
pub fn sim_with(config: SimConfig) -> Simulation {
    Simulation::new(config, Catalog::standard(), FactionId::Quadrumm)
}

/// Two identical Gatling/Wheels units 100 apart, one per side, each
/// guarded by a distant refinery so neither side is eliminated.
///
/// Returns the simulation, the player unit and the opponent unit.
///
/// # Panics
///
/// Panics if the stock catalog lacks the parts.
#[must_use]
pub fn duel() -> (Simulation, u64, u64) {
    let mut sim = empty_sim();
    sim.spawn_building(Owner::Player, BuildingType::Refinery, vec2(-1000, 0), true)
        .expect("stock refinery");
    sim.spawn_building(Owner::Opponent, BuildingType::Refinery, vec2(1000, 0), true)
        .expect("stock refinery");
    let player = sim
        .spawn_unit(Owner::Player, WeaponType::Gatling, ChassisType::Wheels, vec2(0, 0))
        .expect("stock parts");
    let opponent = sim
        .spawn_unit(Owner::Opponent, WeaponType::Gatling, ChassisType::Wheels, vec2(100, 0))
        .expect("stock parts");
    (sim, player, opponent)
}

/// A player refinery on an owned zone holding `resources`.
///
/// Returns the simulation and the refinery.
///
/// # Panics
///
/// Panics if the stock catalog lacks a refinery.
#[must_use]
pub fn mining_outpost(resources: u32) -> (Simulation, u64) {
    let mut sim = empty_sim();
    sim.add_zone(vec2(500, 500), fixed(150), resources, Owner::Player);
    let refinery = sim
        .spawn_building(Owner::Player, BuildingType::Refinery, vec2(500, 500), true)
        .expect("stock refinery");
    (sim, refinery)
}

/// The standard skirmish with a few squads on each side heading for the
/// centre zone.
///
/// # Panics
///
/// Panics if the stock catalog lacks the parts.
#[must_use]
pub fn skirmish_battle(seed: u64) -> Simulation {
    let config = SimConfig {
        seed,
        ..SimConfig::default()
    };
    let mut sim = Simulation::skirmish(config, Catalog::standard(), FactionId::Quadrumm)
        .expect("stock catalog");

    let squads = [
        (Owner::Player, WeaponType::Gatling, ChassisType::Wheels, vec2(400, 400)),
        (Owner::Player, WeaponType::Cannon, ChassisType::Tracks, vec2(420, 380)),
        (Owner::Player, WeaponType::Rocket, ChassisType::Wheels, vec2(380, 420)),
        (Owner::Opponent, WeaponType::Gatling, ChassisType::Aircraft, vec2(1600, 1100)),
        (Owner::Opponent, WeaponType::Cannon, ChassisType::Wheels, vec2(1580, 1120)),
        (Owner::Opponent, WeaponType::Laser, ChassisType::Bipedal, vec2(1620, 1080)),
    ];
    for (owner, weapon, chassis, position) in squads {
        let id = sim
            .spawn_unit(owner, weapon, chassis, position)
            .expect("stock parts");
        if let Some(unit) = sim
            .entities_mut()
            .get_mut(id)
            .and_then(|e| e.as_unit_mut())
        {
            unit.move_target = Some(vec2(1000, 750));
        }
    }
    sim
}
