//! # Mechcom Core
//!
//! Deterministic simulation core for the Mechcom skirmish RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded generator owned by the simulation)
//! - No floating-point math in the tick loop (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Entity registry and the tick loop
//! - [`economy`] - Zone capture and refinery mining
//! - [`production`] - Construction sites and factory queues
//! - [`combat`] - Movement, targeting, projectiles
//! - [`commands`] - Player intents
//! - [`lifecycle`] - Cleanup and win/loss
//! - [`data`] - Catalog tables for buildings, weapons and chassis
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod commands;
pub mod components;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod factions;
pub mod lifecycle;
pub mod map;
pub mod math;
pub mod production;
pub mod simulation;
pub mod snapshot;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::CombatEvent;
    pub use crate::commands::{Command, CommandOutcome, SelectionState, Viewport};
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::data::{BuildingType, Catalog, ChassisType, TargetClass, UnitComposition, WeaponType};
    pub use crate::economy::{EconomyEvent, PlayerEconomy, Zone, ZoneId};
    pub use crate::error::{GameError, Result};
    pub use crate::factions::{FactionId, Owner};
    pub use crate::lifecycle::Outcome;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::production::{Building, BuildingRole, ProductionEvent};
    pub use crate::simulation::{Simulation, TickEvents};
    pub use crate::snapshot::Snapshot;
}
