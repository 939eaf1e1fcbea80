//! Read-only view of the simulation published after each tick.

use serde::{Deserialize, Serialize};

use crate::commands::Viewport;
use crate::components::{Entity, EntityId, Projectile};
use crate::data::BuildingType;
use crate::economy::Zone;
use crate::factions::Owner;
use crate::lifecycle::Outcome;
use crate::simulation::Simulation;

/// Everything a renderer or HUD may look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// The local player's money.
    pub money: i32,
    /// Live player units.
    pub unit_count: u32,
    /// Player unit cap.
    pub unit_cap: u32,
    /// Selected entities, primary first.
    pub selected: Vec<EntityId>,
    /// Inspected entity.
    pub inspected: Option<EntityId>,
    /// Whether the next world click places a rally point.
    pub rally_armed: bool,
    /// Distinct finished building types the player owns, in catalog order.
    pub owned_buildings: Vec<BuildingType>,
    /// All zones.
    pub zones: Vec<Zone>,
    /// All entities in id order.
    pub entities: Vec<Entity>,
    /// Projectiles in creation order.
    pub projectiles: Vec<Projectile>,
    /// Visible world rectangle.
    pub viewport: Viewport,
    /// Match outcome so far.
    pub outcome: Outcome,
}

impl Simulation {
    /// Finished building types the player owns, without duplicates.
    #[must_use]
    pub fn owned_building_types(&self) -> Vec<BuildingType> {
        let mut types: Vec<BuildingType> = self
            .entities
            .iter()
            .filter(|(_, e)| e.owner == Owner::Player && !e.is_constructing())
            .filter_map(|(_, e)| e.building_type())
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    /// Live units owned by the player.
    #[must_use]
    pub fn player_unit_count(&self) -> u32 {
        let count = self
            .entities
            .iter()
            .filter(|(_, e)| e.owner == Owner::Player && e.is_mobile())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Capture the published state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            money: self.economy.money,
            unit_count: self.player_unit_count(),
            unit_cap: self.economy.max_units,
            selected: self.selection.selected.clone(),
            inspected: self.selection.inspected,
            rally_armed: self.selection.rally_armed,
            owned_buildings: self.owned_building_types(),
            zones: self.zones.clone(),
            entities: self.entities.sorted().cloned().collect(),
            projectiles: self.projectiles.iter().cloned().collect(),
            viewport: self.viewport,
            outcome: self.outcome,
        }
    }
}
