//! Construction and unit production.
//!
//! Buildings are placed at 1 HP and construct for a fixed number of ticks.
//! Factories work through a FIFO queue of [`UnitComposition`]s, spawning one
//! unit per cycle while the owner has room under its unit cap.
//!
//! All timers are integer tick counters for deterministic simulation.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::components::{ActivityState, Entity, EntityId, Unit, UnitStats};
use crate::config::SimConfig;
use crate::data::{BuildingType, Catalog, UnitComposition};
use crate::factions::Owner;
use crate::math::Vec2Fixed;
use crate::simulation::EntityStorage;

/// Construction progress of a building, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Construction {
    /// Ticks spent so far.
    pub elapsed: u32,
    /// Ticks needed in total.
    pub total: u32,
}

impl Construction {
    /// Start construction from zero.
    #[must_use]
    pub const fn new(total: u32) -> Self {
        Self { elapsed: 0, total }
    }

    /// Advance by one tick. Returns `true` once complete.
    pub fn tick(&mut self) -> bool {
        self.elapsed = self.elapsed.saturating_add(1).min(self.total);
        self.is_complete()
    }

    /// Whether every tick has been spent.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.elapsed >= self.total
    }

    /// Progress in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            f64::from(self.elapsed) / f64::from(self.total)
        }
    }
}

/// FIFO queue of production orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionQueue {
    items: VecDeque<UnitComposition>,
}

impl ProductionQueue {
    /// Create an empty production queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of queued orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append an order.
    pub fn push(&mut self, composition: UnitComposition) {
        self.items.push_back(composition);
    }

    /// The order currently being built.
    #[must_use]
    pub fn current(&self) -> Option<&UnitComposition> {
        self.items.front()
    }

    /// Remove the order currently being built.
    pub fn complete(&mut self) -> Option<UnitComposition> {
        self.items.pop_front()
    }

    /// Remove every order, returning them in queue order.
    pub fn drain(&mut self) -> Vec<UnitComposition> {
        self.items.drain(..).collect()
    }

    /// Sum of the costs charged for all queued orders.
    #[must_use]
    pub fn total_cost(&self) -> i32 {
        self.items.iter().map(|c| c.cost).sum()
    }

    /// Iterate over queued orders, head first.
    pub fn iter(&self) -> impl Iterator<Item = &UnitComposition> {
        self.items.iter()
    }
}

/// Production state of a factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Factory {
    /// Queued orders.
    pub queue: ProductionQueue,
    /// Ticks spent on the current cycle.
    pub timer: u32,
    /// Destination given to every unit produced here.
    pub rally_point: Option<Vec2Fixed>,
}

/// Per-type behaviour of a building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingRole {
    /// Mines the zone it stands in.
    Refinery {
        /// Ticks spent on the current mining cycle.
        extraction_timer: u32,
    },
    /// Produces units.
    Factory(Factory),
    /// Shoots at nearby enemies.
    Turret {
        /// Ticks until the turret may fire again.
        cooldown_remaining: u32,
    },
    /// Passive: depots, armories and labs.
    Support,
}

impl BuildingRole {
    /// Fresh role state for a building category.
    #[must_use]
    pub fn for_type(building_type: BuildingType) -> Self {
        match building_type {
            BuildingType::Refinery => Self::Refinery {
                extraction_timer: 0,
            },
            BuildingType::Factory => Self::Factory(Factory::default()),
            BuildingType::Turret => Self::Turret {
                cooldown_remaining: 0,
            },
            _ => Self::Support,
        }
    }
}

/// Building component with construction and role state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// The type of this building.
    pub building_type: BuildingType,
    /// `Some` while under construction.
    pub construction: Option<Construction>,
    /// Role-specific state.
    pub role: BuildingRole,
}

impl Building {
    /// Create a building with explicit parts.
    #[must_use]
    pub const fn new(
        building_type: BuildingType,
        construction: Option<Construction>,
        role: BuildingRole,
    ) -> Self {
        Self {
            building_type,
            construction,
            role,
        }
    }

    /// A building that starts construction now.
    #[must_use]
    pub fn under_construction(building_type: BuildingType, build_time: u32) -> Self {
        Self::new(
            building_type,
            Some(Construction::new(build_time)),
            BuildingRole::for_type(building_type),
        )
    }

    /// A fully constructed building.
    #[must_use]
    pub fn constructed(building_type: BuildingType) -> Self {
        Self::new(building_type, None, BuildingRole::for_type(building_type))
    }

    /// Whether construction is still in progress.
    #[must_use]
    pub const fn is_constructing(&self) -> bool {
        self.construction.is_some()
    }

    /// Construction progress in `[0, 1]`; 1 when complete.
    #[must_use]
    pub fn construction_fraction(&self) -> f64 {
        self.construction.map_or(1.0, |c| c.fraction())
    }

    /// Factory state, if this building produces units.
    #[must_use]
    pub fn factory(&self) -> Option<&Factory> {
        match &self.role {
            BuildingRole::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    /// Mutable factory state, if this building produces units.
    pub fn factory_mut(&mut self) -> Option<&mut Factory> {
        match &mut self.role {
            BuildingRole::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    /// Advance construction by one tick.
    ///
    /// Returns `true` if construction just completed.
    pub fn tick_construction(&mut self) -> bool {
        let Some(construction) = self.construction.as_mut() else {
            return false;
        };
        if construction.tick() {
            self.construction = None;
            return true;
        }
        false
    }
}

/// Events generated by the construction and production systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// A building finished construction.
    ConstructionComplete {
        /// The building.
        building: EntityId,
        /// Its category.
        building_type: BuildingType,
        /// Its owner.
        owner: Owner,
    },
    /// A factory produced a unit.
    UnitSpawned {
        /// The producing factory.
        factory: EntityId,
        /// The new unit.
        unit: EntityId,
        /// Owner of both.
        owner: Owner,
        /// What was built.
        composition: UnitComposition,
    },
    /// A cycle finished but the owner was at its unit cap. The order stays queued.
    CapReached {
        /// The producing factory.
        factory: EntityId,
        /// Owner at cap.
        owner: Owner,
    },
}

/// Live unit counts and caps per owner, computed once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationLedger {
    counts: [u32; 3],
    caps: [u32; 3],
}

impl PopulationLedger {
    /// Count units and completed population buildings for every owner.
    #[must_use]
    pub fn survey(entities: &EntityStorage, config: &SimConfig) -> Self {
        let mut counts = [0u32; 3];
        let mut depots = [0u32; 3];
        for (_, entity) in entities.iter() {
            let slot = usize::from(entity.owner.code());
            if entity.is_mobile() {
                counts[slot] += 1;
            } else if !entity.is_constructing()
                && entity
                    .building_type()
                    .is_some_and(BuildingType::provides_population)
            {
                depots[slot] += 1;
            }
        }
        let caps = depots.map(|d| {
            config
                .base_unit_cap
                .saturating_add(config.unit_cap_per_depot.saturating_mul(d))
        });
        Self { counts, caps }
    }

    /// Current unit cap for an owner.
    #[must_use]
    pub fn cap(&self, owner: Owner) -> u32 {
        self.caps[usize::from(owner.code())]
    }

    /// Live unit count for an owner, including units spawned this tick.
    #[must_use]
    pub fn count(&self, owner: Owner) -> u32 {
        self.counts[usize::from(owner.code())]
    }

    /// Whether another unit fits under the owner's cap.
    #[must_use]
    pub fn has_room(&self, owner: Owner) -> bool {
        self.count(owner) < self.cap(owner)
    }

    fn record_spawn(&mut self, owner: Owner) {
        self.counts[usize::from(owner.code())] += 1;
    }
}

/// Advance every building under construction by one tick.
///
/// Completed buildings return to idle at full health. Returns the ids that
/// completed this tick so later phases can skip them.
pub fn construction_system(
    entities: &mut EntityStorage,
    ids: &[EntityId],
) -> (Vec<EntityId>, Vec<ProductionEvent>) {
    let mut completed = Vec::new();
    let mut events = Vec::new();

    for &id in ids {
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        let owner = entity.owner;
        let Some(building) = entity.as_building_mut() else {
            continue;
        };
        if !building.tick_construction() {
            continue;
        }
        let building_type = building.building_type;
        entity.state = ActivityState::Idle;
        entity.health.restore();

        info!(entity = id, ?building_type, ?owner, "Construction complete");
        completed.push(id);
        events.push(ProductionEvent::ConstructionComplete {
            building: id,
            building_type,
            owner,
        });
    }

    (completed, events)
}

/// Advance factory queues and spawn finished units.
///
/// `skip` lists entities that completed construction this tick. Units are
/// spawned at `config.spawn_offset` from the factory, head for its rally
/// point if one is set, and act from the next tick.
pub fn production_system(
    entities: &mut EntityStorage,
    ids: &[EntityId],
    skip: &[EntityId],
    catalog: &Catalog,
    config: &SimConfig,
    ledger: &mut PopulationLedger,
) -> Vec<ProductionEvent> {
    let mut events = Vec::new();

    for &id in ids {
        if skip.contains(&id) {
            continue;
        }
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        if entity.is_constructing() {
            continue;
        }
        let owner = entity.owner;
        let origin = entity.position;
        let Some(factory) = entity.as_building_mut().and_then(Building::factory_mut) else {
            continue;
        };
        if factory.queue.is_empty() {
            continue;
        }

        factory.timer += 1;
        if factory.timer < config.unit_build_time {
            continue;
        }
        factory.timer = 0;

        if !ledger.has_room(owner) {
            debug!(factory = id, ?owner, cap = ledger.cap(owner), "Unit cap reached");
            events.push(ProductionEvent::CapReached { factory: id, owner });
            continue;
        }

        let Some(composition) = factory.queue.current().cloned() else {
            continue;
        };
        let (Some(weapon), Some(chassis)) = (
            catalog.weapon(composition.weapon),
            catalog.chassis(composition.chassis),
        ) else {
            debug!(factory = id, ?composition, "Queued composition missing from catalog");
            continue;
        };
        factory.queue.complete();
        let rally_point = factory.rally_point;

        let mut unit = Unit::new(
            composition.clone(),
            UnitStats::from_catalog(weapon, chassis),
        );
        unit.move_target = rally_point;
        let mut spawned = Entity::unit(
            owner,
            origin + config.spawn_offset,
            config.unit_radius,
            unit,
            chassis.armor,
        );
        if rally_point.is_some() {
            spawned.state = ActivityState::Moving;
        }

        let unit_id = entities.insert(spawned);
        ledger.record_spawn(owner);
        info!(factory = id, unit = unit_id, ?owner, weapon = ?composition.weapon, chassis = ?composition.chassis, "Unit produced");
        events.push(ProductionEvent::UnitSpawned {
            factory: id,
            unit: unit_id,
            owner,
            composition,
        });
    }

    events
}
