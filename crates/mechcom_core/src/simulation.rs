//! Core simulation loop.
//!
//! The simulation owns every piece of match state and advances it one fixed
//! step at a time. Collaborators read it through [`Simulation::snapshot`]
//! and change it only through [`Simulation::apply`].
//!
//! # Determinism
//!
//! - No floating-point math in the tick loop (uses fixed-point via [`Fixed`])
//! - All randomness comes from one seeded `ChaCha8Rng`
//! - Every phase walks entities in ascending id order
//! - Same seed and same commands always produce the same state hash
//!
//! # Example
//!
//! ```
//! use mechcom_core::commands::Command;
//! use mechcom_core::data::BuildingType;
//! use mechcom_core::simulation::Simulation;
//!
//! let mut sim = Simulation::skirmish_default();
//! sim.apply(Command::BuildBuilding(BuildingType::Factory)).unwrap();
//!
//! for _ in 0..900 {
//!     sim.tick();
//! }
//! assert!(sim.snapshot().owned_buildings.contains(&BuildingType::Factory));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::{combat_system, projectile_system, CombatEvent, ProjectileStorage};
use crate::commands::{SelectionState, Viewport};
use crate::components::{Entity, EntityId, Health, Unit, UnitStats};
use crate::config::SimConfig;
use crate::data::{BuildingType, Catalog, ChassisType, WeaponType};
use crate::economy::{
    mining_system, zone_capture_system, EconomyEvent, PlayerEconomy, Zone, ZoneId,
};
use crate::error::{GameError, Result};
use crate::factions::{FactionId, Owner};
use crate::lifecycle::{cleanup_system, evaluate_outcome, Outcome};
use crate::math::{Fixed, Vec2Fixed};
use crate::production::{
    construction_system, production_system, Building, PopulationLedger, ProductionEvent,
};

/// Storage for all entities in the simulation.
///
/// Uses a `HashMap` for O(1) entity lookup by ID, with deterministic
/// iteration via sorted keys when processing systems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStorage {
    /// Map of entity ID to entity data.
    entities: HashMap<EntityId, Entity>,
    /// Next entity ID to assign. Never reused.
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty entity storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new entity and return its ID.
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted entity IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Entities in ascending id order.
    pub fn sorted(&self) -> impl Iterator<Item = &Entity> {
        self.sorted_ids()
            .into_iter()
            .filter_map(move |id| self.entities.get(&id))
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Entity)> {
        self.entities.iter()
    }
}

/// Events generated during a simulation tick.
///
/// These events can be used by the game layer to trigger effects,
/// sounds, animations, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Zone captures and mining cycles.
    pub economy: Vec<EconomyEvent>,
    /// Construction completions, spawns and cap stalls.
    pub production: Vec<ProductionEvent>,
    /// Shots, hits and misses.
    pub combat: Vec<CombatEvent>,
    /// Entities removed at zero health.
    pub deaths: Vec<EntityId>,
    /// Set on the one tick the match is decided.
    pub outcome: Option<Outcome>,
}

/// The core game simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Zones** - Capture progress, then refinery mining
/// 2. **Construction** - Advance building sites
/// 3. **Production** - Advance factory queues, spawn units under the cap
/// 4. **Combat** - Movement, targeting and firing per entity
/// 5. **Projectiles** - Advance and apply damage
/// 6. **Lifecycle** - Remove the dead, evaluate the outcome
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Current simulation tick.
    pub(crate) tick: u64,
    pub(crate) config: SimConfig,
    pub(crate) catalog: Catalog,
    pub(crate) faction: FactionId,
    /// All entities in the simulation.
    pub(crate) entities: EntityStorage,
    pub(crate) zones: Vec<Zone>,
    pub(crate) projectiles: ProjectileStorage,
    pub(crate) economy: PlayerEconomy,
    pub(crate) selection: SelectionState,
    pub(crate) viewport: Viewport,
    pub(crate) outcome: Outcome,
    pub(crate) rng: ChaCha8Rng,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default(), Catalog::standard(), FactionId::default())
    }
}

impl Simulation {
    /// Create an empty simulation with no zones or entities.
    #[must_use]
    pub fn new(config: SimConfig, catalog: Catalog, faction: FactionId) -> Self {
        Self {
            tick: 0,
            economy: PlayerEconomy::new(config.starting_money, config.base_unit_cap),
            viewport: Viewport::new(config.viewport_size),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            catalog,
            faction,
            entities: EntityStorage::new(),
            zones: Vec::new(),
            projectiles: ProjectileStorage::new(),
            selection: SelectionState::default(),
            outcome: Outcome::Undecided,
        }
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Tunable constants.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Static tables.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The local player's faction.
    #[must_use]
    pub const fn faction(&self) -> FactionId {
        self.faction
    }

    /// All entities.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Mutable entity access for scenario setup.
    pub fn entities_mut(&mut self) -> &mut EntityStorage {
        &mut self.entities
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// All zones in creation order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Projectiles in flight.
    #[must_use]
    pub const fn projectiles(&self) -> &ProjectileStorage {
        &self.projectiles
    }

    /// The local player's economy.
    #[must_use]
    pub const fn economy(&self) -> &PlayerEconomy {
        &self.economy
    }

    /// The local player's money.
    #[must_use]
    pub const fn money(&self) -> i32 {
        self.economy.money
    }

    /// Overwrite the local player's money. Negative amounts clamp to zero.
    pub fn set_money(&mut self, amount: i32) {
        self.economy.money = amount.max(0);
    }

    /// Current selection and inspection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Mutable selection access for scenario setup.
    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    /// Visible world rectangle.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Latched match outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Add a zone and return its id.
    pub fn add_zone(
        &mut self,
        center: Vec2Fixed,
        radius: Fixed,
        resources: u32,
        owner: Owner,
    ) -> ZoneId {
        let id = ZoneId::try_from(self.zones.len()).unwrap_or(ZoneId::MAX);
        self.zones.push(Zone::new(id, center, radius, resources, owner));
        id
    }

    /// Spawn a unit from catalog parts, with no orders and a ready weapon.
    ///
    /// # Errors
    ///
    /// Fails if either part is missing from the catalog.
    pub fn spawn_unit(
        &mut self,
        owner: Owner,
        weapon: WeaponType,
        chassis: ChassisType,
        position: Vec2Fixed,
    ) -> Result<EntityId> {
        let missing = || GameError::InvalidCatalog(vec![format!("no entry for {weapon:?} {chassis:?}")]);
        let composition = self.catalog.compose(weapon, chassis).ok_or_else(missing)?;
        let weapon_data = self.catalog.weapon(weapon).ok_or_else(missing)?;
        let chassis_data = self.catalog.chassis(chassis).ok_or_else(missing)?;

        let unit = Unit::new(composition, UnitStats::from_catalog(weapon_data, chassis_data));
        let entity = Entity::unit(
            owner,
            position,
            self.config.unit_radius,
            unit,
            chassis_data.armor,
        );
        Ok(self.entities.insert(entity))
    }

    /// Spawn a building, either finished at full health or as a fresh site.
    ///
    /// # Errors
    ///
    /// Fails if the building type is missing from the catalog.
    pub fn spawn_building(
        &mut self,
        owner: Owner,
        building_type: BuildingType,
        position: Vec2Fixed,
        completed: bool,
    ) -> Result<EntityId> {
        self.spawn_building_with_radius(
            owner,
            building_type,
            position,
            self.config.building_radius,
            completed,
        )
    }

    /// [`Simulation::spawn_building`] with an explicit collision radius.
    ///
    /// # Errors
    ///
    /// Fails if the building type is missing from the catalog.
    pub fn spawn_building_with_radius(
        &mut self,
        owner: Owner,
        building_type: BuildingType,
        position: Vec2Fixed,
        radius: Fixed,
        completed: bool,
    ) -> Result<EntityId> {
        let max = self
            .catalog
            .building(building_type)
            .ok_or_else(|| GameError::InvalidCatalog(vec![format!("no entry for {building_type:?}")]))?
            .health;
        let (building, health) = if completed {
            (Building::constructed(building_type), Health::new(max))
        } else {
            (
                Building::under_construction(building_type, self.config.build_time),
                Health::with_current(1, max),
            )
        };
        Ok(self
            .entities
            .insert(Entity::building(owner, position, radius, building, health)))
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let ids = self.entities.sorted_ids();

        let occupants: Vec<(Owner, Vec2Fixed)> = self
            .entities
            .sorted()
            .filter(|e| e.is_mobile() && !e.is_aerial())
            .map(|e| (e.owner, e.position))
            .collect();
        events.economy = zone_capture_system(&mut self.zones, &occupants, &self.config);
        events.economy.extend(mining_system(
            &mut self.entities,
            &ids,
            &mut self.zones,
            &mut self.economy,
            &self.config,
        ));

        let (completed, construction) = construction_system(&mut self.entities, &ids);
        events.production = construction;

        let mut ledger = PopulationLedger::survey(&self.entities, &self.config);
        self.economy.max_units = ledger.cap(Owner::Player);
        events.production.extend(production_system(
            &mut self.entities,
            &ids,
            &completed,
            &self.catalog,
            &self.config,
            &mut ledger,
        ));

        events.combat = combat_system(
            &mut self.entities,
            &ids,
            &completed,
            &mut self.projectiles,
            &self.config,
        );
        events
            .combat
            .extend(projectile_system(&mut self.entities, &mut self.projectiles));

        events.deaths = cleanup_system(&mut self.entities, &mut self.selection);
        if !self.outcome.is_decided() {
            let outcome = evaluate_outcome(&self.entities);
            if outcome.is_decided() {
                info!(tick = self.tick, ?outcome, "Match decided");
                self.outcome = outcome;
                events.outcome = Some(outcome);
            }
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(tick = self.tick, hash = self.state_hash(), "Tick complete");
        }

        events
    }

    /// Compute a hash of the current simulation state.
    ///
    /// Two simulations with the same hash are in the same state. Used for
    /// determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        // Hash entities in deterministic order
        self.entities.len().hash(&mut hasher);
        for entity in self.entities.sorted() {
            entity.hash(&mut hasher);
        }

        self.zones.hash(&mut hasher);
        self.projectiles.hash(&mut hasher);
        self.economy.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        self.viewport.hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        hasher.finish()
    }
}
