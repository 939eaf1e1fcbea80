//! Player intents and their validation.
//!
//! Commands are applied synchronously through [`Simulation::apply`]. A
//! rejected command leaves the simulation untouched and returns the reason;
//! collaborators are free to ignore it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{ActivityState, Entity, EntityId, Health, Subtype};
use crate::config::money;
use crate::data::{BuildingType, UnitComposition, UnitPart};
use crate::error::{GameError, Result};
use crate::factions::Owner;
use crate::math::{point_in_circle, Fixed, Vec2Fixed};
use crate::production::Building;
use crate::simulation::Simulation;

/// Attempts at drawing a placement offset before falling back to the inner ring.
const PLACEMENT_ATTEMPTS: usize = 64;

/// An intent from the input collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Place a new building next to an owned one.
    BuildBuilding(BuildingType),
    /// Append a composition to a factory queue.
    QueueUnit(UnitComposition),
    /// Partially heal the inspected entity.
    Repair,
    /// Remove the inspected entity for a refund.
    Sell,
    /// Treat the next world click as a rally point for the selected factory.
    SetRally,
    /// Refund and empty the selected factory's queue.
    ClearQueue,
    /// Right click in the world: move or attack, or place the armed rally point.
    MoveOrRallyIntent(Vec2Fixed),
    /// Left click in the world.
    SelectAt {
        /// World position clicked.
        point: Vec2Fixed,
        /// Second click of a double click.
        double_click: bool,
    },
    /// Centre the viewport on a normalized minimap position.
    MinimapPan {
        /// Horizontal fraction of the map width.
        #[serde(with = "crate::math::fixed_serde")]
        x: Fixed,
        /// Vertical fraction of the map height.
        #[serde(with = "crate::math::fixed_serde")]
        y: Fixed,
    },
    /// Report the visible world size.
    SetViewport {
        /// Visible width in world units.
        #[serde(with = "crate::math::fixed_serde")]
        width: Fixed,
        /// Visible height in world units.
        #[serde(with = "crate::math::fixed_serde")]
        height: Fixed,
    },
}

/// What an accepted command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    /// A construction site was placed.
    BuildingPlaced {
        /// The new building.
        building: EntityId,
        /// Where it was placed.
        position: Vec2Fixed,
    },
    /// An order joined a factory queue.
    UnitQueued {
        /// The factory.
        factory: EntityId,
        /// Queue length after the push.
        queue_len: usize,
    },
    /// Health was restored.
    Repaired {
        /// The entity.
        entity: EntityId,
        /// Hit points restored.
        healed: u32,
        /// Money spent.
        cost: i32,
    },
    /// An entity was sold.
    Sold {
        /// The removed entity.
        entity: EntityId,
        /// Money refunded.
        refund: i32,
    },
    /// The next world click sets a rally point.
    RallyArmed,
    /// A factory rally point was set.
    RallyPointSet {
        /// The factory.
        factory: EntityId,
        /// New rally point.
        point: Vec2Fixed,
    },
    /// A factory queue was emptied.
    QueueCleared {
        /// The factory.
        factory: EntityId,
        /// Orders removed.
        orders: usize,
        /// Money refunded.
        refund: i32,
    },
    /// Units received a move order.
    Ordered {
        /// Units that were ordered.
        units: Vec<EntityId>,
        /// Entity they are heading for, if the click landed on one.
        target: Option<EntityId>,
    },
    /// Selection or inspection changed.
    Selected {
        /// New selection.
        selected: Vec<EntityId>,
        /// New inspection target.
        inspected: Option<EntityId>,
    },
    /// The viewport moved or resized.
    ViewportChanged(Viewport),
}

/// What the player has selected and inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionState {
    /// Selected owned entities, primary first.
    pub selected: Vec<EntityId>,
    /// Entity shown in the inspection panel.
    pub inspected: Option<EntityId>,
    /// Whether the next world click sets a rally point.
    pub rally_armed: bool,
}

impl SelectionState {
    /// Drop every reference to a removed entity.
    pub fn forget(&mut self, id: EntityId) {
        self.selected.retain(|&s| s != id);
        if self.inspected == Some(id) {
            self.inspected = None;
        }
    }

    /// Clear selection and inspection.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.inspected = None;
    }

    /// The primary selected entity.
    #[must_use]
    pub fn primary(&self) -> Option<EntityId> {
        self.selected.first().copied()
    }
}

/// Visible world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    /// Top-left corner in world units.
    pub origin: Vec2Fixed,
    /// Width and height in world units.
    pub size: Vec2Fixed,
}

impl Viewport {
    /// Viewport at the world origin.
    #[must_use]
    pub const fn new(size: Vec2Fixed) -> Self {
        Self {
            origin: Vec2Fixed::ZERO,
            size,
        }
    }

    /// Whether a point is inside the viewport, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        let far = self.origin + self.size;
        point.x >= self.origin.x && point.x <= far.x && point.y >= self.origin.y && point.y <= far.y
    }

    /// Centre the viewport on a point without clamping.
    pub fn center_on(&mut self, center: Vec2Fixed) {
        let half = self.size.scale(Fixed::from_num(0.5));
        self.origin = center - half;
    }
}

impl Simulation {
    /// Apply a player command.
    ///
    /// # Errors
    ///
    /// Returns the reason the command was declined. A declined command has
    /// no effect.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome> {
        let result = match command.clone() {
            Command::BuildBuilding(building_type) => self.build(building_type),
            Command::QueueUnit(composition) => self.queue_unit(composition),
            Command::Repair => self.repair(),
            Command::Sell => self.sell(),
            Command::SetRally => self.arm_rally(),
            Command::ClearQueue => self.clear_queue(),
            Command::MoveOrRallyIntent(point) => {
                if self.selection.rally_armed {
                    self.place_rally(point)
                } else {
                    self.order_move(point)
                }
            }
            Command::SelectAt {
                point,
                double_click,
            } => {
                if self.selection.rally_armed {
                    self.place_rally(point)
                } else {
                    Ok(self.select_at(point, double_click))
                }
            }
            Command::MinimapPan { x, y } => {
                let map = self.config.map_size;
                self.viewport
                    .center_on(Vec2Fixed::new(map.x.saturating_mul(x), map.y.saturating_mul(y)));
                Ok(CommandOutcome::ViewportChanged(self.viewport))
            }
            Command::SetViewport { width, height } => {
                self.viewport.size = Vec2Fixed::new(width.max(Fixed::ZERO), height.max(Fixed::ZERO));
                Ok(CommandOutcome::ViewportChanged(self.viewport))
            }
        };

        if let Err(reason) = &result {
            debug!(tick = self.tick, ?command, %reason, "Command rejected");
        }
        result
    }

    fn build(&mut self, building_type: BuildingType) -> Result<CommandOutcome> {
        let data = self.catalog.building(building_type).ok_or_else(|| {
            GameError::InvalidCatalog(vec![format!("no entry for {building_type:?}")])
        })?;
        let cost = data.cost;
        let max_health = data.health;

        if let Some(required) = data.requires {
            if !self
                .catalog
                .is_building_unlocked(building_type, &self.owned_building_types())
            {
                return Err(GameError::TechRequirementNotMet {
                    building: building_type,
                    required,
                });
            }
        }

        if !self.economy.can_afford(cost) {
            return Err(GameError::InsufficientResources {
                required: cost,
                available: self.economy.money,
            });
        }

        let anchor = self.placement_anchor().ok_or(GameError::NoPlacementAnchor)?;
        let position = anchor + self.placement_offset();

        self.economy.spend(cost)?;
        let building = Entity::building(
            Owner::Player,
            position,
            self.config.building_radius,
            Building::under_construction(building_type, self.config.build_time),
            Health::with_current(1, max_health),
        );
        let id = self.entities.insert(building);
        debug!(building = id, ?building_type, cost, "Construction started");
        Ok(CommandOutcome::BuildingPlaced {
            building: id,
            position,
        })
    }

    /// First owned resource producer, else the first owned building.
    fn placement_anchor(&self) -> Option<Vec2Fixed> {
        let owned: Vec<&Entity> = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.owner == Owner::Player && e.as_building().is_some())
            .collect();
        owned
            .iter()
            .find(|e| e.is_resource_producer())
            .or_else(|| owned.first())
            .map(|e| e.position)
    }

    /// Uniform offset inside the placement ring, by rejection sampling.
    fn placement_offset(&mut self) -> Vec2Fixed {
        let min = self.config.placement_min_distance;
        let max = self.config.placement_max_distance;
        let (min_sq, max_sq) = (min.saturating_mul(min), max.saturating_mul(max));
        let bound = max.to_bits();

        for _ in 0..PLACEMENT_ATTEMPTS {
            let offset = Vec2Fixed::new(
                Fixed::from_bits(self.rng.gen_range(-bound..=bound)),
                Fixed::from_bits(self.rng.gen_range(-bound..=bound)),
            );
            let dist_sq = offset.distance_squared(Vec2Fixed::ZERO);
            if dist_sq >= min_sq && dist_sq <= max_sq {
                return offset;
            }
        }
        Vec2Fixed::new(min, Fixed::ZERO)
    }

    fn queue_unit(&mut self, composition: UnitComposition) -> Result<CommandOutcome> {
        let ready_factory = |e: &Entity| {
            e.owner == Owner::Player && e.has_production_queue() && !e.is_constructing()
        };
        let factory = self
            .selection
            .primary()
            .filter(|&id| self.entities.get(id).is_some_and(ready_factory))
            .or_else(|| {
                self.entities
                    .sorted_ids()
                    .into_iter()
                    .find(|&id| self.entities.get(id).is_some_and(ready_factory))
            })
            .ok_or(GameError::NoFactoryAvailable)?;

        self.check_parts(&composition)?;
        self.economy.spend(composition.cost)?;
        let queue = self
            .entities
            .get_mut(factory)
            .and_then(Entity::as_building_mut)
            .and_then(Building::factory_mut)
            .map(|f| {
                f.queue.push(composition);
                f.queue.len()
            })
            .ok_or(GameError::NotAProducer(factory))?;

        Ok(CommandOutcome::UnitQueued {
            factory,
            queue_len: queue,
        })
    }

    /// Both parts must be offered to the player's faction and unlocked.
    fn check_parts(&self, composition: &UnitComposition) -> Result<()> {
        let owned = self.owned_building_types();
        for part in [
            UnitPart::Weapon(composition.weapon),
            UnitPart::Chassis(composition.chassis),
        ] {
            if !self.catalog.is_part_offered(part, self.faction) {
                return Err(GameError::PartNotOffered {
                    part,
                    faction: self.faction,
                });
            }
            if !self.catalog.is_part_unlocked(part, &owned) {
                if let Some(required) = self.catalog.part_requirement(part) {
                    return Err(GameError::PartLocked { part, required });
                }
            }
        }
        Ok(())
    }

    /// Look up the inspected entity, which must belong to the player.
    fn inspected_owned(&self) -> Result<&Entity> {
        let id = self.selection.inspected.ok_or(GameError::NothingInspected)?;
        let entity = self.entities.get(id).ok_or(GameError::EntityNotFound(id))?;
        if entity.owner != Owner::Player {
            return Err(GameError::NotOwned(id));
        }
        Ok(entity)
    }

    fn repair(&mut self) -> Result<CommandOutcome> {
        let entity = self.inspected_owned()?;
        let id = entity.id;
        let missing = entity.health.missing();
        if missing == 0 {
            return Err(GameError::NotDamaged(id));
        }
        let step_cost = self.config.repair_step_cost();
        if !self.economy.can_afford(step_cost) {
            return Err(GameError::InsufficientResources {
                required: step_cost,
                available: self.economy.money,
            });
        }

        let healed = missing.min(self.config.repair_amount);
        let cost = money(healed.saturating_mul(self.config.repair_cost_per_hp));
        self.economy.spend(cost)?;
        if let Some(entity) = self.entities.get_mut(id) {
            entity.health.heal(healed);
        }
        Ok(CommandOutcome::Repaired {
            entity: id,
            healed,
            cost,
        })
    }

    fn sell(&mut self) -> Result<CommandOutcome> {
        let entity = self.inspected_owned()?;
        let id = entity.id;
        let refund = entity
            .building_type()
            .map_or(0, |b| self.config.sell_refund(self.catalog.building_cost(b)));

        self.entities.remove(id);
        self.economy.deposit(refund);
        self.selection.clear();
        debug!(entity = id, refund, "Sold");
        Ok(CommandOutcome::Sold { entity: id, refund })
    }

    fn arm_rally(&mut self) -> Result<CommandOutcome> {
        if self.selection.selected.is_empty() {
            return Err(GameError::NothingSelected);
        }
        self.selection.rally_armed = true;
        Ok(CommandOutcome::RallyArmed)
    }

    fn place_rally(&mut self, point: Vec2Fixed) -> Result<CommandOutcome> {
        self.selection.rally_armed = false;
        let id = self.selection.primary().ok_or(GameError::NothingSelected)?;
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?;
        if entity.owner != Owner::Player {
            return Err(GameError::NotOwned(id));
        }
        let factory = entity
            .as_building_mut()
            .and_then(Building::factory_mut)
            .ok_or(GameError::NotAProducer(id))?;
        factory.rally_point = Some(point);
        Ok(CommandOutcome::RallyPointSet { factory: id, point })
    }

    fn clear_queue(&mut self) -> Result<CommandOutcome> {
        let id = self.selection.primary().ok_or(GameError::NothingSelected)?;
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(GameError::EntityNotFound(id))?;
        if entity.owner != Owner::Player {
            return Err(GameError::NotOwned(id));
        }
        let factory = entity
            .as_building_mut()
            .and_then(Building::factory_mut)
            .ok_or(GameError::NotAProducer(id))?;

        let refund = factory.queue.total_cost();
        let orders = factory.queue.drain().len();
        factory.timer = 0;
        self.economy.deposit(refund);
        Ok(CommandOutcome::QueueCleared {
            factory: id,
            orders,
            refund,
        })
    }

    fn order_move(&mut self, point: Vec2Fixed) -> Result<CommandOutcome> {
        let units: Vec<EntityId> = self
            .selection
            .selected
            .iter()
            .copied()
            .filter(|&id| {
                self.entities
                    .get(id)
                    .is_some_and(|e| e.owner == Owner::Player && e.is_mobile())
            })
            .collect();
        if units.is_empty() {
            return Err(GameError::NothingSelected);
        }

        let target = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .find(|e| e.owner != Owner::Player && point_in_circle(point, e.position, e.radius))
            .map(|e| (e.id, e.position));

        let spread = self.config.move_dispersion.to_bits().max(0);
        for &id in &units {
            let destination = match target {
                Some((_, position)) => position,
                None => {
                    let jitter = Vec2Fixed::new(
                        Fixed::from_bits(self.rng.gen_range(-spread..=spread)),
                        Fixed::from_bits(self.rng.gen_range(-spread..=spread)),
                    );
                    point + jitter
                }
            };
            if let Some(entity) = self.entities.get_mut(id) {
                if let Some(unit) = entity.as_unit_mut() {
                    unit.move_target = Some(destination);
                }
                entity.state = ActivityState::Moving;
            }
        }

        Ok(CommandOutcome::Ordered {
            units,
            target: target.map(|(id, _)| id),
        })
    }

    fn select_at(&mut self, point: Vec2Fixed, double_click: bool) -> CommandOutcome {
        let margin = self.config.selection_margin;
        let hit = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.entities.get(id))
            .find(|e| point_in_circle(point, e.position, e.radius + margin))
            .map(|e| (e.id, e.owner, e.subtype(), e.is_mobile()));

        match hit {
            Some((id, Owner::Player, subtype @ Subtype::Unit { .. }, true)) if double_click => {
                self.selection.selected = self
                    .entities
                    .sorted_ids()
                    .into_iter()
                    .filter(|&other| {
                        other != id
                            && self.entities.get(other).is_some_and(|e| {
                                e.owner == Owner::Player
                                    && e.subtype() == subtype
                                    && self.viewport.contains(e.position)
                            })
                    })
                    .collect();
                self.selection.selected.insert(0, id);
                self.selection.inspected = None;
            }
            Some((id, Owner::Player, _, mobile)) => {
                self.selection.selected = vec![id];
                self.selection.inspected = if mobile { None } else { Some(id) };
            }
            Some((id, _, _, _)) => {
                self.selection.selected.clear();
                self.selection.inspected = Some(id);
            }
            None => self.selection.clear(),
        }

        CommandOutcome::Selected {
            selected: self.selection.selected.clone(),
            inspected: self.selection.inspected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::data::{Catalog, ChassisType, WeaponType};
    use crate::factions::FactionId;
    use crate::production::Building;

    fn sim() -> Simulation {
        let mut sim = Simulation::new(SimConfig::default(), Catalog::standard(), FactionId::Quadrumm);
        sim.set_money(1000);
        sim
    }

    fn gatling_wheels() -> UnitComposition {
        Catalog::standard()
            .compose(WeaponType::Gatling, ChassisType::Wheels)
            .unwrap()
    }

    fn place(sim: &mut Simulation, building: BuildingType, x: i32, y: i32) -> EntityId {
        sim.spawn_building(Owner::Player, building, Vec2Fixed::from_ints(x, y), true)
            .unwrap()
    }

    #[test]
    fn test_build_places_site_in_ring() {
        let mut sim = sim();
        let refinery = place(&mut sim, BuildingType::Refinery, 500, 500);
        let outcome = sim.apply(Command::BuildBuilding(BuildingType::Factory)).unwrap();
        let CommandOutcome::BuildingPlaced { building, position } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(sim.money(), 850);

        let anchor = sim.entities().get(refinery).unwrap().position;
        let dist_sq = position.distance_squared(anchor);
        assert!(dist_sq >= Fixed::from_num(80 * 80));
        assert!(dist_sq <= Fixed::from_num(130 * 130));

        let site = sim.entities().get(building).unwrap();
        assert!(site.is_constructing());
        assert_eq!(site.health.current, 1);
        assert_eq!(site.health.max, 250);
        assert_eq!(site.state, ActivityState::Building);
    }

    #[test]
    fn test_build_checks_prerequisite_and_funds() {
        let mut sim = sim();
        place(&mut sim, BuildingType::Refinery, 500, 500);
        let err = sim.apply(Command::BuildBuilding(BuildingType::Turret)).unwrap_err();
        assert_eq!(
            err,
            GameError::TechRequirementNotMet {
                building: BuildingType::Turret,
                required: BuildingType::Armory
            }
        );

        sim.set_money(100);
        let err = sim.apply(Command::BuildBuilding(BuildingType::Factory)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources { .. }));
        assert_eq!(sim.money(), 100);
    }

    #[test]
    fn test_build_without_anchor_keeps_money() {
        let mut sim = sim();
        let err = sim.apply(Command::BuildBuilding(BuildingType::Depot)).unwrap_err();
        assert_eq!(err, GameError::NoPlacementAnchor);
        assert_eq!(sim.money(), 1000);
    }

    #[test]
    fn test_constructing_prerequisite_does_not_count() {
        let mut sim = sim();
        place(&mut sim, BuildingType::Refinery, 500, 500);
        sim.spawn_building(
            Owner::Player,
            BuildingType::Armory,
            Vec2Fixed::from_ints(700, 500),
            false,
        )
        .unwrap();
        assert!(sim.apply(Command::BuildBuilding(BuildingType::Turret)).is_err());
    }

    #[test]
    fn test_queue_unit_prefers_selected_factory() {
        let mut sim = sim();
        let first = place(&mut sim, BuildingType::Factory, 100, 100);
        let second = place(&mut sim, BuildingType::Factory, 400, 100);

        let outcome = sim.apply(Command::QueueUnit(gatling_wheels())).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::UnitQueued {
                factory: first,
                queue_len: 1
            }
        );

        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(400, 100),
            double_click: false,
        })
        .unwrap();
        let outcome = sim.apply(Command::QueueUnit(gatling_wheels())).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::UnitQueued {
                factory: second,
                queue_len: 1
            }
        );
        assert_eq!(sim.money(), 900);
    }

    #[test]
    fn test_queue_unit_needs_completed_factory() {
        let mut sim = sim();
        sim.spawn_building(
            Owner::Player,
            BuildingType::Factory,
            Vec2Fixed::from_ints(100, 100),
            false,
        )
        .unwrap();
        let err = sim.apply(Command::QueueUnit(gatling_wheels())).unwrap_err();
        assert_eq!(err, GameError::NoFactoryAvailable);
        assert_eq!(sim.money(), 1000);
    }

    #[test]
    fn test_queue_unit_rejects_foreign_special() {
        let mut sim = sim();
        place(&mut sim, BuildingType::Factory, 100, 100);
        place(&mut sim, BuildingType::TechLab, 300, 100);
        place(&mut sim, BuildingType::MechLab, 500, 100);
        let plasma = Catalog::standard()
            .compose(WeaponType::Plasma, ChassisType::Wheels)
            .unwrap();

        let err = sim.apply(Command::QueueUnit(plasma)).unwrap_err();
        assert_eq!(
            err,
            GameError::PartNotOffered {
                part: UnitPart::Weapon(WeaponType::Plasma),
                faction: FactionId::Quadrumm
            }
        );
        assert_eq!(sim.money(), 1000);

        let own = Catalog::standard()
            .compose(WeaponType::Lightning, ChassisType::Bipedal)
            .unwrap();
        assert!(sim.apply(Command::QueueUnit(own)).is_ok());
    }

    #[test]
    fn test_queue_unit_rejects_locked_part() {
        let mut sim = sim();
        place(&mut sim, BuildingType::Factory, 100, 100);
        sim.spawn_building(
            Owner::Player,
            BuildingType::CannonLab,
            Vec2Fixed::from_ints(300, 100),
            false,
        )
        .unwrap();
        let cannon = Catalog::standard()
            .compose(WeaponType::Cannon, ChassisType::Wheels)
            .unwrap();

        let err = sim.apply(Command::QueueUnit(cannon.clone())).unwrap_err();
        assert_eq!(
            err,
            GameError::PartLocked {
                part: UnitPart::Weapon(WeaponType::Cannon),
                required: BuildingType::CannonLab
            }
        );
        assert_eq!(sim.money(), 1000);

        place(&mut sim, BuildingType::CannonLab, 500, 100);
        assert!(sim.apply(Command::QueueUnit(cannon)).is_ok());
        assert_eq!(sim.money(), 925);
    }

    #[test]
    fn test_repair_heals_in_steps() {
        let mut sim = sim();
        let depot = place(&mut sim, BuildingType::Depot, 300, 300);
        sim.entities_mut().get_mut(depot).unwrap().health.current = 95;
        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(300, 300),
            double_click: false,
        })
        .unwrap();

        let outcome = sim.apply(Command::Repair).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Repaired {
                entity: depot,
                healed: 5,
                cost: 5
            }
        );
        assert_eq!(sim.money(), 995);
        assert_eq!(sim.apply(Command::Repair), Err(GameError::NotDamaged(depot)));
    }

    #[test]
    fn test_repair_needs_full_step_of_money() {
        let mut sim = sim();
        let depot = place(&mut sim, BuildingType::Depot, 300, 300);
        sim.entities_mut().get_mut(depot).unwrap().health.current = 50;
        sim.selection_mut().inspected = Some(depot);
        sim.set_money(9);
        assert!(matches!(
            sim.apply(Command::Repair),
            Err(GameError::InsufficientResources { required: 10, available: 9 })
        ));
        assert_eq!(sim.entities().get(depot).unwrap().health.current, 50);
    }

    #[test]
    fn test_sell_refunds_and_clears_selection() {
        let mut sim = sim();
        let refinery = place(&mut sim, BuildingType::Refinery, 300, 300);
        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(300, 300),
            double_click: false,
        })
        .unwrap();
        assert_eq!(sim.selection().inspected, Some(refinery));

        let outcome = sim.apply(Command::Sell).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Sold {
                entity: refinery,
                refund: 120
            }
        );
        assert_eq!(sim.money(), 1120);
        assert!(sim.entities().get(refinery).is_none());
        assert!(sim.selection().selected.is_empty());
        assert_eq!(sim.selection().inspected, None);
    }

    #[test]
    fn test_sell_rejects_enemy() {
        let mut sim = sim();
        let enemy = sim
            .spawn_building(
                Owner::Opponent,
                BuildingType::Refinery,
                Vec2Fixed::from_ints(300, 300),
                true,
            )
            .unwrap();
        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(300, 300),
            double_click: false,
        })
        .unwrap();
        assert_eq!(sim.selection().inspected, Some(enemy));
        assert!(sim.selection().selected.is_empty());
        assert_eq!(sim.apply(Command::Sell), Err(GameError::NotOwned(enemy)));
        assert!(sim.entities().contains(enemy));
    }

    #[test]
    fn test_rally_consumes_next_click() {
        let mut sim = sim();
        let factory = place(&mut sim, BuildingType::Factory, 100, 100);
        assert_eq!(sim.apply(Command::SetRally), Err(GameError::NothingSelected));

        sim.selection_mut().selected = vec![factory];
        assert_eq!(sim.apply(Command::SetRally), Ok(CommandOutcome::RallyArmed));
        let point = Vec2Fixed::from_ints(600, 400);
        let outcome = sim
            .apply(Command::SelectAt {
                point,
                double_click: false,
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::RallyPointSet { factory, point });
        assert!(!sim.selection().rally_armed);
        assert_eq!(sim.selection().selected, vec![factory]);

        let rally = sim
            .entities()
            .get(factory)
            .and_then(Entity::as_building)
            .and_then(Building::factory)
            .and_then(|f| f.rally_point);
        assert_eq!(rally, Some(point));
    }

    #[test]
    fn test_rally_on_non_factory_disarms() {
        let mut sim = sim();
        let depot = place(&mut sim, BuildingType::Depot, 100, 100);
        sim.selection_mut().selected = vec![depot];
        sim.apply(Command::SetRally).unwrap();
        let err = sim
            .apply(Command::MoveOrRallyIntent(Vec2Fixed::from_ints(5, 5)))
            .unwrap_err();
        assert_eq!(err, GameError::NotAProducer(depot));
        assert!(!sim.selection().rally_armed);
    }

    #[test]
    fn test_clear_queue_refunds_everything() {
        let mut sim = sim();
        let factory = place(&mut sim, BuildingType::Factory, 100, 100);
        sim.selection_mut().selected = vec![factory];
        sim.apply(Command::QueueUnit(gatling_wheels())).unwrap();
        sim.apply(Command::QueueUnit(gatling_wheels())).unwrap();
        sim.tick();
        assert_eq!(sim.money(), 900);

        let outcome = sim.apply(Command::ClearQueue).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::QueueCleared {
                factory,
                orders: 2,
                refund: 100
            }
        );
        assert_eq!(sim.money(), 1000);
        let f = sim
            .entities()
            .get(factory)
            .and_then(Entity::as_building)
            .and_then(Building::factory)
            .unwrap();
        assert!(f.queue.is_empty());
        assert_eq!(f.timer, 0);
    }

    #[test]
    fn test_move_order_targets_enemy_position() {
        let mut sim = sim();
        let unit = sim
            .spawn_unit(Owner::Player, WeaponType::Gatling, ChassisType::Wheels, Vec2Fixed::ZERO)
            .unwrap();
        let enemy_pos = Vec2Fixed::from_ints(900, 900);
        let enemy = sim
            .spawn_unit(Owner::Opponent, WeaponType::Gatling, ChassisType::Wheels, enemy_pos)
            .unwrap();
        sim.selection_mut().selected = vec![unit];

        let outcome = sim
            .apply(Command::MoveOrRallyIntent(Vec2Fixed::from_ints(905, 900)))
            .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Ordered {
                units: vec![unit],
                target: Some(enemy)
            }
        );
        let ordered = sim.entities().get(unit).unwrap();
        assert_eq!(ordered.as_unit().unwrap().move_target, Some(enemy_pos));
        assert_eq!(ordered.state, ActivityState::Moving);
    }

    #[test]
    fn test_move_order_disperses_around_point() {
        let mut sim = sim();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                sim.spawn_unit(
                    Owner::Player,
                    WeaponType::Gatling,
                    ChassisType::Wheels,
                    Vec2Fixed::from_ints(i * 30, 0),
                )
                .unwrap()
            })
            .collect();
        sim.selection_mut().selected = ids.clone();
        let point = Vec2Fixed::from_ints(500, 500);
        sim.apply(Command::MoveOrRallyIntent(point)).unwrap();

        let spread = Fixed::from_num(15);
        for id in ids {
            let target = sim.entities().get(id).unwrap().as_unit().unwrap().move_target.unwrap();
            assert!((target.x - point.x).abs() <= spread);
            assert!((target.y - point.y).abs() <= spread);
        }
    }

    #[test]
    fn test_move_order_needs_units() {
        let mut sim = sim();
        let factory = place(&mut sim, BuildingType::Factory, 100, 100);
        sim.selection_mut().selected = vec![factory];
        assert_eq!(
            sim.apply(Command::MoveOrRallyIntent(Vec2Fixed::ZERO)),
            Err(GameError::NothingSelected)
        );
    }

    #[test]
    fn test_selection_margin_and_clearing() {
        let mut sim = sim();
        let unit = sim
            .spawn_unit(
                Owner::Player,
                WeaponType::Gatling,
                ChassisType::Wheels,
                Vec2Fixed::from_ints(100, 100),
            )
            .unwrap();

        // Radius 12 plus 5 margin.
        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(117, 100),
            double_click: false,
        })
        .unwrap();
        assert_eq!(sim.selection().selected, vec![unit]);
        assert_eq!(sim.selection().inspected, None);

        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(118, 100),
            double_click: false,
        })
        .unwrap();
        assert!(sim.selection().selected.is_empty());
    }

    #[test]
    fn test_double_click_selects_visible_same_subtype() {
        let mut sim = sim();
        let spawn = |sim: &mut Simulation, weapon, x, y| {
            sim.spawn_unit(Owner::Player, weapon, ChassisType::Wheels, Vec2Fixed::from_ints(x, y))
                .unwrap()
        };
        let a = spawn(&mut sim, WeaponType::Gatling, 100, 100);
        let b = spawn(&mut sim, WeaponType::Gatling, 300, 300);
        spawn(&mut sim, WeaponType::Cannon, 200, 200);
        let far = spawn(&mut sim, WeaponType::Gatling, 1500, 1200);

        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(300, 300),
            double_click: true,
        })
        .unwrap();
        assert_eq!(sim.selection().selected, vec![b, a]);

        sim.apply(Command::SelectAt {
            point: Vec2Fixed::from_ints(1500, 1200),
            double_click: true,
        })
        .unwrap();
        assert_eq!(sim.selection().selected, vec![far, a, b]);
    }

    #[test]
    fn test_view_commands_serialize() {
        let pan = Command::MinimapPan {
            x: Fixed::from_num(0.25),
            y: Fixed::from_num(0.75),
        };
        let json = serde_json::to_string(&pan).unwrap();
        assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), pan);

        let resize = Command::SetViewport {
            width: Fixed::from_num(1024),
            height: Fixed::from_num(768),
        };
        let text = ron::to_string(&resize).unwrap();
        assert_eq!(ron::from_str::<Command>(&text).unwrap(), resize);
    }

    #[test]
    fn test_minimap_pan_centres_viewport() {
        let mut sim = sim();
        let outcome = sim
            .apply(Command::MinimapPan {
                x: Fixed::from_num(0.5),
                y: Fixed::from_num(0.5),
            })
            .unwrap();
        let CommandOutcome::ViewportChanged(viewport) = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(viewport.origin, Vec2Fixed::from_ints(600, 450));
        assert!(viewport.contains(Vec2Fixed::from_ints(1000, 750)));
        assert!(!viewport.contains(Vec2Fixed::from_ints(100, 100)));
    }
}
