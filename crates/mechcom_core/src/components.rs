//! Entity and projectile definitions.
//!
//! An [`Entity`] is either a unit or a building. Per-kind behaviour lives in
//! [`EntityKind`] so that, for example, a unit can never carry a production
//! queue. Capability queries (`is_mobile`, `is_combat_capable`, ...) are the
//! only way systems ask what an entity can do.

use serde::{Deserialize, Serialize};

use crate::data::{
    BuildingType, ChassisData, ChassisType, TargetClass, UnitComposition, WeaponData, WeaponType,
};
use crate::factions::Owner;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::production::{Building, BuildingRole};

/// Unique entity identifier. Assigned from a monotonic counter, never reused.
pub type EntityId = u64;

/// Unique projectile identifier. Assigned from a monotonic counter, never reused.
pub type ProjectileId = u64;

/// Health component for damageable entities.
///
/// `current <= max` holds after every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Create a health component at a given value, clamped to `max`.
    #[must_use]
    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Hit points needed to reach full health.
    #[must_use]
    pub const fn missing(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Apply damage, returning actual damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Heal the entity, returning actual amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.missing());
        self.current += actual;
        actual
    }

    /// Restore to maximum.
    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

/// Behavioural state tag shown to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivityState {
    /// Doing nothing.
    #[default]
    Idle,
    /// Travelling to a move target.
    Moving,
    /// A target is in range.
    Attacking,
    /// Under construction.
    Building,
    /// A refinery accruing income.
    Mining,
}

/// Combat and movement stats derived from a unit's weapon and chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// World units per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Engagement range (inclusive).
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Damage per projectile.
    pub damage: u32,
    /// Ticks between shots.
    pub cooldown: u32,
    /// Which targets the weapon may engage.
    pub target_class: TargetClass,
    /// Flying units ignore zones.
    pub aerial: bool,
}

impl UnitStats {
    /// Derive stats from catalog entries.
    #[must_use]
    pub fn from_catalog(weapon: &WeaponData, chassis: &ChassisData) -> Self {
        Self {
            speed: chassis.speed,
            range: weapon.range,
            damage: weapon.damage,
            cooldown: weapon.cooldown,
            target_class: weapon.target,
            aerial: chassis.aerial,
        }
    }
}

/// Mobile combat unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Weapon and chassis this unit was built from.
    pub composition: UnitComposition,
    /// Derived stats.
    pub stats: UnitStats,
    /// Point the unit is travelling to. While set, the unit does not engage.
    pub move_target: Option<Vec2Fixed>,
    /// Ticks until the weapon may fire again.
    pub cooldown_remaining: u32,
}

impl Unit {
    /// A fresh unit, weapon ready, no orders.
    #[must_use]
    pub fn new(composition: UnitComposition, stats: UnitStats) -> Self {
        Self {
            composition,
            stats,
            move_target: None,
            cooldown_remaining: 0,
        }
    }
}

/// Unit or building payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A mobile unit.
    Unit(Unit),
    /// A static building.
    Building(Building),
}

/// What an entity is, for grouping and tech gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtype {
    /// A building category.
    Building(BuildingType),
    /// A unit composition.
    Unit {
        /// Weapon fitted.
        weapon: WeaponType,
        /// Chassis used.
        chassis: ChassisType,
    },
}

/// A unit or building in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// Exclusive owner.
    pub owner: Owner,
    /// World position.
    pub position: Vec2Fixed,
    /// Hit points.
    pub health: Health,
    /// Collision and pick radius.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Behavioural state tag.
    pub state: ActivityState,
    /// Unit or building payload.
    pub kind: EntityKind,
}

impl Entity {
    /// Build a unit entity. The id is assigned on insertion.
    #[must_use]
    pub fn unit(owner: Owner, position: Vec2Fixed, radius: Fixed, unit: Unit, armor: u32) -> Self {
        Self {
            id: 0,
            owner,
            position,
            health: Health::new(armor),
            radius,
            state: ActivityState::Idle,
            kind: EntityKind::Unit(unit),
        }
    }

    /// Build a building entity. The id is assigned on insertion.
    #[must_use]
    pub fn building(
        owner: Owner,
        position: Vec2Fixed,
        radius: Fixed,
        building: Building,
        health: Health,
    ) -> Self {
        let state = if building.is_constructing() {
            ActivityState::Building
        } else {
            ActivityState::Idle
        };
        Self {
            id: 0,
            owner,
            position,
            health,
            radius,
            state,
            kind: EntityKind::Building(building),
        }
    }

    /// Unit payload, if this is a unit.
    #[must_use]
    pub fn as_unit(&self) -> Option<&Unit> {
        match &self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Building(_) => None,
        }
    }

    /// Mutable unit payload, if this is a unit.
    pub fn as_unit_mut(&mut self) -> Option<&mut Unit> {
        match &mut self.kind {
            EntityKind::Unit(unit) => Some(unit),
            EntityKind::Building(_) => None,
        }
    }

    /// Building payload, if this is a building.
    #[must_use]
    pub fn as_building(&self) -> Option<&Building> {
        match &self.kind {
            EntityKind::Building(building) => Some(building),
            EntityKind::Unit(_) => None,
        }
    }

    /// Mutable building payload, if this is a building.
    pub fn as_building_mut(&mut self) -> Option<&mut Building> {
        match &mut self.kind {
            EntityKind::Building(building) => Some(building),
            EntityKind::Unit(_) => None,
        }
    }

    /// Building category, if this is a building.
    #[must_use]
    pub fn building_type(&self) -> Option<BuildingType> {
        self.as_building().map(|b| b.building_type)
    }

    /// Grouping key for double-click selection and tech gating.
    #[must_use]
    pub fn subtype(&self) -> Subtype {
        match &self.kind {
            EntityKind::Unit(unit) => Subtype::Unit {
                weapon: unit.composition.weapon,
                chassis: unit.composition.chassis,
            },
            EntityKind::Building(building) => Subtype::Building(building.building_type),
        }
    }

    /// Whether this is a building still under construction.
    #[must_use]
    pub fn is_constructing(&self) -> bool {
        self.as_building().is_some_and(Building::is_constructing)
    }

    /// Buildings can be constructed; units arrive complete.
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        matches!(self.kind, EntityKind::Building(_))
    }

    /// Only units move.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        matches!(self.kind, EntityKind::Unit(_))
    }

    /// Factories carry a production queue.
    #[must_use]
    pub fn has_production_queue(&self) -> bool {
        self.as_building()
            .is_some_and(|b| matches!(b.role, BuildingRole::Factory(_)))
    }

    /// Units and turrets can fire.
    #[must_use]
    pub fn is_combat_capable(&self) -> bool {
        match &self.kind {
            EntityKind::Unit(_) => true,
            EntityKind::Building(b) => matches!(b.role, BuildingRole::Turret { .. }),
        }
    }

    /// Flying units. Buildings are always on the ground.
    #[must_use]
    pub fn is_aerial(&self) -> bool {
        self.as_unit().is_some_and(|u| u.stats.aerial)
    }

    /// Whether the owning side treats this as a resource producer.
    #[must_use]
    pub fn is_resource_producer(&self) -> bool {
        self.building_type()
            .is_some_and(BuildingType::is_resource_producer)
    }
}

/// Visual tag of a projectile. Has no effect on the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Fired by a unit weapon.
    Weapon(WeaponType),
    /// Fired by a turret.
    Turret,
}

/// An in-flight shot homing on an entity.
///
/// A projectile whose target no longer exists is discarded without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique identifier.
    pub id: ProjectileId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Entity the projectile homes on.
    pub target: EntityId,
    /// Travel per tick; also the hit threshold.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage on arrival.
    pub damage: u32,
    /// Visual tag.
    pub kind: ProjectileKind,
}
