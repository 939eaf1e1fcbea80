//! Movement, targeting, firing and projectiles.
//!
//! Every combat-capable entity is processed in ascending id order:
//! 1. Units with a move target step towards it and do not engage
//! 2. Units without one pick the closest valid enemy in weapon range
//! 3. Turrets pick the first enemy inside the fixed turret range
//! 4. A ready weapon fires a homing projectile and starts its cooldown
//!
//! Projectiles then advance in creation order and deal damage on arrival.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::components::{
    ActivityState, EntityId, EntityKind, Projectile, ProjectileId, ProjectileKind,
};
use crate::config::SimConfig;
use crate::data::TargetClass;
use crate::factions::Owner;
use crate::math::{Fixed, Vec2Fixed};
use crate::production::BuildingRole;
use crate::simulation::EntityStorage;

/// Events generated by the combat and projectile systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A weapon fired.
    ProjectileSpawned {
        /// Shooter.
        source: EntityId,
        /// Entity the projectile homes on.
        target: EntityId,
        /// The new projectile.
        projectile: ProjectileId,
    },
    /// A projectile arrived and dealt damage.
    ProjectileHit {
        /// The projectile.
        projectile: ProjectileId,
        /// Entity that was hit.
        target: EntityId,
        /// Damage dealt.
        damage: u32,
    },
    /// A projectile's target vanished in flight.
    ProjectileMissed {
        /// The projectile.
        projectile: ProjectileId,
        /// Entity that was targeted.
        target: EntityId,
    },
}

/// In-flight projectiles in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectileStorage {
    items: Vec<Projectile>,
    next_id: ProjectileId,
}

impl Default for ProjectileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectileStorage {
    /// Create empty projectile storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }

    /// Launch a projectile and return its id.
    pub fn spawn(
        &mut self,
        position: Vec2Fixed,
        target: EntityId,
        speed: Fixed,
        damage: u32,
        kind: ProjectileKind,
    ) -> ProjectileId {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Projectile {
            id,
            position,
            target,
            speed,
            damage,
            kind,
        });
        id
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.items.iter()
    }
}

/// Target information for combat lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    /// Entity ID.
    pub id: EntityId,
    /// Owner.
    pub owner: Owner,
    /// Current position.
    pub position: Vec2Fixed,
    /// Flying unit.
    pub aerial: bool,
    /// Building under construction.
    pub constructing: bool,
}

/// Closest valid enemy within `range` (inclusive).
///
/// Neutral and friendly entities, buildings under construction, and
/// entities the weapon's target class excludes are skipped. Ties go to the
/// first candidate in `targets` order.
#[must_use]
pub fn select_target(
    targets: &[TargetInfo],
    shooter: Owner,
    position: Vec2Fixed,
    range: Fixed,
    class: TargetClass,
) -> Option<EntityId> {
    let range_sq = range.saturating_mul(range);
    let mut best_target: Option<(EntityId, Fixed)> = None;

    for target in targets {
        if !shooter.is_enemy_of(target.owner)
            || target.constructing
            || !class.permits(target.aerial)
        {
            continue;
        }

        let dist_sq = position.distance_squared(target.position);
        if dist_sq <= range_sq {
            match best_target {
                None => best_target = Some((target.id, dist_sq)),
                Some((_, best_dist)) if dist_sq < best_dist => {
                    best_target = Some((target.id, dist_sq));
                }
                _ => {}
            }
        }
    }

    best_target.map(|(id, _)| id)
}

/// First enemy strictly inside `range`, in `targets` order.
///
/// Turrets also shoot at buildings under construction and at aircraft.
#[must_use]
pub fn select_turret_target(
    targets: &[TargetInfo],
    shooter: Owner,
    position: Vec2Fixed,
    range: Fixed,
) -> Option<EntityId> {
    let range_sq = range.saturating_mul(range);
    targets
        .iter()
        .find(|t| shooter.is_enemy_of(t.owner) && position.distance_squared(t.position) < range_sq)
        .map(|t| t.id)
}

/// Snapshot every entity as a potential target, in ascending id order.
#[must_use]
pub fn target_table(entities: &EntityStorage) -> Vec<TargetInfo> {
    entities
        .sorted_ids()
        .into_iter()
        .filter_map(|id| entities.get(id))
        .map(|e| TargetInfo {
            id: e.id,
            owner: e.owner,
            position: e.position,
            aerial: e.is_aerial(),
            constructing: e.is_constructing(),
        })
        .collect()
}

/// Run movement, targeting and firing for every combat-capable entity.
///
/// `ids` is the tick's processing order; `skip` lists buildings that
/// completed construction this tick. Positions of units that move are
/// visible to entities processed after them.
pub fn combat_system(
    entities: &mut EntityStorage,
    ids: &[EntityId],
    skip: &[EntityId],
    projectiles: &mut ProjectileStorage,
    config: &SimConfig,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    let mut targets = target_table(entities);

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

        match &mut entity.kind {
            EntityKind::Unit(unit) => {
                if let Some(destination) = unit.move_target {
                    let threshold = config.arrival_threshold;
                    if entity.position.distance_squared(destination)
                        < threshold.saturating_mul(threshold)
                    {
                        unit.move_target = None;
                        entity.state = ActivityState::Idle;
                    } else {
                        entity.position = entity
                            .position
                            .step_towards(destination, unit.stats.speed);
                        entity.state = ActivityState::Moving;
                        if let Ok(slot) = targets.binary_search_by_key(&id, |t| t.id) {
                            targets[slot].position = entity.position;
                        }
                    }
                }

                if unit.move_target.is_none() {
                    let stats = unit.stats;
                    let target = select_target(
                        &targets,
                        owner,
                        entity.position,
                        stats.range,
                        stats.target_class,
                    );
                    entity.state = if target.is_some() {
                        ActivityState::Attacking
                    } else {
                        ActivityState::Idle
                    };
                    if let Some(target) = target {
                        if unit.cooldown_remaining == 0 {
                            let projectile = projectiles.spawn(
                                entity.position,
                                target,
                                config.unit_projectile_speed,
                                stats.damage,
                                ProjectileKind::Weapon(unit.composition.weapon),
                            );
                            unit.cooldown_remaining = stats.cooldown;
                            trace!(source = id, target, projectile, "Unit fired");
                            events.push(CombatEvent::ProjectileSpawned {
                                source: id,
                                target,
                                projectile,
                            });
                        }
                    }
                }
                unit.cooldown_remaining = unit.cooldown_remaining.saturating_sub(1);
            }
            EntityKind::Building(building) => {
                let BuildingRole::Turret { cooldown_remaining } = &mut building.role else {
                    continue;
                };
                let target =
                    select_turret_target(&targets, owner, entity.position, config.turret_range);
                entity.state = if target.is_some() {
                    ActivityState::Attacking
                } else {
                    ActivityState::Idle
                };
                if let Some(target) = target {
                    if *cooldown_remaining == 0 {
                        let projectile = projectiles.spawn(
                            entity.position,
                            target,
                            config.turret_projectile_speed,
                            config.turret_damage,
                            ProjectileKind::Turret,
                        );
                        *cooldown_remaining = config.turret_cooldown;
                        trace!(source = id, target, projectile, "Turret fired");
                        events.push(CombatEvent::ProjectileSpawned {
                            source: id,
                            target,
                            projectile,
                        });
                    }
                }
                *cooldown_remaining = cooldown_remaining.saturating_sub(1);
            }
        }
    }

    events
}

/// Advance every projectile in creation order.
///
/// A projectile closer to its target than its speed hits and is removed.
/// A projectile whose target no longer exists is removed without effect.
pub fn projectile_system(
    entities: &mut EntityStorage,
    projectiles: &mut ProjectileStorage,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    projectiles.items.retain_mut(|projectile| {
        let Some(target) = entities.get_mut(projectile.target) else {
            events.push(CombatEvent::ProjectileMissed {
                projectile: projectile.id,
                target: projectile.target,
            });
            return false;
        };

        let dist_sq = projectile.position.distance_squared(target.position);
        if dist_sq < projectile.speed.saturating_mul(projectile.speed) {
            let damage = target.health.apply_damage(projectile.damage);
            events.push(CombatEvent::ProjectileHit {
                projectile: projectile.id,
                target: projectile.target,
                damage,
            });
            return false;
        }

        projectile.position = projectile
            .position
            .step_towards(target.position, projectile.speed);
        true
    });

    events
}
