//! Zones, capture and refinery income.
//!
//! Zones are fixed circular areas holding a depletable resource. Ground
//! units standing in a zone push its capture progress; refineries standing
//! in a zone their owner holds withdraw from it on a fixed cycle.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::components::{ActivityState, EntityId};
use crate::config::{money, SimConfig};
use crate::error::{GameError, Result};
use crate::factions::Owner;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::production::BuildingRole;
use crate::simulation::EntityStorage;

/// Zone identifier, assigned in creation order starting at 0.
pub type ZoneId = u32;

/// A capturable resource zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    /// Unique identifier.
    pub id: ZoneId,
    /// Centre of the zone.
    pub center: Vec2Fixed,
    /// Radius of the zone.
    #[serde(with = "fixed_serde")]
    pub radius: Fixed,
    /// Resources still extractable. Never increases.
    pub resources_left: u32,
    /// Current owner.
    pub owner: Owner,
    /// Uncontested occupancy ticks, in `[0, capture threshold]`.
    pub capture_progress: u32,
    /// Both sides currently hold ground units in the zone.
    pub contested: bool,
}

impl Zone {
    /// Create an uncontested zone with no capture progress.
    #[must_use]
    pub const fn new(
        id: ZoneId,
        center: Vec2Fixed,
        radius: Fixed,
        resources_left: u32,
        owner: Owner,
    ) -> Self {
        Self {
            id,
            center,
            radius,
            resources_left,
            owner,
            capture_progress: 0,
            contested: false,
        }
    }

    /// Strict containment used for occupancy and refinery placement.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        point.distance_squared(self.center) < self.radius.saturating_mul(self.radius)
    }

    /// Withdraw up to `amount`, returning what was actually taken.
    pub fn extract(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.resources_left);
        self.resources_left -= taken;
        taken
    }

    /// Whether anything is left to mine.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.resources_left == 0
    }
}

/// Money and unit cap of the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerEconomy {
    /// Current money. Never negative.
    pub money: i32,
    /// Unit cap published by the last production pass.
    pub max_units: u32,
}

impl PlayerEconomy {
    /// Create a new player economy with initial values.
    #[must_use]
    pub const fn new(money: i32, max_units: u32) -> Self {
        Self { money, max_units }
    }

    /// Check if player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.money >= cost
    }

    /// Spend money if available.
    pub fn spend(&mut self, cost: i32) -> Result<()> {
        if !self.can_afford(cost) {
            return Err(GameError::InsufficientResources {
                required: cost,
                available: self.money,
            });
        }
        self.money -= cost;
        Ok(())
    }

    /// Add money.
    pub fn deposit(&mut self, amount: i32) {
        self.money = self.money.saturating_add(amount);
    }
}

/// Events generated by the zone and mining systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// Zone ownership changed.
    ZoneCaptured {
        /// The zone.
        zone: ZoneId,
        /// Previous owner.
        from: Owner,
        /// New owner.
        to: Owner,
    },
    /// A refinery completed a mining cycle.
    Mined {
        /// The refinery.
        refinery: EntityId,
        /// The zone it mined.
        zone: ZoneId,
        /// Owner of the refinery.
        owner: Owner,
        /// Resources withdrawn.
        amount: u32,
    },
}

/// Advance capture progress of every zone.
///
/// `occupants` lists the owner and position of every ground unit; aerial
/// units must be filtered out by the caller. A single side present in a zone
/// it does not own pushes progress by one and takes the zone at
/// `config.zone_capture_time`. An empty zone decays towards zero. A
/// contested zone does not change.
pub fn zone_capture_system(
    zones: &mut [Zone],
    occupants: &[(Owner, Vec2Fixed)],
    config: &SimConfig,
) -> Vec<EconomyEvent> {
    let mut events = Vec::new();

    for zone in zones.iter_mut() {
        let mut player_present = false;
        let mut opponent_present = false;
        for (owner, position) in occupants {
            if !zone.contains(*position) {
                continue;
            }
            match owner {
                Owner::Player => player_present = true,
                Owner::Opponent => opponent_present = true,
                Owner::Neutral => {}
            }
        }

        zone.contested = player_present && opponent_present;

        let claimant = match (player_present, opponent_present) {
            (true, false) => Some(Owner::Player),
            (false, true) => Some(Owner::Opponent),
            (true, true) => continue,
            (false, false) => None,
        };

        match claimant {
            Some(side) if side != zone.owner => {
                zone.capture_progress = (zone.capture_progress + 1).min(config.zone_capture_time);
                if zone.capture_progress >= config.zone_capture_time {
                    let from = zone.owner;
                    zone.owner = side;
                    zone.capture_progress = 0;
                    info!(zone = zone.id, ?from, to = ?side, "Zone captured");
                    events.push(EconomyEvent::ZoneCaptured {
                        zone: zone.id,
                        from,
                        to: side,
                    });
                }
            }
            Some(_) => {}
            None => zone.capture_progress = zone.capture_progress.saturating_sub(1),
        }
    }

    events
}

/// Run one mining tick for every completed refinery.
///
/// A refinery mines the first zone that contains it, provided its owner
/// holds the zone and the zone is not depleted. Each refinery keeps its own
/// cycle timer. Only the local player is credited; the opponent's income is
/// not modelled.
pub fn mining_system(
    entities: &mut EntityStorage,
    ids: &[EntityId],
    zones: &mut [Zone],
    economy: &mut PlayerEconomy,
    config: &SimConfig,
) -> Vec<EconomyEvent> {
    let mut events = Vec::new();

    for &id in ids {
        let Some(entity) = entities.get_mut(id) else {
            continue;
        };
        if entity.is_constructing()
            || !matches!(entity.state, ActivityState::Idle | ActivityState::Mining)
        {
            continue;
        }
        let owner = entity.owner;
        let position = entity.position;
        let Some(building) = entity.as_building_mut() else {
            continue;
        };
        let BuildingRole::Refinery { extraction_timer } = &mut building.role else {
            continue;
        };

        let zone = zones
            .iter_mut()
            .find(|z| z.contains(position))
            .filter(|z| z.owner == owner && !z.is_depleted());
        let Some(zone) = zone else {
            entity.state = ActivityState::Idle;
            continue;
        };

        *extraction_timer += 1;
        let cycle_done = *extraction_timer >= config.mining_interval;
        if cycle_done {
            *extraction_timer = 0;
        }
        entity.state = ActivityState::Mining;
        if !cycle_done {
            continue;
        }

        let amount = zone.extract(config.mining_rate);
        if owner == Owner::Player {
            economy.deposit(money(amount));
        }
        debug!(refinery = id, zone = zone.id, amount, left = zone.resources_left, "Mined");
        events.push(EconomyEvent::Mined {
            refinery: id,
            zone: zone.id,
            owner,
            amount,
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Entity, Health};
    use crate::data::BuildingType;
    use crate::production::Building;

    fn zone_at(x: i32, y: i32, owner: Owner, resources: u32) -> Zone {
        Zone::new(1, Vec2Fixed::from_ints(x, y), Fixed::from_num(150), resources, owner)
    }

    fn fast_capture() -> SimConfig {
        SimConfig {
            zone_capture_time: 3,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_economy_spend() {
        let mut economy = PlayerEconomy::new(100, 5);
        assert!(economy.spend(60).is_ok());
        assert_eq!(economy.money, 40);
        assert_eq!(
            economy.spend(50),
            Err(GameError::InsufficientResources {
                required: 50,
                available: 40
            })
        );
        assert_eq!(economy.money, 40);
    }

    #[test]
    fn test_zone_extract_floors_at_zero() {
        let mut zone = zone_at(0, 0, Owner::Player, 30);
        assert_eq!(zone.extract(50), 30);
        assert!(zone.is_depleted());
        assert_eq!(zone.extract(50), 0);
    }

    #[test]
    fn test_capture_transfers_at_threshold() {
        let config = fast_capture();
        let mut zones = [zone_at(0, 0, Owner::Neutral, 1000)];
        let occupants = [(Owner::Player, Vec2Fixed::from_ints(10, 10))];

        assert!(zone_capture_system(&mut zones, &occupants, &config).is_empty());
        assert!(zone_capture_system(&mut zones, &occupants, &config).is_empty());
        assert_eq!(zones[0].capture_progress, 2);

        let events = zone_capture_system(&mut zones, &occupants, &config);
        assert_eq!(
            events,
            vec![EconomyEvent::ZoneCaptured {
                zone: 1,
                from: Owner::Neutral,
                to: Owner::Player
            }]
        );
        assert_eq!(zones[0].owner, Owner::Player);
        assert_eq!(zones[0].capture_progress, 0);

        // Holding an owned zone changes nothing.
        zone_capture_system(&mut zones, &occupants, &config);
        assert_eq!(zones[0].capture_progress, 0);
    }

    #[test]
    fn test_contested_zone_freezes_progress() {
        let config = fast_capture();
        let mut zones = [zone_at(0, 0, Owner::Neutral, 1000)];
        zone_capture_system(&mut zones, &[(Owner::Player, Vec2Fixed::ZERO)], &config);
        assert_eq!(zones[0].capture_progress, 1);

        let both = [
            (Owner::Player, Vec2Fixed::ZERO),
            (Owner::Opponent, Vec2Fixed::from_ints(5, 5)),
        ];
        for _ in 0..5 {
            zone_capture_system(&mut zones, &both, &config);
        }
        assert!(zones[0].contested);
        assert_eq!(zones[0].capture_progress, 1);
        assert_eq!(zones[0].owner, Owner::Neutral);
    }

    #[test]
    fn test_empty_zone_decays() {
        let config = fast_capture();
        let mut zones = [zone_at(0, 0, Owner::Neutral, 1000)];
        zones[0].capture_progress = 2;
        zones[0].contested = true;
        zone_capture_system(&mut zones, &[], &config);
        assert_eq!(zones[0].capture_progress, 1);
        assert!(!zones[0].contested);
        zone_capture_system(&mut zones, &[], &config);
        zone_capture_system(&mut zones, &[], &config);
        assert_eq!(zones[0].capture_progress, 0);
    }

    #[test]
    fn test_occupancy_is_strict() {
        let config = fast_capture();
        let mut zones = [zone_at(0, 0, Owner::Neutral, 1000)];
        zone_capture_system(
            &mut zones,
            &[(Owner::Player, Vec2Fixed::from_ints(150, 0))],
            &config,
        );
        assert_eq!(zones[0].capture_progress, 0);
    }

    fn refinery(entities: &mut EntityStorage, owner: Owner, position: Vec2Fixed) -> EntityId {
        entities.insert(Entity::building(
            owner,
            position,
            Fixed::from_num(40),
            Building::constructed(BuildingType::Refinery),
            Health::new(150),
        ))
    }

    #[test]
    fn test_refinery_mines_on_interval() {
        let config = SimConfig::default();
        let mut entities = EntityStorage::new();
        let id = refinery(&mut entities, Owner::Player, Vec2Fixed::from_ints(10, 0));
        let mut zones = [zone_at(0, 0, Owner::Player, 500)];
        let mut economy = PlayerEconomy::new(0, 5);

        for _ in 0..config.mining_interval - 1 {
            let events = mining_system(&mut entities, &[id], &mut zones, &mut economy, &config);
            assert!(events.is_empty());
        }
        assert_eq!(entities.get(id).unwrap().state, ActivityState::Mining);
        let events = mining_system(&mut entities, &[id], &mut zones, &mut economy, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(zones[0].resources_left, 450);
        assert_eq!(economy.money, 50);
    }

    #[test]
    fn test_refinery_on_foreign_zone_does_not_mine() {
        let config = SimConfig {
            mining_interval: 1,
            ..SimConfig::default()
        };
        let mut entities = EntityStorage::new();
        let id = refinery(&mut entities, Owner::Player, Vec2Fixed::ZERO);
        let mut zones = [zone_at(0, 0, Owner::Opponent, 500)];
        let mut economy = PlayerEconomy::new(0, 5);

        mining_system(&mut entities, &[id], &mut zones, &mut economy, &config);
        assert_eq!(zones[0].resources_left, 500);
        assert_eq!(economy.money, 0);
        assert_eq!(entities.get(id).unwrap().state, ActivityState::Idle);
    }

    #[test]
    fn test_each_refinery_taxes_the_zone() {
        let config = SimConfig {
            mining_interval: 1,
            ..SimConfig::default()
        };
        let mut entities = EntityStorage::new();
        let a = refinery(&mut entities, Owner::Player, Vec2Fixed::ZERO);
        let b = refinery(&mut entities, Owner::Player, Vec2Fixed::from_ints(20, 0));
        let mut zones = [zone_at(0, 0, Owner::Player, 70)];
        let mut economy = PlayerEconomy::new(0, 5);

        mining_system(&mut entities, &[a, b], &mut zones, &mut economy, &config);
        assert_eq!(zones[0].resources_left, 0);
        // Second refinery only found 20 left.
        assert_eq!(economy.money, 70);
    }

    #[test]
    fn test_opponent_mining_is_not_credited() {
        let config = SimConfig {
            mining_interval: 1,
            ..SimConfig::default()
        };
        let mut entities = EntityStorage::new();
        let id = refinery(&mut entities, Owner::Opponent, Vec2Fixed::ZERO);
        let mut zones = [zone_at(0, 0, Owner::Opponent, 500)];
        let mut economy = PlayerEconomy::new(0, 5);

        mining_system(&mut entities, &[id], &mut zones, &mut economy, &config);
        assert_eq!(zones[0].resources_left, 450);
        assert_eq!(economy.money, 0);
    }
}
