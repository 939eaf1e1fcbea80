//! Removal of destroyed entities and win/loss evaluation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::SelectionState;
use crate::components::EntityId;
use crate::factions::Owner;
use crate::simulation::EntityStorage;

/// Result of the match from the local player's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Both sides still hold something.
    #[default]
    Undecided,
    /// The opponent has been eliminated.
    Victory,
    /// The player has been eliminated.
    Defeat,
}

impl Outcome {
    /// Whether the match has ended.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Undecided)
    }
}

/// Remove every entity at zero health and forget it in the selection.
///
/// Returns the removed ids in ascending order.
pub fn cleanup_system(entities: &mut EntityStorage, selection: &mut SelectionState) -> Vec<EntityId> {
    let dead: Vec<EntityId> = entities
        .sorted_ids()
        .into_iter()
        .filter(|&id| entities.get(id).is_some_and(|e| e.health.is_dead()))
        .collect();

    for &id in &dead {
        if let Some(entity) = entities.remove(id) {
            debug!(entity = id, owner = ?entity.owner, subtype = ?entity.subtype(), "Destroyed");
        }
        selection.forget(id);
    }

    dead
}

/// Per-side holdings used by the elimination check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Holdings {
    /// Resource-producing buildings, finished or not.
    pub resource_buildings: u32,
    /// Entities of any kind.
    pub entities: u32,
}

impl Holdings {
    /// Count what one owner still holds.
    #[must_use]
    pub fn of(entities: &EntityStorage, owner: Owner) -> Self {
        let mut holdings = Self::default();
        for (_, entity) in entities.iter().filter(|(_, e)| e.owner == owner) {
            holdings.entities += 1;
            if entity.is_resource_producer() {
                holdings.resource_buildings += 1;
            }
        }
        holdings
    }

    /// A side is out once it has no resource building and nothing else left.
    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        self.resource_buildings == 0 && self.entities == 0
    }
}

/// Evaluate elimination, the player first.
#[must_use]
pub fn evaluate_outcome(entities: &EntityStorage) -> Outcome {
    if Holdings::of(entities, Owner::Player).is_eliminated() {
        Outcome::Defeat
    } else if Holdings::of(entities, Owner::Opponent).is_eliminated() {
        Outcome::Victory
    } else {
        Outcome::Undecided
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Entity, Health, Unit, UnitStats};
    use crate::data::{BuildingType, Catalog, ChassisType, WeaponType};
    use crate::math::{Fixed, Vec2Fixed};
    use crate::production::Building;

    fn unit(owner: Owner) -> Entity {
        let catalog = Catalog::standard();
        let w = catalog.weapon(WeaponType::Gatling).unwrap();
        let c = catalog.chassis(ChassisType::Wheels).unwrap();
        let comp = catalog.compose(WeaponType::Gatling, ChassisType::Wheels).unwrap();
        Entity::unit(
            owner,
            Vec2Fixed::ZERO,
            Fixed::from_num(12),
            Unit::new(comp, UnitStats::from_catalog(w, c)),
            c.armor,
        )
    }

    fn refinery(owner: Owner) -> Entity {
        Entity::building(
            owner,
            Vec2Fixed::ZERO,
            Fixed::from_num(40),
            Building::constructed(BuildingType::Refinery),
            Health::new(150),
        )
    }

    #[test]
    fn test_cleanup_removes_dead_and_prunes_selection() {
        let mut entities = EntityStorage::new();
        let alive = entities.insert(unit(Owner::Player));
        let doomed = entities.insert(unit(Owner::Player));
        entities.get_mut(doomed).unwrap().health.current = 0;

        let mut selection = SelectionState {
            selected: vec![alive, doomed],
            inspected: Some(doomed),
            rally_armed: false,
        };
        let dead = cleanup_system(&mut entities, &mut selection);
        assert_eq!(dead, vec![doomed]);
        assert!(!entities.contains(doomed));
        assert_eq!(selection.selected, vec![alive]);
        assert_eq!(selection.inspected, None);
    }

    #[test]
    fn test_units_without_refinery_are_not_defeated() {
        let mut entities = EntityStorage::new();
        entities.insert(unit(Owner::Player));
        entities.insert(refinery(Owner::Opponent));
        assert_eq!(evaluate_outcome(&entities), Outcome::Undecided);
    }

    #[test]
    fn test_elimination() {
        let mut entities = EntityStorage::new();
        entities.insert(refinery(Owner::Player));
        assert_eq!(evaluate_outcome(&entities), Outcome::Victory);

        let mut empty = EntityStorage::new();
        empty.insert(refinery(Owner::Opponent));
        assert_eq!(evaluate_outcome(&empty), Outcome::Defeat);
    }

    #[test]
    fn test_player_checked_first() {
        assert_eq!(evaluate_outcome(&EntityStorage::new()), Outcome::Defeat);
    }
}
