//! Per-faction special technology.

use serde::{Deserialize, Serialize};

use super::unit_data::{ChassisType, WeaponType};
use crate::factions::FactionId;

/// The signature weapon and chassis a faction unlocks.
///
/// Specials belonging to other factions are never offered.
///
/// # Example RON
///
/// ```ron
/// FactionSpecial(faction: Quadrumm, weapon: Lightning, chassis: Bipedal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactionSpecial {
    /// Owning faction.
    pub faction: FactionId,
    /// Signature weapon.
    pub weapon: WeaponType,
    /// Signature chassis.
    pub chassis: ChassisType,
}

impl FactionSpecial {
    /// The built-in special for a faction.
    #[must_use]
    pub const fn standard(faction: FactionId) -> Self {
        let (weapon, chassis) = match faction {
            FactionId::Quadrumm => (WeaponType::Lightning, ChassisType::Bipedal),
            FactionId::Trionic => (WeaponType::Plasma, ChassisType::HoverWheels),
            FactionId::Sphenix => (WeaponType::Laser, ChassisType::HoverTracks),
        };
        Self {
            faction,
            weapon,
            chassis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specials_are_distinct() {
        let specials: Vec<_> = FactionId::ALL.map(FactionSpecial::standard).to_vec();
        for (i, a) in specials.iter().enumerate() {
            for b in &specials[i + 1..] {
                assert_ne!(a.weapon, b.weapon);
                assert_ne!(a.chassis, b.chassis);
            }
        }
    }
}
