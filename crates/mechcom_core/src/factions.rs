//! Faction and ownership identifiers.

use serde::{Deserialize, Serialize};

/// Unique identifier for the playable factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FactionId {
    /// Quadrumm - heavy walkers and chain lightning.
    #[default]
    Quadrumm,
    /// Trionic - hover wheels and plasma.
    Trionic,
    /// Sphenix - hover tracks and lasers.
    Sphenix,
}

impl FactionId {
    /// All factions in selection order.
    pub const ALL: [Self; 3] = [Self::Quadrumm, Self::Trionic, Self::Sphenix];

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Quadrumm => "Quadrumm",
            Self::Trionic => "Trionic",
            Self::Sphenix => "Sphenix",
        }
    }
}

/// Who controls an entity or zone.
///
/// Ownership is exclusive: every entity and zone has exactly one owner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Owner {
    /// Nobody. Zones start here; neutral entities are never attacked.
    #[default]
    Neutral,
    /// The local player.
    Player,
    /// The opposing side.
    Opponent,
}

impl Owner {
    /// Wire value used by collaborators (`0`, `1`, `2`).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Neutral => 0,
            Self::Player => 1,
            Self::Opponent => 2,
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Neutral),
            1 => Some(Self::Player),
            2 => Some(Self::Opponent),
            _ => None,
        }
    }

    /// Whether `other` is a hostile side from this owner's point of view.
    ///
    /// Neutral is never hostile and never hostile to anyone.
    #[must_use]
    pub fn is_enemy_of(self, other: Self) -> bool {
        self != Self::Neutral && other != Self::Neutral && self != other
    }

    /// The opposing side, if this owner is a combatant.
    #[must_use]
    pub const fn opponent(self) -> Option<Self> {
        match self {
            Self::Player => Some(Self::Opponent),
            Self::Opponent => Some(Self::Player),
            Self::Neutral => None,
        }
    }
}
