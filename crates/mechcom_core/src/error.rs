//! Error types for the game simulation.
//!
//! Almost every variant describes a declined intent: the command had no
//! effect and the caller may simply try again later. Data errors are only
//! produced while loading the catalog or configuration.

use thiserror::Error;

use crate::components::EntityId;
use crate::data::{BuildingType, UnitPart};
use crate::factions::FactionId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Catalog failed validation.
    #[error("Invalid catalog: {}", .0.join("; "))]
    InvalidCatalog(Vec<String>),

    /// Building prerequisite not owned.
    #[error("{building:?} requires a completed {required:?}")]
    TechRequirementNotMet {
        /// Building that was requested.
        building: BuildingType,
        /// Building that must be owned first.
        required: BuildingType,
    },

    /// Another faction's special part.
    #[error("{part:?} is not available to {faction:?}")]
    PartNotOffered {
        /// Part that was requested.
        part: UnitPart,
        /// Faction of the local player.
        faction: FactionId,
    },

    /// Part needs a building the player does not own yet.
    #[error("{part:?} requires a completed {required:?}")]
    PartLocked {
        /// Part that was requested.
        part: UnitPart,
        /// Building that unlocks it.
        required: BuildingType,
    },

    /// Insufficient money.
    #[error("Insufficient money: need {required}, have {available}")]
    InsufficientResources {
        /// Amount required.
        required: i32,
        /// Amount available.
        available: i32,
    },

    /// No reference building to place a new structure next to.
    #[error("No owned building to place next to")]
    NoPlacementAnchor,

    /// No completed factory can take the order.
    #[error("No completed factory available")]
    NoFactoryAvailable,

    /// Command needs an inspected entity.
    #[error("Nothing is inspected")]
    NothingInspected,

    /// Command needs a selection.
    #[error("Nothing is selected")]
    NothingSelected,

    /// Entity belongs to someone else.
    #[error("Entity {0} is not owned by the player")]
    NotOwned(EntityId),

    /// Entity has no production queue.
    #[error("Entity {0} has no production queue")]
    NotAProducer(EntityId),

    /// Entity is already at full health.
    #[error("Entity {0} is not damaged")]
    NotDamaged(EntityId),
}

impl GameError {
    /// Wrap a RON parse failure from an in-memory document.
    pub(crate) fn ron(label: &str, err: &ron::error::SpannedError) -> Self {
        Self::DataParseError {
            path: label.to_string(),
            message: err.to_string(),
        }
    }
}
