//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Intents from the controller
//! **Output (stdout):** Acknowledgements, rejections and state snapshots
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every line; state is sent on `query` (or after each
//!    `tick` with auto-state enabled)
//! 4. When the match is decided, outputs `{"type":"game_over","result":"victory"|"defeat"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"build","building":"Factory"}
//! <- {"type":"ack","cmd":"build","entity":3,"money":450}
//! -> {"cmd":"queue_unit","weapon":"Cannon","chassis":"Tracks"}
//! <- {"type":"rejected","cmd":"queue_unit","reason":"No completed factory available"}
//! -> {"cmd":"tick","count":900}
//! <- {"type":"ack","cmd":"tick","money":500}
//! -> {"cmd":"query"}
//! <- {"type":"state","tick":900,...}
//! ```
//!
//! World coordinates cross the boundary as plain decimals.

use mechcom_core::commands::{Command as Intent, CommandOutcome, Viewport};
use mechcom_core::components::{EntityId, EntityKind};
use mechcom_core::data::{BuildingType, Catalog, ChassisType, WeaponType};
use mechcom_core::lifecycle::Outcome;
use mechcom_core::math::{Fixed, Vec2Fixed};
use mechcom_core::production::BuildingRole;
use mechcom_core::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current game state without advancing time.
    Query,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Place a building next to the player's base.
    Build { building: BuildingType },

    /// Queue a unit; the price comes from the catalog.
    QueueUnit {
        weapon: WeaponType,
        chassis: ChassisType,
    },

    /// Repair the inspected entity.
    Repair,

    /// Sell the inspected entity.
    Sell,

    /// Arm rally placement for the selected factory.
    SetRally,

    /// Refund and empty the selected factory's queue.
    ClearQueue,

    /// Right click at a world position.
    Order { x: f64, y: f64 },

    /// Left click at a world position.
    Select {
        x: f64,
        y: f64,
        #[serde(default)]
        double: bool,
    },

    /// Click on the minimap, as fractions of the map size.
    Minimap { x: f64, y: f64 },

    /// Report the visible world size.
    Viewport { width: f64, height: f64 },

    /// Set player money.
    SetMoney { amount: i32 },

    /// Quit the runner.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

/// Why a protocol command could not be turned into a simulation intent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    /// A coordinate was NaN or outside the fixed-point range.
    #[error("coordinate {0} is out of range")]
    OutOfRange(String),
    /// The catalog has no price for the composition.
    #[error("unknown composition {weapon:?} on {chassis:?}")]
    UnknownComposition {
        weapon: WeaponType,
        chassis: ChassisType,
    },
}

fn fixed(value: f64) -> Result<Fixed, IntentError> {
    if !value.is_finite() {
        return Err(IntentError::OutOfRange(value.to_string()));
    }
    Fixed::checked_from_num(value).ok_or_else(|| IntentError::OutOfRange(value.to_string()))
}

/// Convert a decimal world position.
pub fn world_point(x: f64, y: f64) -> Result<Vec2Fixed, IntentError> {
    Ok(Vec2Fixed::new(fixed(x)?, fixed(y)?))
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Build { .. } => "build",
            Self::QueueUnit { .. } => "queue_unit",
            Self::Repair => "repair",
            Self::Sell => "sell",
            Self::SetRally => "set_rally",
            Self::ClearQueue => "clear_queue",
            Self::Order { .. } => "order",
            Self::Select { .. } => "select",
            Self::Minimap { .. } => "minimap",
            Self::Viewport { .. } => "viewport",
            Self::SetMoney { .. } => "set_money",
            Self::Quit => "quit",
        }
    }

    /// The simulation intent this command stands for.
    ///
    /// Runner controls (`tick`, `query`, `hash`, `set_money`, `quit`) have
    /// none and return `Ok(None)`.
    pub fn to_intent(&self, catalog: &Catalog) -> Result<Option<Intent>, IntentError> {
        let intent = match *self {
            Self::Build { building } => Intent::BuildBuilding(building),
            Self::QueueUnit { weapon, chassis } => Intent::QueueUnit(
                catalog
                    .compose(weapon, chassis)
                    .ok_or(IntentError::UnknownComposition { weapon, chassis })?,
            ),
            Self::Repair => Intent::Repair,
            Self::Sell => Intent::Sell,
            Self::SetRally => Intent::SetRally,
            Self::ClearQueue => Intent::ClearQueue,
            Self::Order { x, y } => Intent::MoveOrRallyIntent(world_point(x, y)?),
            Self::Select { x, y, double } => Intent::SelectAt {
                point: world_point(x, y)?,
                double_click: double,
            },
            Self::Minimap { x, y } => Intent::MinimapPan {
                x: fixed(x)?,
                y: fixed(y)?,
            },
            Self::Viewport { width, height } => Intent::SetViewport {
                width: fixed(width)?,
                height: fixed(height)?,
            },
            Self::Tick { .. } | Self::Query | Self::Hash | Self::SetMoney { .. } | Self::Quit => {
                return Ok(None)
            }
        };
        Ok(Some(intent))
    }
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, tick: u64 },

    /// Command accepted.
    Ack {
        cmd: String,
        /// Entity the command affected, when there is one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity: Option<EntityId>,
        /// Player money afterwards.
        money: i32,
    },

    /// The simulation declined the intent. State is unchanged.
    Rejected { cmd: String, reason: String },

    /// The line could not be processed at all.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current game state.
    State(StateView),

    /// The match has been decided.
    GameOver { result: GameResult, tick: u64 },

    /// State hash for determinism verification.
    StateHash { tick: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Published state with decimal coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub tick: u64,
    pub money: i32,
    pub unit_count: u32,
    pub unit_cap: u32,
    pub selected: Vec<EntityId>,
    pub inspected: Option<EntityId>,
    pub rally_armed: bool,
    pub owned_buildings: Vec<BuildingType>,
    pub zones: Vec<ZoneState>,
    pub entities: Vec<EntityState>,
    pub projectiles: Vec<ProjectileState>,
    pub viewport: ViewportState,
    pub status: GameStatus,
    pub hash: u64,
}

/// State of a single zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub owner: u8,
    pub resources: u32,
    pub capture_progress: u32,
    pub contested: bool,
}

/// State of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub x: f64,
    pub y: f64,
    pub owner: u8,
    pub health: HealthState,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_target: Option<(f64, f64)>,
    /// Construction progress in `[0, 1]` while building.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rally_point: Option<(f64, f64)>,
}

/// Type of entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Unit {
        weapon: WeaponType,
        chassis: ChassisType,
    },
    Building {
        building: BuildingType,
    },
}

/// Health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub current: u32,
    pub max: u32,
}

/// An in-flight projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub target: EntityId,
}

/// Visible world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Current game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Victory,
    Defeat,
}

/// Game result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Victory,
    Defeat,
}

impl From<Outcome> for GameStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Undecided => Self::InProgress,
            Outcome::Victory => Self::Victory,
            Outcome::Defeat => Self::Defeat,
        }
    }
}

impl GameResult {
    /// The result of a decided match.
    pub fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Undecided => None,
            Outcome::Victory => Some(Self::Victory),
            Outcome::Defeat => Some(Self::Defeat),
        }
    }
}

fn decimal(value: Fixed) -> f64 {
    value.to_num()
}

fn point(value: Vec2Fixed) -> (f64, f64) {
    (decimal(value.x), decimal(value.y))
}

impl From<Viewport> for ViewportState {
    fn from(viewport: Viewport) -> Self {
        Self {
            x: decimal(viewport.origin.x),
            y: decimal(viewport.origin.y),
            width: decimal(viewport.size.x),
            height: decimal(viewport.size.y),
        }
    }
}

impl StateView {
    /// Convert a snapshot for the wire.
    pub fn from_snapshot(snapshot: &Snapshot, hash: u64) -> Self {
        let zones = snapshot
            .zones
            .iter()
            .map(|z| ZoneState {
                id: z.id,
                x: decimal(z.center.x),
                y: decimal(z.center.y),
                radius: decimal(z.radius),
                owner: z.owner.code(),
                resources: z.resources_left,
                capture_progress: z.capture_progress,
                contested: z.contested,
            })
            .collect();

        let entities = snapshot
            .entities
            .iter()
            .map(|e| {
                let mut state = EntityState {
                    id: e.id,
                    entity_type: EntityType::Building {
                        building: BuildingType::Refinery,
                    },
                    x: decimal(e.position.x),
                    y: decimal(e.position.y),
                    owner: e.owner.code(),
                    health: HealthState {
                        current: e.health.current,
                        max: e.health.max,
                    },
                    state: format!("{:?}", e.state).to_lowercase(),
                    move_target: None,
                    progress: None,
                    queue_len: None,
                    rally_point: None,
                };
                match &e.kind {
                    EntityKind::Unit(unit) => {
                        state.entity_type = EntityType::Unit {
                            weapon: unit.composition.weapon,
                            chassis: unit.composition.chassis,
                        };
                        state.move_target = unit.move_target.map(point);
                    }
                    EntityKind::Building(building) => {
                        state.entity_type = EntityType::Building {
                            building: building.building_type,
                        };
                        if building.is_constructing() {
                            state.progress = Some(building.construction_fraction());
                        }
                        if let BuildingRole::Factory(factory) = &building.role {
                            state.queue_len = Some(factory.queue.len());
                            state.rally_point = factory.rally_point.map(point);
                        }
                    }
                }
                state
            })
            .collect();

        let projectiles = snapshot
            .projectiles
            .iter()
            .map(|p| ProjectileState {
                id: p.id,
                x: decimal(p.position.x),
                y: decimal(p.position.y),
                target: p.target,
            })
            .collect();

        Self {
            tick: snapshot.tick,
            money: snapshot.money,
            unit_count: snapshot.unit_count,
            unit_cap: snapshot.unit_cap,
            selected: snapshot.selected.clone(),
            inspected: snapshot.inspected,
            rally_armed: snapshot.rally_armed,
            owned_buildings: snapshot.owned_buildings.clone(),
            zones,
            entities,
            projectiles,
            viewport: snapshot.viewport.into(),
            status: snapshot.outcome.into(),
            hash,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// The entity an accepted command acted on, if any.
pub fn outcome_entity(outcome: &CommandOutcome) -> Option<EntityId> {
    match outcome {
        CommandOutcome::BuildingPlaced { building, .. } => Some(*building),
        CommandOutcome::UnitQueued { factory, .. }
        | CommandOutcome::RallyPointSet { factory, .. }
        | CommandOutcome::QueueCleared { factory, .. } => Some(*factory),
        CommandOutcome::Repaired { entity, .. } | CommandOutcome::Sold { entity, .. } => {
            Some(*entity)
        }
        CommandOutcome::Ordered { target, .. } => *target,
        CommandOutcome::Selected {
            selected,
            inspected,
        } => selected.first().copied().or(*inspected),
        CommandOutcome::RallyArmed | CommandOutcome::ViewportChanged(_) => None,
    }
}

impl Response {
    /// Create a ready response.
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, entity: Option<EntityId>, money: i32) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            entity,
            money,
        }
    }

    /// Create a rejection.
    pub fn rejected(cmd: &str, reason: impl ToString) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechcom_core::simulation::Simulation;

    #[test]
    fn test_parse_tick_command() {
        let json = r#"{"cmd":"tick","count":60}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Tick { count: 60 }));
    }

    #[test]
    fn test_default_tick_count() {
        let json = r#"{"cmd":"tick"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(cmd, Command::Tick { count: 1 }));
    }

    #[test]
    fn test_parse_build_command() {
        let cmd = Command::from_json(r#"{"cmd":"build","building":"Factory"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Build {
                building: BuildingType::Factory
            }
        );
        assert_eq!(cmd.name(), "build");
    }

    #[test]
    fn test_select_defaults_to_single_click() {
        let cmd = Command::from_json(r#"{"cmd":"select","x":250.0,"y":250.0}"#).unwrap();
        let intent = cmd.to_intent(&Catalog::standard()).unwrap();
        assert_eq!(
            intent,
            Some(Intent::SelectAt {
                point: Vec2Fixed::from_ints(250, 250),
                double_click: false,
            })
        );
    }

    #[test]
    fn test_queue_unit_priced_by_catalog() {
        let catalog = Catalog::standard();
        let cmd = Command::QueueUnit {
            weapon: WeaponType::Cannon,
            chassis: ChassisType::Tracks,
        };
        let Some(Intent::QueueUnit(composition)) = cmd.to_intent(&catalog).unwrap() else {
            panic!("expected a queue intent");
        };
        assert_eq!(composition.cost, 100);
    }

    #[test]
    fn test_controls_have_no_intent() {
        let catalog = Catalog::standard();
        for cmd in [
            Command::Query,
            Command::Hash,
            Command::Quit,
            Command::SetMoney { amount: 5 },
        ] {
            assert_eq!(cmd.to_intent(&catalog).unwrap(), None);
        }
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let cmd = Command::Order {
            x: f64::NAN,
            y: 0.0,
        };
        assert!(matches!(
            cmd.to_intent(&Catalog::standard()),
            Err(IntentError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_state_uses_decimal_coordinates() {
        let sim = Simulation::skirmish_default();
        let view = StateView::from_snapshot(&sim.snapshot(), sim.state_hash());
        let json = Response::State(view.clone()).to_json_line();
        assert!(json.contains(r#""type":"state""#));
        assert_eq!(view.zones[0].x, 200.0);
        assert_eq!(view.entities[0].x, 250.0);
        assert_eq!(view.status, GameStatus::InProgress);
    }

    #[test]
    fn test_rejected_response_format() {
        let json = Response::rejected("sell", "Nothing is inspected").to_json_line();
        assert_eq!(
            json,
            "{\"type\":\"rejected\",\"cmd\":\"sell\",\"reason\":\"Nothing is inspected\"}\n"
        );
    }
}
