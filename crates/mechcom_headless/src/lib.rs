//! Headless skirmish runner for scripted play, AI testing and CI verification.
//!
//! This crate drives the simulation without graphics, controlled via JSON
//! commands on stdin, with responses and state on stdout. This enables:
//!
//! - **AI testing**: A controller can play the game without graphics
//! - **CI verification**: Automated checks of game logic and determinism
//! - **Batch runs**: Play a scenario across many seeds in parallel
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, build, order, select, etc.)
//! - **stdout**: Acknowledgements, rejections and state (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p mechcom_headless -- run
//!
//! # Run a scenario for ten minutes of game time
//! cargo run -p mechcom_headless -- simulate --scenario crates/mechcom_headless/scenarios/skirmish.ron --ticks 36000
//!
//! # Verify determinism
//! cargo run -p mechcom_headless -- verify --runs 8
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::Scenario;
