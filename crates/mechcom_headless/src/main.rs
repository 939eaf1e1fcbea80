//! Headless skirmish runner.
//!
//! This binary runs the game without graphics, controlled via JSON on stdin/stdout.
//! Designed for AI agents, CI testing, and determinism verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p mechcom_headless
//!
//! # Interactive mode with a scenario, state after every tick command
//! cargo run -p mechcom_headless -- run --scenario crates/mechcom_headless/scenarios/duel.ron --auto-state
//!
//! # Run a scenario without input and print a summary
//! cargo run -p mechcom_headless -- simulate --ticks 6000 --seeds 16
//!
//! # Check that repeated runs end on the same state hash
//! cargo run -p mechcom_headless -- verify --runs 8 --ticks 3600
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mechcom_headless::{
    batch::{run_batch, simulate, verify_determinism},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "mechcom_headless")]
#[command(about = "Headless skirmish runner for AI testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive game
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<String>,

        /// Output state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Run a scenario without input and print a JSON summary
    Simulate {
        /// Ticks to simulate
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Scenario file to load (standard skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<String>,

        /// Run seeds 0..N in parallel instead of the scenario's own seed
        #[arg(long)]
        seeds: Option<u64>,
    },

    /// Verify determinism by comparing final state hashes
    Verify {
        /// Number of runs
        #[arg(short, long, default_value = "4")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Scenario file to load (standard skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Run {
            scenario,
            auto_state,
        }) => cmd_run(scenario, auto_state),
        Some(Commands::Simulate {
            ticks,
            scenario,
            seeds,
        }) => cmd_simulate(ticks, scenario, seeds),
        Some(Commands::Verify {
            runs,
            ticks,
            scenario,
        }) => cmd_verify(runs, ticks, scenario),
        None => {
            // Default: interactive mode
            cmd_run(None, false)
        }
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_scenario(path: Option<&str>) -> Result<Scenario, String> {
    match path {
        Some(path) => {
            tracing::info!("Using scenario: {}", path);
            Scenario::load(path).map_err(|e| format!("Failed to load scenario: {e}"))
        }
        None => Ok(Scenario::skirmish()),
    }
}

/// Run a single interactive game
fn cmd_run(scenario: Option<String>, auto_state: bool) -> Result<ExitCode, String> {
    tracing::info!("Starting interactive session");

    let config = HeadlessConfig {
        auto_state_output: auto_state,
        scenario_path: scenario,
    };

    let mut runner =
        HeadlessRunner::with_config(config).map_err(|e| format!("Failed to start: {e}"))?;
    runner
        .run(io::stdin().lock(), io::stdout().lock())
        .map_err(|e| format!("I/O error: {e}"))?;
    Ok(ExitCode::SUCCESS)
}

/// Run a scenario without input
fn cmd_simulate(
    ticks: u64,
    scenario: Option<String>,
    seeds: Option<u64>,
) -> Result<ExitCode, String> {
    let scenario = load_scenario(scenario.as_deref())?;
    let summaries = match seeds {
        Some(count) => run_batch(&scenario, 0..count, ticks),
        None => simulate(&scenario, ticks).map(|summary| vec![summary]),
    }
    .map_err(|e| format!("Simulation failed: {e}"))?;

    for summary in &summaries {
        let json = serde_json::to_string(summary).map_err(|e| e.to_string())?;
        println!("{json}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Verify determinism
fn cmd_verify(runs: u32, ticks: u64, scenario: Option<String>) -> Result<ExitCode, String> {
    let scenario = load_scenario(scenario.as_deref())?;
    tracing::info!(
        "Verifying determinism: {} ({} runs, {} ticks)",
        scenario.name,
        runs,
        ticks
    );

    let report = verify_determinism(&scenario, runs, ticks)
        .map_err(|e| format!("Verification failed: {e}"))?;

    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = report.hashes.first() {
            eprintln!("  Final state hash: {hash:016x}");
        }
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {run}: {hash:016x}");
        }
        Ok(ExitCode::FAILURE)
    }
}
