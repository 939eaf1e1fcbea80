//! Batch simulation and determinism checks.
//!
//! Runs a scenario without any controller input for a fixed number of
//! ticks and summarizes the result. Seeds of a batch run in parallel using
//! rayon; every run owns its own simulation.

use std::ops::Range;

use mechcom_core::factions::Owner;
use mechcom_core::simulation::Simulation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::protocol::GameStatus;
use crate::scenario::{Scenario, ScenarioError};

/// Per-side holdings at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSummary {
    pub units: u32,
    pub buildings: u32,
    pub zones: u32,
}

impl SideSummary {
    fn of(sim: &Simulation, owner: Owner) -> Self {
        let mut summary = Self::default();
        for entity in sim.entities().sorted().filter(|e| e.owner == owner) {
            if entity.is_mobile() {
                summary.units += 1;
            } else {
                summary.buildings += 1;
            }
        }
        let zones = sim.zones().iter().filter(|z| z.owner == owner).count();
        summary.zones = u32::try_from(zones).unwrap_or(u32::MAX);
        summary
    }
}

/// Result of one uncontrolled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub scenario: String,
    pub seed: u64,
    pub ticks: u64,
    pub status: GameStatus,
    /// Tick the match was decided on.
    pub decided_at: Option<u64>,
    pub money: i32,
    pub player: SideSummary,
    pub opponent: SideSummary,
    pub hash: u64,
}

/// Run a scenario for `ticks` ticks.
pub fn simulate(scenario: &Scenario, ticks: u64) -> Result<MatchSummary, ScenarioError> {
    let mut sim = scenario.build()?;
    let mut decided_at = None;

    for _ in 0..ticks {
        if sim.tick().outcome.is_some() {
            decided_at = Some(sim.get_tick());
        }
    }

    debug!(seed = scenario.seed, ticks, "Run finished");
    Ok(MatchSummary {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        ticks,
        status: sim.outcome().into(),
        decided_at,
        money: sim.money(),
        player: SideSummary::of(&sim, Owner::Player),
        opponent: SideSummary::of(&sim, Owner::Opponent),
        hash: sim.state_hash(),
    })
}

/// Run one copy of the scenario per seed, in parallel.
///
/// Summaries come back in seed order regardless of scheduling.
pub fn run_batch(
    scenario: &Scenario,
    seeds: Range<u64>,
    ticks: u64,
) -> Result<Vec<MatchSummary>, ScenarioError> {
    info!(
        "Running {} seeds of '{}' for {} ticks",
        seeds.end.saturating_sub(seeds.start),
        scenario.name,
        ticks
    );
    seeds
        .into_par_iter()
        .map(|seed| {
            let scenario = Scenario {
                seed,
                ..scenario.clone()
            };
            simulate(&scenario, ticks)
        })
        .collect()
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    pub runs: u32,
    pub ticks: u64,
    pub hashes: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended on the same state hash.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run the same scenario `runs` times in parallel and collect final hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    runs: u32,
    ticks: u64,
) -> Result<DeterminismReport, ScenarioError> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| simulate(scenario, ticks).map(|summary| summary.hash))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DeterminismReport {
        runs,
        ticks,
        hashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_skirmish_stays_undecided() {
        let summary = simulate(&Scenario::skirmish(), 1200).unwrap();
        assert_eq!(summary.status, GameStatus::InProgress);
        assert_eq!(summary.decided_at, None);
        assert_eq!(summary.player.buildings, 1);
        assert_eq!(summary.player.zones, 1);
        // Two mining cycles on the home zone.
        assert_eq!(summary.money, 700);
    }

    #[test]
    fn test_batch_keeps_seed_order() {
        let summaries = run_batch(&Scenario::skirmish(), 3..7, 50).unwrap();
        let seeds: Vec<u64> = summaries.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_skirmish_is_deterministic() {
        let report = verify_determinism(&Scenario::skirmish(), 4, 600).unwrap();
        assert_eq!(report.hashes.len(), 4);
        assert!(report.is_deterministic());
    }
}
