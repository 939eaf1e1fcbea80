//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`mechcom_core::math::Fixed`] throughout the tick loop.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity ID order.
//!
//! - **System randomness**: Placement and move scatter draw from one
//!   generator seeded from the configuration.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, combat, etc.)
//! 2. **Property tests**: Random command streams must still replay exactly
//! 3. **Parallel tests**: Running N simulations on threads all match

use std::thread;

use mechcom_core::commands::Command;
use mechcom_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a simulation setup twice and compare final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, _| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Replay a command script against fresh simulations and compare hashes.
///
/// `script` pairs a tick number with the command applied before that tick
/// runs. Rejected commands are part of the script and must be rejected
/// identically on every run.
pub fn verify_script_determinism<F>(
    setup_fn: F,
    script: &[(u64, Command)],
    runs: usize,
    num_ticks: u64,
) -> DeterminismResult
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        runs,
        num_ticks,
        &setup_fn,
        |sim, tick| {
            for (_, command) in script.iter().filter(|(at, _)| *at == tick) {
                // Acceptance is replayed, not asserted.
                let _ = sim.apply(command.clone());
            }
            sim.tick();
        },
        Simulation::state_hash,
    )
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_sims<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation testing.
pub mod strategies {
    use proptest::prelude::*;

    use mechcom_core::commands::Command;
    use mechcom_core::data::{BuildingType, Catalog, ChassisType, WeaponType};
    use mechcom_core::math::{Fixed, Vec2Fixed};

    /// A world coordinate on the stock 2000x1500 map.
    pub fn arb_map_point() -> impl Strategy<Value = Vec2Fixed> {
        (0i32..2000, 0i32..1500).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Any building type.
    pub fn arb_building_type() -> impl Strategy<Value = BuildingType> {
        proptest::sample::select(BuildingType::ALL.to_vec())
    }

    /// Any weapon type.
    pub fn arb_weapon() -> impl Strategy<Value = WeaponType> {
        proptest::sample::select(WeaponType::ALL.to_vec())
    }

    /// Any chassis type.
    pub fn arb_chassis() -> impl Strategy<Value = ChassisType> {
        proptest::sample::select(ChassisType::ALL.to_vec())
    }

    /// A normalized minimap coordinate.
    pub fn arb_fraction() -> impl Strategy<Value = Fixed> {
        (0i32..=100).prop_map(|n| Fixed::from_num(n) / Fixed::from_num(100))
    }

    /// Any command, priced by the stock catalog.
    pub fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            arb_building_type().prop_map(Command::BuildBuilding),
            (arb_weapon(), arb_chassis()).prop_filter_map("composable", |(w, c)| {
                Catalog::standard().compose(w, c).map(Command::QueueUnit)
            }),
            Just(Command::Repair),
            Just(Command::Sell),
            Just(Command::SetRally),
            Just(Command::ClearQueue),
            arb_map_point().prop_map(Command::MoveOrRallyIntent),
            (arb_map_point(), any::<bool>()).prop_map(|(point, double_click)| {
                Command::SelectAt {
                    point,
                    double_click,
                }
            }),
            (arb_fraction(), arb_fraction()).prop_map(|(x, y)| Command::MinimapPan { x, y }),
        ]
    }

    /// A tick-stamped command script sorted by tick.
    pub fn arb_script(max_len: usize, max_tick: u64) -> impl Strategy<Value = Vec<(u64, Command)>> {
        proptest::collection::vec((0..max_tick, arb_command()), 0..max_len).prop_map(
            |mut script| {
                script.sort_by_key(|(tick, _)| *tick);
                script
            },
        )
    }
}
