//! Simulation benchmarks for mechcom_core.
//!
//! Run with: `cargo bench -p mechcom_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mechcom_core::commands::Command;
use mechcom_core::data::BuildingType;
use mechcom_test_utils::fixtures::{duel, skirmish_battle};

/// Runs simulation benchmarks for the mechcom_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_battle_100_ticks", |b| {
        b.iter_batched(
            || skirmish_battle(42),
            |mut sim| {
                for _ in 0..100 {
                    black_box(sim.tick());
                }
                sim.state_hash()
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("duel_single_tick", |b| {
        b.iter_batched(
            || duel().0,
            |mut sim| black_box(sim.tick()),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("build_and_snapshot", |b| {
        b.iter_batched(
            || {
                let mut sim = skirmish_battle(7);
                sim.set_money(10_000);
                sim
            },
            |mut sim| {
                for _ in 0..10 {
                    let _ = sim.apply(Command::BuildBuilding(BuildingType::Depot));
                }
                black_box(sim.snapshot())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
