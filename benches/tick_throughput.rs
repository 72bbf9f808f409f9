//! tick 吞吐量基準測試

use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use scsim::{
    EngineOptions, MasterData, MasterDataLoader, MemorySink, SimConfig, SimulationEngine,
    StateStore,
};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

fn build(master: &MasterData, config: &SimConfig) -> SimulationEngine {
    let state = StateStore::new(fixtures()).load().expect("fixture state");
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    SimulationEngine::new(
        master.clone(),
        config.clone(),
        EngineOptions::new(42, start).with_state(state),
        Box::new(MemorySink::new()),
    )
    .expect("engine")
}

fn bench_ticks(c: &mut Criterion) {
    let master = MasterDataLoader::new(fixtures()).load().expect("fixture master data");
    let mut group = c.benchmark_group("tick_throughput");

    for (label, config) in [
        ("default", SimConfig::default()),
        ("busy", SimConfig::default().with_demand_probabilities(0.4, 0.8)),
    ] {
        group.bench_with_input(BenchmarkId::new("one_week", label), &config, |b, config| {
            b.iter_batched(
                || build(&master, config),
                |mut engine| black_box(engine.run_ticks(24 * 7).expect("run")),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
