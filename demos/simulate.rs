//! 模擬服務示例
//!
//! 從資料目錄載入主資料與上次的狀態，執行固定數量的 tick，
//! 事件依日期寫入 `output/events/`，結束時寫回狀態。
//!
//! 環境變數：
//! - `SCSIM_DATA_DIR`：主資料目錄（預設 `tests/fixtures/data`）
//! - `SCSIM_STATE_DIR`：狀態目錄（預設 `output/state`）
//! - `SCSIM_TICKS`：tick 數（預設 168，即一週）
//! - `SCSIM_SEED`：亂數種子（預設 42）

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use scsim::{
    load_config, DailyJsonlSink, EngineOptions, MasterDataLoader, ServiceOptions, ServiceRunner,
    SimConfig, SimulationEngine, StateStore,
};
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let data_dir = PathBuf::from(env_or("SCSIM_DATA_DIR", "tests/fixtures/data".to_string()));
    let state_dir = PathBuf::from(env_or("SCSIM_STATE_DIR", "output/state".to_string()));
    let ticks: u64 = env_or("SCSIM_TICKS", 168);
    let seed: u64 = env_or("SCSIM_SEED", 42);

    println!("=== 供應鏈模擬服務 ===\n");

    let master = MasterDataLoader::new(&data_dir)
        .load()
        .with_context(|| format!("無法載入主資料: {}", data_dir.display()))?;

    let config_path = data_dir.join("config.json");
    let config = if config_path.exists() {
        load_config(&config_path)?
    } else {
        SimConfig::default()
    };

    let store = StateStore::new(&state_dir);
    let state = store.load().context("無法讀取狀態")?;
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .context("無效的起始時間")?;

    let engine = SimulationEngine::new(
        master,
        config,
        EngineOptions::new(seed, start).with_state(state),
        Box::new(DailyJsonlSink::new("output/events")),
    )?;

    let mut runner = ServiceRunner::new(
        engine,
        ServiceOptions::default()
            .with_tick_interval(Duration::ZERO)
            .with_max_ticks(ticks),
    )
    .with_state_store(store);
    let status = runner.status_handle();

    let summary = runner.run();
    let snapshot = status.snapshot();

    println!("執行 tick: {}（失敗 {}）", summary.ticks_run, summary.failed_ticks);
    println!("模擬時間: {}", snapshot.current_time);
    println!("事件數: {}", snapshot.events_emitted);
    println!("欠交總量: {}", snapshot.total_backordered());
    println!("在途運輸: {}", snapshot.in_flight_deliveries.len());
    println!("\n庫存:");
    for (item_id, entry) in snapshot.inventory.iter() {
        println!(
            "  - {}: 現有 {}, 再訂購點 {}",
            item_id, entry.qty_on_hand, entry.reorder_point
        );
    }

    Ok(())
}
