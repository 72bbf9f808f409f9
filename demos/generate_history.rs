//! 歷史資料產生示例
//!
//! 以單一檔案輸出多年份的事件歷史（含黑天鵝事件），供下游分析使用。
//!
//! 環境變數：
//! - `SCSIM_DATA_DIR`：主資料目錄（預設 `tests/fixtures/data`）
//! - `SCSIM_YEARS`：模擬年數（預設 3）
//! - `SCSIM_SEED`：亂數種子（預設 42）
//! - `SCSIM_OUTPUT`：輸出檔（預設 `output/history/history.jsonl`）

use std::env;
use std::time::Instant;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use scsim::{EngineOptions, MasterDataLoader, SimConfig, SimulationEngine, SingleFileJsonlSink};
use tracing_subscriber::EnvFilter;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let data_dir = env_or("SCSIM_DATA_DIR", "tests/fixtures/data".to_string());
    let years: u32 = env_or("SCSIM_YEARS", 3);
    let seed: u64 = env_or("SCSIM_SEED", 42);
    let output = env_or("SCSIM_OUTPUT", "output/history/history.jsonl".to_string());

    println!("=== 歷史資料產生 ===\n");
    println!("年數: {}, 種子: {}, 輸出: {}", years, seed, output);

    let master = MasterDataLoader::new(&data_dir).load()?;
    let config = SimConfig::default().with_black_swan(true, years);
    let sink = SingleFileJsonlSink::create(&output)
        .with_context(|| format!("無法建立輸出檔: {}", output))?;
    let start = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .context("無效的起始時間")?;

    let mut engine =
        SimulationEngine::new(master, config, EngineOptions::new(seed, start), Box::new(sink))?;
    if let Some(event) = engine.black_swan() {
        println!("黑天鵝事件: {} @ {}", event.name, event.start_date);
    }

    let started = Instant::now();
    let ticks = u64::from(years) * 365 * 24;
    let mut last_year = 0;
    for tick in 1..=ticks {
        engine.tick()?;
        let year = tick / (365 * 24);
        if year != last_year {
            println!("  第 {} 年完成，累計事件 {}", year, engine.events_emitted());
            last_year = year;
        }
    }
    engine.flush_events()?;

    println!(
        "\n完成：{} 個 tick，{} 筆事件，耗時 {:.1?}",
        ticks,
        engine.events_emitted(),
        started.elapsed()
    );
    Ok(())
}
