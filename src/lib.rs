//! # SCSim
//!
//! 逐小時推進的供應鏈模擬：需求、生產、採購、物流、帳款，
//! 以及可重現的 JSONL 事件歷史。
//!
//! ## 快速開始
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use scsim::{EngineOptions, MasterDataLoader, SimConfig, SimulationEngine, SingleFileJsonlSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let master = MasterDataLoader::new("data").load()?;
//! let sink = SingleFileJsonlSink::create("output/history.jsonl")?;
//! let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
//!
//! let mut engine = SimulationEngine::new(
//!     master,
//!     SimConfig::default(),
//!     EngineOptions::new(42, start),
//!     Box::new(sink),
//! )?;
//! engine.run_ticks(24 * 7)?;
//! engine.flush_events()?;
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use scsim_core;
pub use scsim_engine;
pub use scsim_io;

pub use scsim_core::{
    Event, EventRecord, EventSink, MasterData, MemorySink, PersistentState, Result, SimConfig,
    SimError,
};
pub use scsim_engine::{EngineOptions, SimulationEngine, StatusSnapshot, TickReport};
pub use scsim_io::{
    load_config, DailyJsonlSink, MasterDataLoader, SingleFileJsonlSink, StateStore,
};
pub use service::{RunSummary, ServiceOptions, ServiceRunner, ShutdownHandle, StatusHandle};
