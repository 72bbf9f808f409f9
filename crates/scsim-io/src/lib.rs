//! # SCSim IO
//!
//! 檔案系統邊界：主資料與配置載入、狀態持久化、JSONL 事件輸出

pub mod loader;
pub mod sink;
pub mod state;

// Re-export 主要類型
pub use loader::{load_config, MasterDataLoader};
pub use sink::{DailyJsonlSink, SingleFileJsonlSink};
pub use state::StateStore;
