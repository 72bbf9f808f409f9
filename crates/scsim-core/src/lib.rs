//! # SCSim Core
//!
//! 供應鏈模擬的核心資料模型、配置與事件類型

pub mod billing;
pub mod calendar;
pub mod config;
pub mod demand;
pub mod disruption;
pub mod event;
pub mod inventory;
pub mod logistics;
pub mod master;
pub mod plan;
pub mod sink;
pub mod state;
pub mod supply;

// Re-export 主要類型
pub use billing::PendingInvoice;
pub use config::SimConfig;
pub use demand::{DemandRecord, PendingBackorder, SalesOrder};
pub use disruption::{BlackSwanEvent, BlackSwanTemplate, Promo, BLACK_SWAN_TEMPLATES};
pub use event::{iso_utc, Event, EventRecord};
pub use inventory::{InventoryEntry, InventoryLedger};
pub use logistics::{Load, ReadyForShippingItem};
pub use master::{BomComponent, Customer, Facility, MasterData, Part, Product, Route, Supplier};
pub use plan::{AllocationSlice, AllocationSource, JobStatus, ProductionJob, StockOrigin};
pub use sink::{EventSink, MemorySink};
pub use state::{PersistentState, ProductionSchedule, SystemState};
pub use supply::PendingPurchaseOrder;

/// 模擬錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("主資料載入失敗 {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("無效的配置: {0}")]
    ConfigValidation(String),

    #[error("找不到實體: {0}")]
    UnknownEntity(String),

    #[error("無效的狀態轉換: {0}")]
    InvalidTransition(String),

    #[error("I/O 錯誤: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化錯誤: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    /// 建立主資料載入錯誤
    pub fn data_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
