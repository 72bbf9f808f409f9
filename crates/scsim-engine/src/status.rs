//! 對外狀態快照
//!
//! 每個 tick 結束後由服務層複製一份發佈，讀取端不會看到 tick 進行到一半的狀態。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scsim_core::InventoryLedger;
use serde::Serialize;

/// 欠交摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackorderSummary {
    pub order_id: String,
    pub product_id: String,
    pub qty_remaining: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 在途運輸批次摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverySummary {
    pub load_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub destination_facility_id: String,
    pub scheduled_delivery: DateTime<Utc>,
}

/// 模擬狀態快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub current_time: DateTime<Utc>,
    pub tick_count: u64,
    pub running: bool,
    pub inventory: InventoryLedger,
    pub backorders: Vec<BackorderSummary>,
    pub in_flight_deliveries: Vec<DeliverySummary>,
    pub active_jobs: usize,
    pub open_purchase_orders: usize,
    pub open_invoices: usize,
    pub events_emitted: u64,
}

impl StatusSnapshot {
    /// 建構器模式：設置執行旗標
    pub fn with_running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    /// 欠交總數量
    pub fn total_backordered(&self) -> Decimal {
        self.backorders.iter().map(|b| b.qty_remaining).sum()
    }
}
