//! 事件模型
//!
//! 每種事件一個強型別 payload，對外以 `{timestamp, event_type, payload}`
//! 信封序列化為一行 JSON。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::plan::AllocationSlice;

/// 轉為 `YYYY-MM-DDTHH:MM:SSZ`
pub fn iso_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// 四捨五入到指定小數位（僅供輸出）
pub fn round_f64(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

// ==================== 需求與出貨 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesOrderCreated {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub destination_facility_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentCreated {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub qty_ordered: Decimal,
    pub fulfillment_type: String,
    pub remaining_stock: Decimal,
    pub allocations: Vec<AllocationSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialShipmentCreated {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty_shipped: Decimal,
    pub qty_backordered: Decimal,
    pub qty_ordered: Decimal,
    pub remaining_stock: Decimal,
    pub allocations: Vec<AllocationSlice>,
}

/// 欠交原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackorderReason {
    NoStock,
    PartialStock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackorderCreated {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty_backordered: Decimal,
    pub original_order_qty: Decimal,
    pub reason: BackorderReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackorderFulfilled {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty_shipped: Decimal,
    pub qty_still_pending: Decimal,
    pub original_order_qty: Decimal,
    pub remaining_stock: Decimal,
    pub allocations: Vec<AllocationSlice>,
}

// ==================== 採購 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderTriggered {
    pub part_id: String,
    pub qty_on_hand: Decimal,
    pub reorder_point: Decimal,
    pub net_position: Decimal,
    pub order_qty: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderCreated {
    pub purchase_order_id: String,
    pub part_id: String,
    pub qty: Decimal,
    pub supplier_id: Option<String>,
    pub supplier_country: String,
    pub supplier_reliability: f64,
    pub effective_reliability: f64,
    pub lead_time_hours: i64,
    pub eta: DateTime<Utc>,
    pub is_reorder: bool,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub base_cost: Decimal,
    pub cost_variance_pct: Decimal,
    pub seasonal_lead_time_mult: f64,
    pub seasonal_reliability_mult: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOrderReceived {
    pub purchase_order_id: String,
    pub part_id: String,
    pub qty_ordered: Decimal,
    pub qty_received: Decimal,
    pub qty_rejected: Decimal,
    pub supplier_id: Option<String>,
    pub was_partial_shipment: bool,
    pub new_qty_on_hand: Decimal,
    pub projected_eta: DateTime<Utc>,
    pub actual_arrival: DateTime<Utc>,
    pub arrival_variance_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialShipment {
    pub purchase_order_id: String,
    pub part_id: String,
    pub ordered_qty: Decimal,
    pub received_qty: Decimal,
    pub supplier_id: Option<String>,
    pub shortfall_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRejection {
    pub purchase_order_id: String,
    pub part_id: String,
    pub qty_rejected: Decimal,
    pub supplier_id: Option<String>,
    pub reject_rate_pct: f64,
}

// ==================== 生產 ====================

/// 工單建立原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTrigger {
    /// 欠交缺口
    Backorder,
    /// 成品低於再訂購點
    ReorderPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionJobCreated {
    pub job_id: String,
    pub product_id: String,
    pub status: String,
    pub qty_per_job: Decimal,
    pub production_duration_hours: u32,
    pub assigned_worker_id: String,
    pub due_date: DateTime<Utc>,
    pub trigger: JobTrigger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionStarted {
    pub job_id: String,
    pub product_id: String,
    pub status: String,
    pub qty_per_job: Decimal,
    pub expected_completion: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionCompleted {
    pub job_id: String,
    pub product_id: String,
    pub status: String,
    pub qty_completed: Decimal,
    pub new_qty_on_hand: Decimal,
}

// ==================== 物流 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadCreated {
    pub load_id: String,
    pub order_ids: Vec<String>,
    pub customer_ids: Vec<String>,
    pub product_id: String,
    pub qty: Decimal,
    pub weight_lbs: Decimal,
    pub origin_facility_id: Option<String>,
    pub destination_facility_id: String,
    pub route_id: Option<String>,
    pub transit_days: u32,
    pub scheduled_pickup: DateTime<Utc>,
    pub scheduled_delivery: DateTime<Utc>,
}

/// 交貨事件種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryKind {
    Pickup,
    Delivery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryEvent {
    pub load_id: String,
    pub delivery_type: DeliveryKind,
    pub facility_id: Option<String>,
    pub order_ids: Vec<String>,
    pub scheduled_time: DateTime<Utc>,
    pub actual_time: DateTime<Utc>,
    pub on_time: bool,
    pub disrupted: bool,
}

// ==================== 帳款 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceCreated {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceived {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub paid_at: DateTime<Utc>,
    pub on_time: bool,
    pub days_late: i64,
}

// ==================== 預測與彙總 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForecast {
    pub product_id: String,
    pub avg_daily_demand: f64,
    pub forecast_qty: f64,
    pub std_dev_daily: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandForecastCreated {
    pub forecast_id: String,
    pub window_days: u32,
    pub horizon_days: u32,
    pub forecasts: Vec<ProductForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SopProductLine {
    pub product_id: String,
    pub qty_on_hand: Decimal,
    pub backorder_qty: Decimal,
    pub wip_qty: Decimal,
    pub planned_qty: Decimal,
    pub forecast_30d: f64,
    pub projected_net_position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SopSnapshotCreated {
    pub snapshot_id: String,
    /// `YYYY-MM`
    pub period: String,
    pub products: Vec<SopProductLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtcMetricsEmitted {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub invoices_issued: u64,
    pub invoiced_amount: Decimal,
    pub payments_received: u64,
    pub collected_amount: Decimal,
    pub on_time_payment_pct: f64,
    pub avg_days_to_pay: f64,
    pub open_invoices: u64,
    pub open_receivables: Decimal,
    pub purchase_spend: Decimal,
}

// ==================== 干擾與促銷 ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromoActive {
    pub promo_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_days: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlackSwanEventScheduled {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_days: u32,
    pub demand_multiplier: f64,
    pub lead_time_multiplier: f64,
    pub affected_countries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlackSwanEventStarted {
    pub name: String,
    pub affected_countries: Vec<String>,
    pub demand_multiplier: f64,
    pub lead_time_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlackSwanEventEnded {
    pub name: String,
    pub duration_days: u32,
}

/// 模擬事件
///
/// 序列化時只輸出 payload 本身，事件名稱由 [`Event::event_type`] 提供。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    SalesOrderCreated(SalesOrderCreated),
    ShipmentCreated(ShipmentCreated),
    PartialShipmentCreated(PartialShipmentCreated),
    BackorderCreated(BackorderCreated),
    BackorderFulfilled(BackorderFulfilled),
    ReorderTriggered(ReorderTriggered),
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderReceived(PurchaseOrderReceived),
    PartialShipment(PartialShipment),
    QualityRejection(QualityRejection),
    ProductionJobCreated(ProductionJobCreated),
    ProductionStarted(ProductionStarted),
    ProductionCompleted(ProductionCompleted),
    LoadCreated(LoadCreated),
    DeliveryEvent(DeliveryEvent),
    InvoiceCreated(InvoiceCreated),
    PaymentReceived(PaymentReceived),
    DemandForecastCreated(DemandForecastCreated),
    SopSnapshotCreated(SopSnapshotCreated),
    CtcMetricsEmitted(CtcMetricsEmitted),
    PromoActive(PromoActive),
    BlackSwanEventScheduled(BlackSwanEventScheduled),
    BlackSwanEventStarted(BlackSwanEventStarted),
    BlackSwanEventEnded(BlackSwanEventEnded),
}

impl Event {
    /// 對外的事件類型名稱
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SalesOrderCreated(_) => "SalesOrderCreated",
            Event::ShipmentCreated(_) => "ShipmentCreated",
            Event::PartialShipmentCreated(_) => "PartialShipmentCreated",
            Event::BackorderCreated(_) => "BackorderCreated",
            Event::BackorderFulfilled(_) => "BackorderFulfilled",
            Event::ReorderTriggered(_) => "ReorderTriggered",
            Event::PurchaseOrderCreated(_) => "PurchaseOrderCreated",
            Event::PurchaseOrderReceived(_) => "PurchaseOrderReceived",
            Event::PartialShipment(_) => "PartialShipment",
            Event::QualityRejection(_) => "QualityRejection",
            Event::ProductionJobCreated(_) => "ProductionJobCreated",
            Event::ProductionStarted(_) => "ProductionStarted",
            Event::ProductionCompleted(_) => "ProductionCompleted",
            Event::LoadCreated(_) => "LoadCreated",
            Event::DeliveryEvent(_) => "DeliveryEvent",
            Event::InvoiceCreated(_) => "InvoiceCreated",
            Event::PaymentReceived(_) => "PaymentReceived",
            Event::DemandForecastCreated(_) => "DemandForecastCreated",
            Event::SopSnapshotCreated(_) => "SOPSnapshotCreated",
            Event::CtcMetricsEmitted(_) => "CTCMetricsEmitted",
            Event::PromoActive(_) => "PromoActive",
            Event::BlackSwanEventScheduled(_) => "BlackSwanEventScheduled",
            Event::BlackSwanEventStarted(_) => "BlackSwanEventStarted",
            Event::BlackSwanEventEnded(_) => "BlackSwanEventEnded",
        }
    }
}

/// 事件記錄（信封）
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventRecord {
    pub fn new(timestamp: DateTime<Utc>, event: Event) -> Self {
        Self { timestamp, event }
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }

    /// 序列化為單行 JSON
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("timestamp", &iso_utc(self.timestamp))?;
        map.serialize_entry("event_type", self.event.event_type())?;
        map.serialize_entry("payload", &self.event)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 0, 0).unwrap()
    }

    #[test]
    fn test_iso_utc_format() {
        assert_eq!(iso_utc(ts()), "2026-01-02T03:00:00Z");
    }

    #[test]
    fn test_envelope_shape() {
        let record = EventRecord::new(
            ts(),
            Event::BackorderCreated(BackorderCreated {
                order_id: "SO-1".into(),
                customer_id: "C-1".into(),
                product_id: "D-101".into(),
                qty_backordered: Decimal::from(4),
                original_order_qty: Decimal::from(4),
                reason: BackorderReason::NoStock,
            }),
        );

        let line = record.to_json_line().unwrap();
        assert!(line.starts_with(r#"{"timestamp":"2026-01-02T03:00:00Z","event_type":"BackorderCreated","payload":{"#));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["payload"]["reason"], "no_stock");
        assert_eq!(value["payload"]["qty_backordered"], 4.0);
    }

    #[test]
    fn test_event_type_names() {
        let event = Event::SopSnapshotCreated(SopSnapshotCreated {
            snapshot_id: "S-1".into(),
            period: "2026-01".into(),
            products: vec![],
        });
        assert_eq!(event.event_type(), "SOPSnapshotCreated");

        let event = Event::CtcMetricsEmitted(CtcMetricsEmitted {
            period_start: ts(),
            period_end: ts(),
            invoices_issued: 0,
            invoiced_amount: Decimal::ZERO,
            payments_received: 0,
            collected_amount: Decimal::ZERO,
            on_time_payment_pct: 0.0,
            avg_days_to_pay: 0.0,
            open_invoices: 0,
            open_receivables: Decimal::ZERO,
            purchase_spend: Decimal::ZERO,
        });
        assert_eq!(event.event_type(), "CTCMetricsEmitted");
    }

    #[test]
    fn test_payload_timestamps_use_utc_suffix() {
        let event = Event::BlackSwanEventScheduled(BlackSwanEventScheduled {
            name: "Port Congestion Event".into(),
            start_date: ts(),
            end_date: ts() + chrono::Duration::days(30),
            duration_days: 30,
            demand_multiplier: 0.9,
            lead_time_multiplier: 2.0,
            affected_countries: vec!["China".into(), "USA".into()],
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["start_date"], "2026-01-02T03:00:00Z");
        assert_eq!(value["end_date"], "2026-02-01T03:00:00Z");
    }

    #[test]
    fn test_round_f64() {
        assert_eq!(round_f64(0.123456, 3), 0.123);
        assert_eq!(round_f64(12.35, 1), 12.4);
    }
}
