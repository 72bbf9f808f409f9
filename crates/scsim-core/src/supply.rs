//! 供應模型：在途採購單

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 在途採購單
///
/// 同一零件同時最多一張（由引擎的在途集合保證）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPurchaseOrder {
    pub purchase_order_id: String,
    pub part_id: String,
    pub qty: Decimal,
    pub supplier_id: Option<String>,
    /// 預計到貨時間
    pub eta: DateTime<Utc>,
    /// 實際到貨時間（含抖動）
    pub actual_arrival: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// 下單當下的單價
    pub unit_cost: Decimal,
}

impl PendingPurchaseOrder {
    pub fn new(
        purchase_order_id: impl Into<String>,
        part_id: impl Into<String>,
        qty: Decimal,
        created_at: DateTime<Utc>,
        eta: DateTime<Utc>,
    ) -> Self {
        Self {
            purchase_order_id: purchase_order_id.into(),
            part_id: part_id.into(),
            qty,
            supplier_id: None,
            eta,
            actual_arrival: eta,
            created_at,
            unit_cost: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置供應商
    pub fn with_supplier(mut self, supplier_id: Option<String>) -> Self {
        self.supplier_id = supplier_id;
        self
    }

    /// 建構器模式：設置實際到貨時間（不早於下單後一小時）
    pub fn with_actual_arrival(mut self, actual_arrival: DateTime<Utc>) -> Self {
        let earliest = self.created_at + chrono::Duration::hours(1);
        self.actual_arrival = actual_arrival.max(earliest);
        self
    }

    /// 建構器模式：設置單價
    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    pub fn total_cost(&self) -> Decimal {
        (self.unit_cost * self.qty).round_dp(2)
    }

    /// 是否已到貨
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.actual_arrival
    }

    /// 實際與預計到貨差異（小時，正值為延遲）
    pub fn arrival_variance_hours(&self) -> i64 {
        (self.actual_arrival - self.eta).num_hours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_purchase_order_arrival() {
        let po = PendingPurchaseOrder::new(
            "PO-001",
            "P-001",
            Decimal::from(100),
            created(),
            created() + Duration::hours(48),
        )
        .with_actual_arrival(created() + Duration::hours(55))
        .with_unit_cost(Decimal::new(1234, 2));

        assert!(!po.is_due(created() + Duration::hours(54)));
        assert!(po.is_due(created() + Duration::hours(55)));
        assert_eq!(po.arrival_variance_hours(), 7);
        assert_eq!(po.total_cost(), Decimal::new(123400, 2));
    }

    #[test]
    fn test_actual_arrival_never_before_next_hour() {
        let po = PendingPurchaseOrder::new(
            "PO-002",
            "P-002",
            Decimal::from(10),
            created(),
            created() + Duration::hours(2),
        )
        .with_actual_arrival(created() - Duration::hours(10));

        assert_eq!(po.actual_arrival, created() + Duration::hours(1));
        assert_eq!(po.arrival_variance_hours(), -1);
    }
}
