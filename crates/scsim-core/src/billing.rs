//! 帳款模型：應收發票
//!
//! 只是付款計時器，不涉及複式記帳。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 未結發票
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvoice {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    /// 金額 = 數量 × 單價
    pub amount: Decimal,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// 已判定延遲時的實際付款時間
    #[serde(default)]
    pub late_settlement: Option<DateTime<Utc>>,
}

impl PendingInvoice {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoice_id: impl Into<String>,
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        product_id: impl Into<String>,
        qty: Decimal,
        unit_price: Decimal,
        issued_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            qty,
            unit_price,
            amount: (qty * unit_price).round_dp(2),
            issued_at,
            due_date,
            late_settlement: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_date
    }

    /// 尚未判定準時或延遲
    pub fn is_unresolved(&self) -> bool {
        self.late_settlement.is_none()
    }

    /// 延遲付款是否已到付款時間
    pub fn is_late_settlement_due(&self, now: DateTime<Utc>) -> bool {
        self.late_settlement.map(|t| now >= t).unwrap_or(false)
    }

    /// 從開立到付款的天數
    pub fn days_to_pay(&self, paid_at: DateTime<Utc>) -> i64 {
        (paid_at - self.issued_at).num_days()
    }
}
