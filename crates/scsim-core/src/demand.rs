//! 需求模型：銷售訂單、欠交單與需求歷史

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 銷售訂單
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    /// 收貨設施
    pub destination_facility_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SalesOrder {
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        product_id: impl Into<String>,
        qty: Decimal,
        unit_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            qty,
            unit_price,
            destination_facility_id: None,
            created_at,
        }
    }

    /// 建構器模式：設置收貨設施
    pub fn with_destination(mut self, facility_id: Option<String>) -> Self {
        self.destination_facility_id = facility_id;
        self
    }
}

/// 欠交單
///
/// `qty_remaining` 只減不增，歸零時由佇列移除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBackorder {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    qty_remaining: Decimal,
    pub original_qty: Decimal,
    pub unit_price: Decimal,
    pub destination_facility_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingBackorder {
    /// 由銷售訂單的未出貨部分建立欠交單
    pub fn from_order(order: &SalesOrder, qty: Decimal, created_at: DateTime<Utc>) -> Result<Self> {
        if qty <= Decimal::ZERO {
            return Err(SimError::InvalidTransition(format!(
                "欠交數量必須為正數: 訂單 {} 數量 {}",
                order.order_id, qty
            )));
        }
        Ok(Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: order.product_id.clone(),
            qty_remaining: qty,
            original_qty: order.qty,
            unit_price: order.unit_price,
            destination_facility_id: order.destination_facility_id.clone(),
            created_at,
        })
    }

    pub fn qty_remaining(&self) -> Decimal {
        self.qty_remaining
    }

    /// 以可用庫存沖銷，回傳本次出貨數量
    pub fn fulfill(&mut self, available: Decimal) -> Decimal {
        let shipped = available.min(self.qty_remaining).max(Decimal::ZERO);
        self.qty_remaining -= shipped;
        shipped
    }

    pub fn is_closed(&self) -> bool {
        self.qty_remaining <= Decimal::ZERO
    }
}

/// 需求歷史記錄（日期、產品、數量），供預測使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub date: NaiveDate,
    pub product_id: String,
    pub qty: Decimal,
}

impl DemandRecord {
    pub fn new(date: NaiveDate, product_id: impl Into<String>, qty: Decimal) -> Self {
        Self {
            date,
            product_id: product_id.into(),
            qty,
        }
    }
}
