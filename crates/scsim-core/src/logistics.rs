//! 物流模型：待出貨明細與整合後的運輸批次

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 待出貨明細（已出貨但尚未併入運輸批次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyForShippingItem {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    /// 總重量（磅）
    pub weight: Decimal,
    pub destination_facility_id: String,
    pub staged_at: DateTime<Utc>,
}

/// 運輸批次（在途交貨）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub load_id: String,
    pub order_ids: Vec<String>,
    pub customer_ids: Vec<String>,
    pub product_id: String,
    pub qty: Decimal,
    pub weight: Decimal,
    pub origin_facility_id: Option<String>,
    pub destination_facility_id: String,
    pub route_id: Option<String>,
    pub transit_days: u32,
    pub scheduled_pickup: DateTime<Utc>,
    pub scheduled_delivery: DateTime<Utc>,
    pub actual_delivery: DateTime<Utc>,
    /// 是否遭遇運輸中斷
    pub disrupted: bool,
}

impl Load {
    /// 由同一 (設施, 產品) 群組的明細組成批次
    ///
    /// 實際交貨時間預設等於排定時間，由呼叫端再套用抖動或中斷。
    pub fn from_items(
        load_id: impl Into<String>,
        items: &[ReadyForShippingItem],
        pickup: DateTime<Utc>,
        transit_days: u32,
    ) -> Option<Self> {
        let first = items.first()?;
        let scheduled_delivery = pickup + Duration::days(i64::from(transit_days));

        let mut customer_ids: Vec<String> = Vec::new();
        for item in items {
            if !customer_ids.contains(&item.customer_id) {
                customer_ids.push(item.customer_id.clone());
            }
        }

        Some(Self {
            load_id: load_id.into(),
            order_ids: items.iter().map(|i| i.order_id.clone()).collect(),
            customer_ids,
            product_id: first.product_id.clone(),
            qty: items.iter().map(|i| i.qty).sum(),
            weight: items.iter().map(|i| i.weight).sum(),
            origin_facility_id: None,
            destination_facility_id: first.destination_facility_id.clone(),
            route_id: None,
            transit_days,
            scheduled_pickup: pickup,
            scheduled_delivery,
            actual_delivery: scheduled_delivery,
            disrupted: false,
        })
    }

    /// 建構器模式：設置出發設施與路線
    pub fn with_route(mut self, origin_facility_id: Option<String>, route_id: Option<String>) -> Self {
        self.origin_facility_id = origin_facility_id;
        self.route_id = route_id;
        self
    }

    /// 設置實際交貨時間（不早於取貨後一小時）
    pub fn set_actual_delivery(&mut self, actual: DateTime<Utc>, disrupted: bool) {
        let earliest = self.scheduled_pickup + Duration::hours(1);
        self.actual_delivery = actual.max(earliest);
        self.disrupted = disrupted;
    }

    pub fn is_delivered_by(&self, now: DateTime<Utc>) -> bool {
        now >= self.actual_delivery
    }

    /// 是否在寬限期內準時交貨
    pub fn is_on_time(&self, grace_hours: u32) -> bool {
        self.actual_delivery <= self.scheduled_delivery + Duration::hours(i64::from(grace_hours))
    }
}
