//! 干擾與促銷模型

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 黑天鵝事件範本
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackSwanTemplate {
    pub name: &'static str,
    pub duration_days: u32,
    pub demand_multiplier: f64,
    pub lead_time_multiplier: f64,
    pub affected_countries: &'static [&'static str],
}

/// 多年歷史模擬使用的事件範本
pub const BLACK_SWAN_TEMPLATES: [BlackSwanTemplate; 5] = [
    BlackSwanTemplate {
        name: "Supply Chain Crisis",
        duration_days: 21,
        demand_multiplier: 0.7,
        lead_time_multiplier: 2.5,
        affected_countries: &["China", "Taiwan"],
    },
    BlackSwanTemplate {
        name: "Port Congestion Event",
        duration_days: 30,
        demand_multiplier: 0.9,
        lead_time_multiplier: 2.0,
        affected_countries: &["China", "USA"],
    },
    BlackSwanTemplate {
        name: "Regional Natural Disaster",
        duration_days: 14,
        demand_multiplier: 0.5,
        lead_time_multiplier: 3.0,
        affected_countries: &["Taiwan"],
    },
    BlackSwanTemplate {
        name: "Global Logistics Disruption",
        duration_days: 28,
        demand_multiplier: 0.8,
        lead_time_multiplier: 2.2,
        affected_countries: &["China", "Germany", "USA"],
    },
    // 恐慌性採購，需求反而上升
    BlackSwanTemplate {
        name: "Semiconductor Shortage",
        duration_days: 25,
        demand_multiplier: 1.1,
        lead_time_multiplier: 3.5,
        affected_countries: &["Taiwan", "China"],
    },
];

/// 黑天鵝事件
///
/// 生效期間為 `[start_date, start_date + duration_days)`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackSwanEvent {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub duration_days: u32,
    pub demand_multiplier: f64,
    pub lead_time_multiplier: f64,
    pub affected_countries: Vec<String>,
}

impl BlackSwanEvent {
    pub fn new(
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        duration_days: u32,
        demand_multiplier: f64,
        lead_time_multiplier: f64,
        affected_countries: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_date,
            duration_days,
            demand_multiplier,
            lead_time_multiplier,
            affected_countries,
        }
    }

    /// 由範本建立
    pub fn from_template(template: &BlackSwanTemplate, start_date: DateTime<Utc>) -> Self {
        Self::new(
            template.name,
            start_date,
            template.duration_days,
            template.demand_multiplier,
            template.lead_time_multiplier,
            template
                .affected_countries
                .iter()
                .map(|c| c.to_string())
                .collect(),
        )
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.start_date + Duration::days(i64::from(self.duration_days))
    }

    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at < self.end_date()
    }

    pub fn affects(&self, country: &str) -> bool {
        self.affected_countries.iter().any(|c| c == country)
    }

    /// 開始時間是否落在 `[at, at + 1h)`
    pub fn starts_within_hour(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at < self.start_date + Duration::hours(1)
    }

    /// 結束時間是否落在 `[at, at + 1h)`
    pub fn ends_within_hour(&self, at: DateTime<Utc>) -> bool {
        let end = self.end_date();
        end <= at && at < end + Duration::hours(1)
    }
}

/// 促銷活動
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promo {
    pub promo_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 需求乘數（≥ 1）
    pub multiplier: f64,
}

impl Promo {
    pub fn new(
        promo_id: impl Into<String>,
        start_time: DateTime<Utc>,
        duration_days: u32,
        multiplier: f64,
    ) -> Self {
        Self {
            promo_id: promo_id.into(),
            start_time,
            end_time: start_time + Duration::days(i64::from(duration_days)),
            multiplier,
        }
    }

    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }

    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        at >= self.end_time
    }
}
