//! 季節性與干擾係數計算

use chrono::{DateTime, Datelike, Utc};
use scsim_core::calendar::{
    self, DEMAND_MONTH_FACTORS, DEMAND_WEEKDAY_FACTORS, MONTH_END_FACTOR, QUARTER_END_FACTOR,
};
use scsim_core::{BlackSwanEvent, Promo, SimConfig};

/// 供應商係數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplierFactor {
    pub lead_time_mult: f64,
    pub reliability_mult: f64,
}

impl SupplierFactor {
    pub const NEUTRAL: SupplierFactor = SupplierFactor {
        lead_time_mult: 1.0,
        reliability_mult: 1.0,
    };
}

/// 季節性計算器（純函數）
pub struct SeasonalityCalculator;

impl SeasonalityCalculator {
    /// 依強度縮放偏離 1.0 的幅度
    fn scaled(factor: f64, strength: f64) -> f64 {
        1.0 + (factor - 1.0) * strength
    }

    /// 月份係數
    pub fn month_factor(at: DateTime<Utc>, config: &SimConfig) -> f64 {
        if !config.seasonality_enabled {
            return 1.0;
        }
        let base = DEMAND_MONTH_FACTORS[at.month0() as usize];
        Self::scaled(base, config.demand_seasonality_strength)
    }

    /// 星期係數
    pub fn weekday_factor(at: DateTime<Utc>, config: &SimConfig) -> f64 {
        if !config.seasonality_enabled {
            return 1.0;
        }
        let base = DEMAND_WEEKDAY_FACTORS[at.weekday().num_days_from_monday() as usize];
        Self::scaled(base, config.demand_seasonality_strength)
    }

    /// 月底與季末係數
    pub fn period_end_factor(at: DateTime<Utc>, config: &SimConfig) -> f64 {
        if !config.seasonality_enabled {
            return 1.0;
        }
        let date = at.date_naive();
        let mut factor = 1.0;
        if calendar::is_last_days_of_month(date, 3) {
            factor = MONTH_END_FACTOR;
        }
        if calendar::is_quarter_end_month(date.month()) && calendar::is_last_days_of_month(date, 5) {
            factor *= QUARTER_END_FACTOR;
        }
        Self::scaled(factor, config.demand_seasonality_strength)
    }

    /// 需求總係數 = 月份 × 星期 × 期末 × 黑天鵝 × Π(促銷)
    pub fn demand_factor(
        at: DateTime<Utc>,
        config: &SimConfig,
        black_swan: Option<&BlackSwanEvent>,
        promos: &[Promo],
    ) -> f64 {
        let black_swan_factor = black_swan
            .filter(|e| e.is_active(at))
            .map(|e| e.demand_multiplier)
            .unwrap_or(1.0);
        let promo_factor: f64 = promos
            .iter()
            .filter(|p| p.is_active(at))
            .map(|p| p.multiplier)
            .product();

        Self::month_factor(at, config)
            * Self::weekday_factor(at, config)
            * Self::period_end_factor(at, config)
            * black_swan_factor
            * promo_factor
    }

    /// 供應商所在國家的提前期與可靠度係數
    ///
    /// 季節表第一個符合的期間生效；黑天鵝的提前期乘數另外相乘。
    pub fn supplier_factor(
        country: Option<&str>,
        at: DateTime<Utc>,
        config: &SimConfig,
        black_swan: Option<&BlackSwanEvent>,
    ) -> SupplierFactor {
        let Some(country) = country else {
            return SupplierFactor::NEUTRAL;
        };

        let mut result = SupplierFactor::NEUTRAL;
        if config.seasonality_enabled {
            let strength = config.supplier_seasonality_strength;
            if let Some(season) = calendar::supplier_seasons(country)
                .iter()
                .find(|s| calendar::date_in_period(at.month(), at.day(), s.start, s.end))
            {
                result.lead_time_mult = Self::scaled(season.lead_time_mult, strength);
                result.reliability_mult = Self::scaled(season.reliability_mult, strength);
            }
        }

        if let Some(event) = black_swan {
            if event.is_active(at) && event.affects(country) {
                result.lead_time_mult *= event.lead_time_multiplier;
            }
        }

        result
    }
}
