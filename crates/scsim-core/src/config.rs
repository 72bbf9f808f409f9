//! 模擬配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 以天為單位的配置上限
pub const MAX_CONFIG_DAYS: u32 = 3_650;

/// 以小時為單位的配置上限
pub const MAX_CONFIG_HOURS: u32 = 24 * MAX_CONFIG_DAYS;

pub const MAX_SIMULATION_YEARS: u32 = 100;

/// 模擬引擎參數配置
///
/// 所有欄位皆有預設值，JSON 配置檔只需提供要覆寫的欄位。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // 需求
    /// 非營業時段每小時產生訂單的機率
    pub demand_probability_base: f64,
    /// 營業時段每小時產生訂單的機率
    pub demand_probability_business_hours: f64,
    /// 營業時段開始（含）
    pub business_hours_start: u32,
    /// 營業時段結束（不含）
    pub business_hours_end: u32,
    /// 存在 Tier 1 客戶時選中 Tier 1 的機率
    pub tier1_selection_probability: f64,
    pub bulk_order_probability: f64,
    pub bulk_order_qty_min: u32,
    pub bulk_order_qty_max: u32,
    pub normal_order_qty_min: u32,
    pub normal_order_qty_max: u32,
    /// 產品目錄未標價時，以 BOM 標準成本乘上此加成定價
    pub product_price_markup: Decimal,

    // 生產
    pub production_duration_hours_min: u32,
    pub production_duration_hours_max: u32,
    /// 單一工單最大批量
    pub max_batch_size: u32,
    /// 每產品每模擬日最多由再訂購點觸發的工單數
    pub max_jobs_per_product_per_day: u32,
    pub worker_pool_size: u32,

    // 採購
    pub base_lead_time_hours_min: u32,
    pub base_lead_time_hours_max: u32,
    /// 實際到貨相對預計到貨的對稱抖動（小時），0 表示關閉
    pub lead_time_jitter_hours: u32,
    pub partial_shipment_probability: f64,
    pub partial_shipment_min_pct: f64,
    pub partial_shipment_max_pct: f64,
    pub quality_reject_rate_min: f64,
    pub quality_reject_rate_max: f64,
    /// 每次收貨發生品質問題的機率
    pub quality_issue_probability: f64,
    /// 零件再訂購時額外加上的固定緩衝量
    pub reorder_buffer_qty: Decimal,

    // 成本漂移
    pub cost_drift_enabled: bool,
    pub cost_drift_daily_pct: f64,
    pub cost_drift_max_pct: f64,

    // 季節性
    pub seasonality_enabled: bool,
    pub demand_seasonality_strength: f64,
    pub supplier_seasonality_strength: f64,

    // 促銷
    pub promos_enabled: bool,
    pub promo_daily_probability: f64,
    pub promo_multiplier_min: f64,
    pub promo_multiplier_max: f64,
    pub promo_duration_days_min: u32,
    pub promo_duration_days_max: u32,

    // 黑天鵝事件
    pub include_black_swan: bool,
    pub simulation_years: u32,

    // 物流
    pub load_weight_threshold_lbs: Decimal,
    pub max_consolidation_days: u32,
    pub default_unit_weight_lbs: Decimal,
    pub default_transit_days: u32,
    pub transit_jitter_hours: u32,
    pub transit_disruption_probability: f64,
    pub disruption_delay_days_min: u32,
    pub disruption_delay_days_max: u32,
    pub delivery_grace_hours: u32,

    // 帳款
    pub days_to_pay_min: u32,
    pub days_to_pay_max: u32,
    pub late_payment_probability: f64,
    pub late_payment_days_min: u32,
    pub late_payment_days_max: u32,

    // 預測
    pub forecast_window_days: u32,
    pub forecast_horizon_days: u32,

    // 資料毀損（供下游練習錯誤處理）
    pub data_corruption_enabled: bool,
    pub data_corruption_probability: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            demand_probability_base: 0.05,
            demand_probability_business_hours: 0.12,
            business_hours_start: 8,
            business_hours_end: 18,
            tier1_selection_probability: 0.6,
            bulk_order_probability: 0.08,
            bulk_order_qty_min: 10,
            bulk_order_qty_max: 20,
            normal_order_qty_min: 1,
            normal_order_qty_max: 5,
            product_price_markup: Decimal::new(18, 1),

            production_duration_hours_min: 8,
            production_duration_hours_max: 24,
            max_batch_size: 10,
            max_jobs_per_product_per_day: 2,
            worker_pool_size: 25,

            base_lead_time_hours_min: 24,
            base_lead_time_hours_max: 168,
            lead_time_jitter_hours: 12,
            partial_shipment_probability: 0.15,
            partial_shipment_min_pct: 0.80,
            partial_shipment_max_pct: 0.95,
            quality_reject_rate_min: 0.01,
            quality_reject_rate_max: 0.05,
            quality_issue_probability: 0.3,
            reorder_buffer_qty: Decimal::from(50),

            cost_drift_enabled: true,
            cost_drift_daily_pct: 0.005,
            cost_drift_max_pct: 0.20,

            seasonality_enabled: true,
            demand_seasonality_strength: 1.0,
            supplier_seasonality_strength: 1.0,

            promos_enabled: true,
            promo_daily_probability: 0.05,
            promo_multiplier_min: 1.15,
            promo_multiplier_max: 1.5,
            promo_duration_days_min: 2,
            promo_duration_days_max: 5,

            include_black_swan: false,
            simulation_years: 1,

            load_weight_threshold_lbs: Decimal::from(500),
            max_consolidation_days: 2,
            default_unit_weight_lbs: Decimal::from(15),
            default_transit_days: 5,
            transit_jitter_hours: 12,
            transit_disruption_probability: 0.05,
            disruption_delay_days_min: 2,
            disruption_delay_days_max: 6,
            delivery_grace_hours: 24,

            days_to_pay_min: 30,
            days_to_pay_max: 45,
            late_payment_probability: 0.2,
            late_payment_days_min: 1,
            late_payment_days_max: 30,

            forecast_window_days: 28,
            forecast_horizon_days: 7,

            data_corruption_enabled: false,
            data_corruption_probability: 0.01,
        }
    }
}

impl SimConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 字串解析（缺少的欄位使用預設值）並驗證
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| SimError::ConfigValidation(format!("配置 JSON 無法解析: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置需求機率（基礎、營業時段）
    pub fn with_demand_probabilities(mut self, base: f64, business_hours: f64) -> Self {
        self.demand_probability_base = base;
        self.demand_probability_business_hours = business_hours;
        self
    }

    /// 建構器模式：設置生產時長範圍
    pub fn with_production_duration(mut self, min_hours: u32, max_hours: u32) -> Self {
        self.production_duration_hours_min = min_hours;
        self.production_duration_hours_max = max_hours;
        self
    }

    /// 建構器模式：設置最大批量
    pub fn with_max_batch_size(mut self, size: u32) -> Self {
        self.max_batch_size = size;
        self
    }

    /// 建構器模式：設置基礎採購提前期範圍
    pub fn with_base_lead_time(mut self, min_hours: u32, max_hours: u32) -> Self {
        self.base_lead_time_hours_min = min_hours;
        self.base_lead_time_hours_max = max_hours;
        self
    }

    /// 建構器模式：設置到貨抖動
    pub fn with_lead_time_jitter(mut self, hours: u32) -> Self {
        self.lead_time_jitter_hours = hours;
        self
    }

    /// 建構器模式：開關季節性
    pub fn with_seasonality(mut self, enabled: bool) -> Self {
        self.seasonality_enabled = enabled;
        self
    }

    /// 建構器模式：設置季節性強度（需求、供應商）
    pub fn with_seasonality_strength(mut self, demand: f64, supplier: f64) -> Self {
        self.demand_seasonality_strength = demand;
        self.supplier_seasonality_strength = supplier;
        self
    }

    /// 建構器模式：開關促銷
    pub fn with_promos(mut self, enabled: bool) -> Self {
        self.promos_enabled = enabled;
        self
    }

    /// 建構器模式：開關成本漂移
    pub fn with_cost_drift(mut self, enabled: bool) -> Self {
        self.cost_drift_enabled = enabled;
        self
    }

    /// 建構器模式：啟用黑天鵝事件（需搭配模擬年數）
    pub fn with_black_swan(mut self, enabled: bool, simulation_years: u32) -> Self {
        self.include_black_swan = enabled;
        self.simulation_years = simulation_years;
        self
    }

    /// 建構器模式：設置資料毀損
    pub fn with_data_corruption(mut self, enabled: bool, probability: f64) -> Self {
        self.data_corruption_enabled = enabled;
        self.data_corruption_probability = probability;
        self
    }

    /// 驗證配置，一次回報所有違規項目
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        let probabilities = [
            ("demand_probability_base", self.demand_probability_base),
            (
                "demand_probability_business_hours",
                self.demand_probability_business_hours,
            ),
            ("tier1_selection_probability", self.tier1_selection_probability),
            ("bulk_order_probability", self.bulk_order_probability),
            ("partial_shipment_probability", self.partial_shipment_probability),
            ("partial_shipment_min_pct", self.partial_shipment_min_pct),
            ("partial_shipment_max_pct", self.partial_shipment_max_pct),
            ("quality_reject_rate_min", self.quality_reject_rate_min),
            ("quality_reject_rate_max", self.quality_reject_rate_max),
            ("quality_issue_probability", self.quality_issue_probability),
            ("cost_drift_daily_pct", self.cost_drift_daily_pct),
            ("cost_drift_max_pct", self.cost_drift_max_pct),
            ("demand_seasonality_strength", self.demand_seasonality_strength),
            ("supplier_seasonality_strength", self.supplier_seasonality_strength),
            ("promo_daily_probability", self.promo_daily_probability),
            (
                "transit_disruption_probability",
                self.transit_disruption_probability,
            ),
            ("late_payment_probability", self.late_payment_probability),
            ("data_corruption_probability", self.data_corruption_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{} must be between 0 and 1", name));
            }
        }

        if self.business_hours_start > 23 {
            errors.push("business_hours_start must be between 0 and 23".to_string());
        }
        if self.business_hours_end > 23 {
            errors.push("business_hours_end must be between 0 and 23".to_string());
        }
        if self.production_duration_hours_min == 0 {
            errors.push("production_duration_hours_min must be positive".to_string());
        }
        if self.max_batch_size == 0 {
            errors.push("max_batch_size must be positive".to_string());
        }
        if self.worker_pool_size == 0 {
            errors.push("worker_pool_size must be positive".to_string());
        }
        if self.forecast_window_days == 0 {
            errors.push("forecast_window_days must be positive".to_string());
        }
        if self.promo_multiplier_min < 1.0 {
            errors.push("promo_multiplier_min must be >= 1".to_string());
        }
        if self.product_price_markup <= Decimal::ZERO {
            errors.push("product_price_markup must be positive".to_string());
        }
        if self.load_weight_threshold_lbs <= Decimal::ZERO {
            errors.push("load_weight_threshold_lbs must be positive".to_string());
        }
        if self.reorder_buffer_qty < Decimal::ZERO {
            errors.push("reorder_buffer_qty must not be negative".to_string());
        }

        let ranges_u32 = [
            ("bulk_order_qty", self.bulk_order_qty_min, self.bulk_order_qty_max),
            (
                "normal_order_qty",
                self.normal_order_qty_min,
                self.normal_order_qty_max,
            ),
            (
                "production_duration_hours",
                self.production_duration_hours_min,
                self.production_duration_hours_max,
            ),
            (
                "base_lead_time_hours",
                self.base_lead_time_hours_min,
                self.base_lead_time_hours_max,
            ),
            (
                "promo_duration_days",
                self.promo_duration_days_min,
                self.promo_duration_days_max,
            ),
            (
                "disruption_delay_days",
                self.disruption_delay_days_min,
                self.disruption_delay_days_max,
            ),
            ("days_to_pay", self.days_to_pay_min, self.days_to_pay_max),
            (
                "late_payment_days",
                self.late_payment_days_min,
                self.late_payment_days_max,
            ),
        ];
        for (name, min, max) in ranges_u32 {
            if max < min {
                errors.push(format!("{}_max must be >= min", name));
            }
        }

        // 日期運算的上限（約十年），超過時 DateTime 相加會溢位
        let day_limits = [
            ("days_to_pay_max", self.days_to_pay_max),
            ("late_payment_days_max", self.late_payment_days_max),
            ("disruption_delay_days_max", self.disruption_delay_days_max),
            ("promo_duration_days_max", self.promo_duration_days_max),
            ("default_transit_days", self.default_transit_days),
            ("max_consolidation_days", self.max_consolidation_days),
            ("forecast_window_days", self.forecast_window_days),
            ("forecast_horizon_days", self.forecast_horizon_days),
        ];
        for (name, value) in day_limits {
            if value > MAX_CONFIG_DAYS {
                errors.push(format!("{} must be <= {}", name, MAX_CONFIG_DAYS));
            }
        }

        let hour_limits = [
            ("base_lead_time_hours_max", self.base_lead_time_hours_max),
            ("lead_time_jitter_hours", self.lead_time_jitter_hours),
            (
                "production_duration_hours_max",
                self.production_duration_hours_max,
            ),
            ("transit_jitter_hours", self.transit_jitter_hours),
            ("delivery_grace_hours", self.delivery_grace_hours),
        ];
        for (name, value) in hour_limits {
            if value > MAX_CONFIG_HOURS {
                errors.push(format!("{} must be <= {}", name, MAX_CONFIG_HOURS));
            }
        }

        if self.simulation_years > MAX_SIMULATION_YEARS {
            errors.push(format!(
                "simulation_years must be <= {}",
                MAX_SIMULATION_YEARS
            ));
        }

        let ranges_f64 = [
            (
                "partial_shipment_pct",
                self.partial_shipment_min_pct,
                self.partial_shipment_max_pct,
            ),
            (
                "quality_reject_rate",
                self.quality_reject_rate_min,
                self.quality_reject_rate_max,
            ),
            (
                "promo_multiplier",
                self.promo_multiplier_min,
                self.promo_multiplier_max,
            ),
        ];
        for (name, min, max) in ranges_f64 {
            if max < min {
                errors.push(format!("{}_max must be >= min", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SimError::ConfigValidation(format!(
                "Invalid configuration: {}",
                errors.join("; ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.business_hours_start, 8);
        assert_eq!(config.reorder_buffer_qty, Decimal::from(50));
    }

    #[test]
    fn test_config_builder() {
        let config = SimConfig::new()
            .with_demand_probabilities(0.1, 0.3)
            .with_production_duration(4, 6)
            .with_max_batch_size(5)
            .with_seasonality(false);

        assert_eq!(config.demand_probability_base, 0.1);
        assert_eq!(config.demand_probability_business_hours, 0.3);
        assert_eq!(config.production_duration_hours_max, 6);
        assert_eq!(config.max_batch_size, 5);
        assert!(!config.seasonality_enabled);
    }

    #[rstest]
    #[case::negative_probability(SimConfig::new().with_demand_probabilities(-0.1, 0.1), "demand_probability_base")]
    #[case::probability_above_one(SimConfig::new().with_demand_probabilities(0.1, 1.5), "demand_probability_business_hours")]
    #[case::inverted_duration(SimConfig::new().with_production_duration(10, 5), "production_duration_hours_max")]
    #[case::zero_duration(SimConfig::new().with_production_duration(0, 5), "production_duration_hours_min")]
    #[case::strength_above_one(SimConfig::new().with_seasonality_strength(1.5, 1.0), "demand_seasonality_strength")]
    fn test_invalid_config_is_rejected(#[case] config: SimConfig, #[case] field: &str) {
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::ConfigValidation(_)));
        assert!(err.to_string().contains(field), "{}", err);
    }

    #[rstest]
    #[case::days_to_pay("days_to_pay_max")]
    #[case::late_payment("late_payment_days_max")]
    #[case::lead_time("base_lead_time_hours_max")]
    fn test_oversized_durations_are_rejected(#[case] field: &str) {
        let mut config = SimConfig::new();
        match field {
            "days_to_pay_max" => {
                config.days_to_pay_min = 200_000_000;
                config.days_to_pay_max = 200_000_000;
            }
            "late_payment_days_max" => config.late_payment_days_max = MAX_CONFIG_DAYS + 1,
            _ => config.base_lead_time_hours_max = MAX_CONFIG_HOURS + 1,
        }

        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::ConfigValidation(_)));
        assert!(err.to_string().contains(field), "{}", err);
    }

    #[test]
    fn test_duration_limits_are_inclusive() {
        let mut config = SimConfig::new();
        config.days_to_pay_max = MAX_CONFIG_DAYS;
        config.transit_jitter_hours = MAX_CONFIG_HOURS;
        config.simulation_years = MAX_SIMULATION_YEARS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_reports_all_errors() {
        let mut config = SimConfig::new().with_demand_probabilities(2.0, 2.0);
        config.business_hours_end = 30;

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("demand_probability_base"));
        assert!(message.contains("demand_probability_business_hours"));
        assert!(message.contains("business_hours_end"));
        assert_eq!(message.matches("; ").count(), 2);
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let config = SimConfig::from_json_str(
            r#"{"demand_probability_base": 0.2, "max_batch_size": 3}"#,
        )
        .unwrap();

        assert_eq!(config.demand_probability_base, 0.2);
        assert_eq!(config.max_batch_size, 3);
        assert_eq!(config.bulk_order_qty_max, 20);
    }

    #[test]
    fn test_invalid_json_value_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"partial_shipment_probability": 3.0}"#).unwrap_err();
        assert!(err.to_string().contains("partial_shipment_probability"));
    }
}
