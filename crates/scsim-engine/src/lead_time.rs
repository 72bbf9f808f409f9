//! 採購提前期計算

use crate::seasonality::SupplierFactor;

/// 提前期區間（小時，含端點）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTimeWindow {
    pub min_hours: i64,
    pub max_hours: i64,
}

impl LeadTimeWindow {
    /// 抽樣上限；區間退化時至少比下限多一小時
    pub fn draw_upper(&self) -> i64 {
        self.max_hours.max(self.min_hours + 1)
    }

    pub fn contains(&self, hours: i64) -> bool {
        hours >= self.min_hours && hours <= self.draw_upper()
    }
}

/// 交期計算器
pub struct LeadTimeCalculator;

impl LeadTimeCalculator {
    /// 計算供應商的提前期區間
    ///
    /// 可靠度越低，區間越長越寬；最後乘上季節性（含黑天鵝）提前期乘數。
    ///
    /// # 參數
    /// * `base_min_hours` / `base_max_hours` - 基礎提前期
    /// * `reliability` - 供應商可靠度分數（未經季節調整）
    /// * `seasonal` - 供應商所在國家當下的季節性係數
    pub fn window(
        base_min_hours: u32,
        base_max_hours: u32,
        reliability: f64,
        seasonal: SupplierFactor,
    ) -> LeadTimeWindow {
        let base_min = f64::from(base_min_hours);
        let base_max = f64::from(base_max_hours);
        let effective_reliability = reliability * seasonal.reliability_mult;

        // 數值越大代表越不可靠
        let reliability_factor = 1.1 - effective_reliability;

        let adjusted_min = (base_min + (base_max - base_min) * reliability_factor * 0.5).trunc() as i64;
        let adjusted_max = ((base_min + (base_max - base_min) * reliability_factor * 1.5).trunc() as i64)
            .min(i64::from(base_max_hours) * 2);

        LeadTimeWindow {
            min_hours: (adjusted_min as f64 * seasonal.lead_time_mult).trunc() as i64,
            max_hours: (adjusted_max as f64 * seasonal.lead_time_mult).trunc() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliable_supplier_window() {
        // rf = 1.1 - 0.9 = 0.2 → min = 24 + 144 × 0.1, max = 24 + 144 × 0.3
        let window = LeadTimeCalculator::window(24, 168, 0.9, SupplierFactor::NEUTRAL);
        assert_eq!(window.min_hours, 38);
        assert_eq!(window.max_hours, 67);
    }

    #[test]
    fn test_unreliable_supplier_waits_longer() {
        let reliable = LeadTimeCalculator::window(24, 168, 0.98, SupplierFactor::NEUTRAL);
        let unreliable = LeadTimeCalculator::window(24, 168, 0.6, SupplierFactor::NEUTRAL);

        assert!(unreliable.min_hours > reliable.min_hours);
        assert!(unreliable.max_hours - unreliable.min_hours > reliable.max_hours - reliable.min_hours);
    }

    #[test]
    fn test_max_is_capped_at_twice_base_max() {
        let window = LeadTimeCalculator::window(24, 168, -2.0, SupplierFactor::NEUTRAL);
        assert_eq!(window.max_hours, 336);
    }

    #[test]
    fn test_black_swan_multiplier_scales_window() {
        let normal = LeadTimeCalculator::window(24, 168, 0.82, SupplierFactor::NEUTRAL);
        let disrupted = LeadTimeCalculator::window(
            24,
            168,
            0.82,
            SupplierFactor {
                lead_time_mult: 2.5,
                reliability_mult: 1.0,
            },
        );

        assert_eq!(disrupted.min_hours, (normal.min_hours as f64 * 2.5).trunc() as i64);
        assert_eq!(disrupted.max_hours, (normal.max_hours as f64 * 2.5).trunc() as i64);
    }

    #[test]
    fn test_degenerate_window_draw_upper() {
        let window = LeadTimeWindow {
            min_hours: 10,
            max_hours: 10,
        };
        assert_eq!(window.draw_upper(), 11);
        assert!(window.contains(11));
        assert!(!window.contains(9));
    }
}
