//! 需求歷史與每日分桶

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use scsim_core::event::{round_f64, ProductForecast};
use scsim_core::DemandRecord;

/// 滾動需求歷史
#[derive(Debug, Clone, Default)]
pub struct DemandHistory {
    records: VecDeque<DemandRecord>,
}

impl DemandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: DemandRecord) {
        self.records.push_back(record);
    }

    /// 移除早於 `cutoff` 的記錄
    pub fn prune_before(&mut self, cutoff: NaiveDate) {
        while self.records.front().map(|r| r.date < cutoff).unwrap_or(false) {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 每日需求量，涵蓋 `[end - window_days, end)`，無需求的日子為 0
    pub fn daily_buckets(&self, product_id: &str, end: NaiveDate, window_days: u32) -> Vec<f64> {
        let start = end - Duration::days(i64::from(window_days));
        let mut buckets = vec![0.0; window_days as usize];
        for record in self
            .records
            .iter()
            .filter(|r| r.product_id == product_id && r.date >= start && r.date < end)
        {
            let index = (record.date - start).num_days() as usize;
            if let Some(bucket) = buckets.get_mut(index) {
                *bucket += record.qty.to_f64().unwrap_or(0.0);
            }
        }
        buckets
    }
}

/// 時間分桶計算器
pub struct BucketingCalculator;

impl BucketingCalculator {
    /// 平均與（母體）標準差
    pub fn mean_and_std(series: &[f64]) -> (f64, f64) {
        if series.is_empty() {
            return (0.0, 0.0);
        }
        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    /// 移動平均預測
    pub fn moving_average_forecast(
        history: &DemandHistory,
        product_id: &str,
        end: NaiveDate,
        window_days: u32,
        horizon_days: u32,
    ) -> ProductForecast {
        let series = history.daily_buckets(product_id, end, window_days);
        let (mean, std_dev) = Self::mean_and_std(&series);
        ProductForecast {
            product_id: product_id.to_string(),
            avg_daily_demand: round_f64(mean, 3),
            forecast_qty: round_f64(mean * f64::from(horizon_days), 2),
            std_dev_daily: round_f64(std_dev, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn history() -> DemandHistory {
        let mut history = DemandHistory::new();
        history.record(DemandRecord::new(date(1), "D-101", Decimal::from(4)));
        history.record(DemandRecord::new(date(2), "D-101", Decimal::from(2)));
        history.record(DemandRecord::new(date(2), "D-102", Decimal::from(9)));
        history.record(DemandRecord::new(date(2), "D-101", Decimal::from(1)));
        history.record(DemandRecord::new(date(4), "D-101", Decimal::from(5)));
        history
    }

    #[test]
    fn test_daily_buckets_include_zero_days() {
        let buckets = history().daily_buckets("D-101", date(5), 4);
        // 3/1 ~ 3/4
        assert_eq!(buckets, vec![4.0, 3.0, 0.0, 5.0]);

        // 視窗不含結束日
        let buckets = history().daily_buckets("D-101", date(4), 2);
        assert_eq!(buckets, vec![3.0, 0.0]);
    }

    #[test]
    fn test_moving_average_forecast() {
        let forecast =
            BucketingCalculator::moving_average_forecast(&history(), "D-101", date(5), 4, 7);

        assert_eq!(forecast.avg_daily_demand, 3.0);
        assert_eq!(forecast.forecast_qty, 21.0);
        // 偏差 1, 0, -3, 2 → 變異數 3.5
        assert_eq!(forecast.std_dev_daily, round_f64(3.5f64.sqrt(), 3));
    }

    #[test]
    fn test_prune_before() {
        let mut history = history();
        history.prune_before(date(2));
        assert_eq!(history.len(), 4);
        history.prune_before(date(10));
        assert!(history.is_empty());
    }

    #[test]
    fn test_mean_and_std_empty() {
        assert_eq!(BucketingCalculator::mean_and_std(&[]), (0.0, 0.0));
    }
}
