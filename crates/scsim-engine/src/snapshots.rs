//! 週期快照：需求預測（每週）、S&OP（每月）、現金循環指標（每週）

use chrono::{DateTime, Datelike, Duration, IsoWeek, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use scsim_core::event::{
    round_f64, CtcMetricsEmitted, DemandForecastCreated, SopProductLine, SopSnapshotCreated,
};
use scsim_core::{Event, JobStatus};

use crate::bucketing::BucketingCalculator;
use crate::engine::SimulationEngine;
use crate::netting::NettingCalculator;

/// S&OP 快照使用的預測天數
const SOP_FORECAST_DAYS: f64 = 30.0;

/// 各快照最後一次所屬的期間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMarks {
    pub forecast_week: IsoWeek,
    pub sop_month: (i32, u32),
    pub ctc_week: IsoWeek,
}

impl SnapshotMarks {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            forecast_week: start.iso_week(),
            sop_month: (start.year(), start.month()),
            ctc_week: start.iso_week(),
        }
    }
}

/// 現金循環累計器（每次輸出後歸零）
#[derive(Debug, Clone, PartialEq)]
pub struct CtcAccumulator {
    pub period_start: DateTime<Utc>,
    pub invoices_issued: u64,
    pub invoiced_amount: Decimal,
    pub payments_received: u64,
    pub collected_amount: Decimal,
    pub on_time_payments: u64,
    pub days_to_pay_total: i64,
    pub purchase_spend: Decimal,
}

impl CtcAccumulator {
    pub fn new(period_start: DateTime<Utc>) -> Self {
        Self {
            period_start,
            invoices_issued: 0,
            invoiced_amount: Decimal::ZERO,
            payments_received: 0,
            collected_amount: Decimal::ZERO,
            on_time_payments: 0,
            days_to_pay_total: 0,
            purchase_spend: Decimal::ZERO,
        }
    }

    pub fn record_invoice(&mut self, amount: Decimal) {
        self.invoices_issued += 1;
        self.invoiced_amount += amount;
    }

    pub fn record_payment(&mut self, amount: Decimal, on_time: bool, days_to_pay: i64) {
        self.payments_received += 1;
        self.collected_amount += amount;
        if on_time {
            self.on_time_payments += 1;
        }
        self.days_to_pay_total += days_to_pay;
    }

    pub fn record_purchase(&mut self, cost: Decimal) {
        self.purchase_spend += cost;
    }

    /// 準時付款比例（%，一位小數）
    pub fn on_time_pct(&self) -> f64 {
        if self.payments_received == 0 {
            return 0.0;
        }
        round_f64(
            self.on_time_payments as f64 / self.payments_received as f64 * 100.0,
            1,
        )
    }

    /// 平均付款天數（一位小數）
    pub fn avg_days_to_pay(&self) -> f64 {
        if self.payments_received == 0 {
            return 0.0;
        }
        round_f64(
            self.days_to_pay_total as f64 / self.payments_received as f64,
            1,
        )
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }
}

impl SimulationEngine {
    /// 跨越期間邊界時輸出快照
    pub(crate) fn emit_snapshots(&mut self) {
        let now = self.clock.now();

        if now.iso_week() != self.marks.forecast_week {
            self.marks.forecast_week = now.iso_week();
            self.emit_demand_forecast();
        }

        let month = (now.year(), now.month());
        if month != self.marks.sop_month {
            self.marks.sop_month = month;
            self.emit_sop_snapshot();
        }

        if now.iso_week() != self.marks.ctc_week {
            self.marks.ctc_week = now.iso_week();
            self.emit_ctc_metrics();
        }
    }

    fn emit_demand_forecast(&mut self) {
        let today = self.clock.today();
        let window = self.config.forecast_window_days;
        let horizon = self.config.forecast_horizon_days;
        self.demand_history
            .prune_before(today - Duration::days(i64::from(window)));

        let forecasts = self
            .master
            .products()
            .iter()
            .map(|p| {
                BucketingCalculator::moving_average_forecast(
                    &self.demand_history,
                    &p.product_id,
                    today,
                    window,
                    horizon,
                )
            })
            .collect();

        tracing::debug!("輸出需求預測 ({} 天視窗)", window);
        let forecast_id = self.ids.next_id();
        self.emit(Event::DemandForecastCreated(DemandForecastCreated {
            forecast_id,
            window_days: window,
            horizon_days: horizon,
            forecasts,
        }));
    }

    fn emit_sop_snapshot(&mut self) {
        let today = self.clock.today();
        let window = self.config.forecast_window_days;

        let products = self
            .master
            .products()
            .iter()
            .map(|p| {
                let product_id = p.product_id.as_str();
                let qty_on_hand = self.inventory.on_hand(product_id);
                let backorder_qty =
                    NettingCalculator::outstanding_backorders(product_id, &self.backorders);
                let wip_qty = self.job_qty(product_id, JobStatus::Wip);
                let planned_qty = self.job_qty(product_id, JobStatus::Planned);

                let forecast = BucketingCalculator::moving_average_forecast(
                    &self.demand_history,
                    product_id,
                    today,
                    window,
                    1,
                );
                let forecast_30d = round_f64(forecast.avg_daily_demand * SOP_FORECAST_DAYS, 2);
                let supply = (qty_on_hand + wip_qty + planned_qty - backorder_qty)
                    .to_f64()
                    .unwrap_or(0.0);

                SopProductLine {
                    product_id: product_id.to_string(),
                    qty_on_hand,
                    backorder_qty,
                    wip_qty,
                    planned_qty,
                    forecast_30d,
                    projected_net_position: round_f64(supply - forecast_30d, 2),
                }
            })
            .collect();

        let period = self.clock.now().format("%Y-%m").to_string();
        tracing::info!("輸出 S&OP 快照: {}", period);
        let snapshot_id = self.ids.next_id();
        self.emit(Event::SopSnapshotCreated(SopSnapshotCreated {
            snapshot_id,
            period,
            products,
        }));
    }

    fn emit_ctc_metrics(&mut self) {
        let now = self.clock.now();
        let open_receivables: Decimal = self.invoices.iter().map(|i| i.amount).sum();
        let ctc = &self.ctc;

        let event = CtcMetricsEmitted {
            period_start: ctc.period_start,
            period_end: now,
            invoices_issued: ctc.invoices_issued,
            invoiced_amount: ctc.invoiced_amount,
            payments_received: ctc.payments_received,
            collected_amount: ctc.collected_amount,
            on_time_payment_pct: ctc.on_time_pct(),
            avg_days_to_pay: ctc.avg_days_to_pay(),
            open_invoices: self.invoices.len() as u64,
            open_receivables,
            purchase_spend: ctc.purchase_spend,
        };

        self.emit(Event::CtcMetricsEmitted(event));
        self.ctc.reset(now);
    }

    fn job_qty(&self, product_id: &str, status: JobStatus) -> Decimal {
        self.jobs
            .iter()
            .filter(|j| j.product_id == product_id && j.status() == status)
            .map(|j| j.qty_per_job)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use chrono::TimeZone;
    use scsim_core::{BomComponent, MasterData, MemorySink, SimConfig};

    fn build_engine(start: DateTime<Utc>) -> (SimulationEngine, MemorySink) {
        let master = MasterData::new()
            .with_bom("D-101", vec![BomComponent::new("P-001", Decimal::ONE)])
            .finish();
        let config = SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_promos(false);
        let sink = MemorySink::new();
        let engine = SimulationEngine::new(
            master,
            config,
            EngineOptions::new(7, start),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, sink)
    }

    fn lines_of(sink: &MemorySink, event_type: &str) -> Vec<serde_json::Value> {
        let needle = format!("\"event_type\":\"{}\"", event_type);
        sink.lines()
            .iter()
            .filter(|l| l.contains(&needle))
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ctc_accumulator() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut ctc = CtcAccumulator::new(start);
        assert_eq!(ctc.on_time_pct(), 0.0);

        ctc.record_invoice(Decimal::from(100));
        ctc.record_payment(Decimal::from(100), true, 30);
        ctc.record_payment(Decimal::from(50), false, 41);
        ctc.record_payment(Decimal::from(50), true, 33);

        assert_eq!(ctc.on_time_pct(), 66.7);
        assert_eq!(ctc.avg_days_to_pay(), 34.7);
        assert_eq!(ctc.collected_amount, Decimal::from(200));

        ctc.reset(start + Duration::days(7));
        assert_eq!(ctc.payments_received, 0);
        assert_eq!(ctc.period_start, start + Duration::days(7));
    }

    #[test]
    fn test_weekly_snapshots_fire_on_iso_week_change() {
        // 2026-03-01 是週日
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let (mut engine, sink) = build_engine(start);

        engine.run_ticks(23).unwrap();
        assert!(lines_of(&sink, "DemandForecastCreated").is_empty());
        assert!(lines_of(&sink, "CTCMetricsEmitted").is_empty());

        engine.tick().unwrap();
        let forecasts = lines_of(&sink, "DemandForecastCreated");
        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0]["timestamp"], "2026-03-02T00:00:00Z");
        assert_eq!(forecasts[0]["payload"]["forecasts"][0]["product_id"], "D-101");
        assert_eq!(lines_of(&sink, "CTCMetricsEmitted").len(), 1);

        // 下一週才會再輸出
        engine.run_ticks(24 * 7 - 1).unwrap();
        assert_eq!(lines_of(&sink, "DemandForecastCreated").len(), 1);
        engine.tick().unwrap();
        assert_eq!(lines_of(&sink, "DemandForecastCreated").len(), 2);
    }

    #[test]
    fn test_sop_snapshot_on_month_change() {
        let start = Utc.with_ymd_and_hms(2026, 3, 31, 22, 0, 0).unwrap();
        let (mut engine, sink) = build_engine(start);

        engine.tick().unwrap();
        assert!(lines_of(&sink, "SOPSnapshotCreated").is_empty());

        engine.tick().unwrap();
        let snapshots = lines_of(&sink, "SOPSnapshotCreated");
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0]["payload"]["period"], "2026-04");
        let line = &snapshots[0]["payload"]["products"][0];
        assert_eq!(line["product_id"], "D-101");
        assert_eq!(line["forecast_30d"], 0.0);
    }
}
