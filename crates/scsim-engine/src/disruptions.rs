//! 干擾與成本：黑天鵝、促銷、成本漂移

use chrono::Duration;
use rust_decimal::Decimal;
use scsim_core::event::{round_f64, BlackSwanEventEnded, BlackSwanEventStarted, PromoActive};
use scsim_core::{BlackSwanEvent, Event, Promo, BLACK_SWAN_TEMPLATES};

use crate::engine::SimulationEngine;
use crate::to_decimal;

/// 零件單價試算結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartCost {
    pub unit_cost: Decimal,
    pub base_cost: Decimal,
    /// 相對標準成本的差異（%）
    pub variance_pct: Decimal,
}

impl SimulationEngine {
    /// 依配置隨機產生黑天鵝事件
    ///
    /// 只在模擬三年以上時產生，開始時間落在第二年起到最後一年之前。
    pub(crate) fn generate_black_swan(&mut self) -> Option<BlackSwanEvent> {
        if !self.config.include_black_swan || self.config.simulation_years < 3 {
            return None;
        }

        let template = &BLACK_SWAN_TEMPLATES[self.rng.pick(BLACK_SWAN_TEMPLATES.len())?];
        let years = i64::from(self.config.simulation_years);
        let offset_days = self.rng.randint(365, 365 * (years - 1));

        Some(BlackSwanEvent::from_template(
            template,
            self.clock.now() + Duration::days(offset_days),
        ))
    }

    /// 黑天鵝開始/結束、促銷到期與每日促銷抽選
    pub(crate) fn update_disruptions(&mut self, new_day: bool) {
        let now = self.clock.now();

        if let Some(event) = self.black_swan.clone() {
            if event.starts_within_hour(now) {
                tracing::info!("黑天鵝事件開始: {}", event.name);
                self.emit(Event::BlackSwanEventStarted(BlackSwanEventStarted {
                    name: event.name.clone(),
                    affected_countries: event.affected_countries.clone(),
                    demand_multiplier: event.demand_multiplier,
                    lead_time_multiplier: event.lead_time_multiplier,
                }));
            }
            if event.ends_within_hour(now) {
                tracing::info!("黑天鵝事件結束: {}", event.name);
                self.emit(Event::BlackSwanEventEnded(BlackSwanEventEnded {
                    name: event.name.clone(),
                    duration_days: event.duration_days,
                }));
            }
        }

        self.promos.retain(|p| !p.is_expired(now));

        if new_day
            && self.config.promos_enabled
            && self.rng.chance(self.config.promo_daily_probability)
        {
            let multiplier = self
                .rng
                .uniform(self.config.promo_multiplier_min, self.config.promo_multiplier_max);
            let duration_days = self.rng.randint(
                i64::from(self.config.promo_duration_days_min),
                i64::from(self.config.promo_duration_days_max),
            );
            let duration_days =
                u32::try_from(duration_days).unwrap_or(self.config.promo_duration_days_min);

            let promo = Promo::new(self.ids.next_id(), now, duration_days, multiplier);
            tracing::debug!("促銷開始: {} ×{:.2}，{} 天", promo.promo_id, multiplier, duration_days);
            self.emit(Event::PromoActive(PromoActive {
                promo_id: promo.promo_id.clone(),
                start_time: promo.start_time,
                end_time: promo.end_time,
                duration_days,
                multiplier: round_f64(multiplier, 3),
            }));
            self.promos.push(promo);
        }
    }

    /// 每個模擬日套用一次成本隨機漂移
    pub(crate) fn apply_cost_drift(&mut self) {
        if !self.config.cost_drift_enabled {
            return;
        }
        let today = self.clock.today();
        if self.last_drift_day == Some(today) {
            return;
        }
        self.last_drift_day = Some(today);

        let daily = self.config.cost_drift_daily_pct;
        let max = self.config.cost_drift_max_pct;
        let part_ids: Vec<String> = self.master.parts().iter().map(|p| p.part_id.clone()).collect();

        for part_id in part_ids {
            let change = self.rng.uniform(-daily, daily);
            let drift = self.cost_drift.entry(part_id).or_insert(0.0);
            *drift = (*drift + change).max(-max).min(max);
        }
    }

    /// 含漂移與供應商價格係數的零件單價
    pub(crate) fn current_part_cost(&self, part_id: &str, price_multiplier: f64) -> PartCost {
        let base_cost = self
            .master
            .part(part_id)
            .map(|p| p.standard_cost)
            .unwrap_or(Decimal::TEN);
        let drift = self.cost_drift.get(part_id).copied().unwrap_or(0.0);

        let raw_cost = base_cost * to_decimal(1.0 + drift) * to_decimal(price_multiplier);
        let variance_pct = if base_cost > Decimal::ZERO {
            ((raw_cost - base_cost) / base_cost * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        PartCost {
            unit_cost: raw_cost.round_dp(2),
            base_cost: base_cost.round_dp(2),
            variance_pct,
        }
    }
}
