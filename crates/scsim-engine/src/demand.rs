//! 需求產生

use chrono::Timelike;
use rust_decimal::Decimal;
use scsim_core::event::SalesOrderCreated;
use scsim_core::{Customer, DemandRecord, Event, Result, SalesOrder};

use crate::engine::SimulationEngine;
use crate::seasonality::SeasonalityCalculator;

impl SimulationEngine {
    /// 本小時的下單機率（營業時段 × 季節性、促銷與黑天鵝係數）
    pub fn demand_probability(&self) -> f64 {
        let now = self.clock.now();
        let hour = now.hour();
        let base = if hour >= self.config.business_hours_start && hour < self.config.business_hours_end
        {
            self.config.demand_probability_business_hours
        } else {
            self.config.demand_probability_base
        };

        base * SeasonalityCalculator::demand_factor(
            now,
            &self.config,
            self.black_swan.as_ref(),
            &self.promos,
        )
    }

    /// 每小時最多產生一張銷售訂單
    ///
    /// 取值順序：是否下單、客戶、是否大量、數量、產品。
    pub(crate) fn generate_demand(&mut self) -> Result<()> {
        if self.master.customers().is_empty() || self.master.products().is_empty() {
            return Ok(());
        }

        let probability = self.demand_probability();
        if !self.rng.chance(probability) {
            return Ok(());
        }

        let Some(customer) = self.select_customer() else {
            return Ok(());
        };

        let (qty_min, qty_max) = if self.rng.chance(self.config.bulk_order_probability) {
            (self.config.bulk_order_qty_min, self.config.bulk_order_qty_max)
        } else {
            (self.config.normal_order_qty_min, self.config.normal_order_qty_max)
        };
        let qty = Decimal::from(self.rng.randint(i64::from(qty_min), i64::from(qty_max)));

        let Some(product_index) = self.rng.pick(self.master.products().len()) else {
            return Ok(());
        };
        let product_id = self.master.products()[product_index].product_id.clone();
        let unit_price = self
            .master
            .unit_price(&product_id, self.config.product_price_markup);

        let now = self.clock.now();
        let order = SalesOrder::new(
            self.ids.next_id(),
            customer.customer_id.clone(),
            product_id.clone(),
            qty,
            unit_price,
            now,
        )
        .with_destination(customer.destination_facility_id.clone());

        tracing::debug!(
            "新訂單 {}：{} 向 {} 訂購 {}",
            order.order_id,
            customer.customer_id,
            product_id,
            qty
        );
        self.emit(Event::SalesOrderCreated(SalesOrderCreated {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: product_id.clone(),
            qty,
            unit_price,
            destination_facility_id: order.destination_facility_id.clone(),
        }));
        self.demand_history
            .record(DemandRecord::new(self.clock.today(), product_id, qty));

        self.fulfill(order)
    }

    /// 有 Tier 1 客戶時依機率優先選 Tier 1，否則選 Tier 2，都沒有時任選
    fn select_customer(&mut self) -> Option<Customer> {
        let customers = self.master.customers();
        let (tier1, tier2): (Vec<&Customer>, Vec<&Customer>) =
            customers.iter().partition(|c| c.is_tier1());

        let pool: Vec<&Customer> = if !tier1.is_empty()
            && self.rng.chance(self.config.tier1_selection_probability)
        {
            tier1
        } else if !tier2.is_empty() {
            tier2
        } else {
            customers.iter().collect()
        };

        let index = self.rng.pick(pool.len())?;
        Some(pool[index].clone())
    }
}
