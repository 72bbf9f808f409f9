//! 採購：零件再訂購、下單與收貨

use chrono::Duration;
use rust_decimal::Decimal;
use scsim_core::event::{
    round_f64, PartialShipment, PurchaseOrderCreated, PurchaseOrderReceived, QualityRejection,
    ReorderTriggered,
};
use scsim_core::{Event, InventoryEntry, PendingPurchaseOrder};

use crate::engine::SimulationEngine;
use crate::lead_time::LeadTimeCalculator;
use crate::lot_sizing::LotSizingCalculator;
use crate::netting::NettingCalculator;
use crate::seasonality::SeasonalityCalculator;
use crate::to_decimal;

/// 查不到供應商時使用的可靠度
const FALLBACK_RELIABILITY: f64 = 0.9;

impl SimulationEngine {
    /// 零件再訂購點監控（依零件編號排序，跳過已在途的零件）
    pub(crate) fn check_part_reorder_points(&mut self) {
        let candidates: Vec<(String, InventoryEntry)> = self
            .inventory
            .iter()
            .filter(|(id, _)| self.master.is_part(id) && !self.parts_on_order.contains(*id))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        for (part_id, entry) in candidates {
            let position = NettingCalculator::part_position(
                &part_id,
                entry.qty_on_hand,
                &self.purchase_orders,
                &self.jobs,
                &self.master,
            );
            let net = position.net();

            let Some(order_qty) = LotSizingCalculator::part_reorder_qty(
                net,
                entry.reorder_point,
                entry.safety_stock,
                self.config.reorder_buffer_qty,
            ) else {
                continue;
            };

            tracing::debug!(
                "零件 {} 淨部位 {} ≤ 再訂購點 {}，補貨 {}",
                part_id,
                net,
                entry.reorder_point,
                order_qty
            );
            self.emit(Event::ReorderTriggered(ReorderTriggered {
                part_id: part_id.clone(),
                qty_on_hand: entry.qty_on_hand,
                reorder_point: entry.reorder_point,
                net_position: net,
                order_qty,
            }));
            self.order_parts(&part_id, order_qty, true);
        }
    }

    /// 向供應商下單
    ///
    /// 取值順序：供應商、提前期、到貨抖動。
    pub(crate) fn order_parts(&mut self, part_id: &str, qty: Decimal, is_reorder: bool) {
        let now = self.clock.now();

        let supplier_ids: Vec<String> = self
            .master
            .part(part_id)
            .map(|p| p.valid_supplier_ids.clone())
            .unwrap_or_default();
        let supplier_id = self.rng.pick(supplier_ids.len()).map(|i| supplier_ids[i].clone());
        let supplier = supplier_id
            .as_deref()
            .and_then(|id| self.master.supplier(id))
            .cloned();

        let reliability = supplier
            .as_ref()
            .map(|s| s.reliability_score)
            .unwrap_or(FALLBACK_RELIABILITY);
        let price_multiplier = supplier.as_ref().map(|s| s.price_multiplier).unwrap_or(1.0);
        let country = supplier.as_ref().map(|s| s.country.clone());

        let seasonal = SeasonalityCalculator::supplier_factor(
            country.as_deref(),
            now,
            &self.config,
            self.black_swan.as_ref(),
        );
        let window = LeadTimeCalculator::window(
            self.config.base_lead_time_hours_min,
            self.config.base_lead_time_hours_max,
            reliability,
            seasonal,
        );
        let lead_time_hours = self.rng.randint(window.min_hours, window.draw_upper());
        let eta = now + Duration::hours(lead_time_hours);

        let jitter = i64::from(self.config.lead_time_jitter_hours);
        let jitter_hours = if jitter > 0 {
            self.rng.randint(-jitter, jitter)
        } else {
            0
        };

        let cost = self.current_part_cost(part_id, price_multiplier);
        let po = PendingPurchaseOrder::new(self.ids.next_id(), part_id, qty, now, eta)
            .with_supplier(supplier_id.clone())
            .with_actual_arrival(eta + Duration::hours(jitter_hours))
            .with_unit_cost(cost.unit_cost);
        let total_cost = po.total_cost();
        self.ctc.record_purchase(total_cost);

        self.emit(Event::PurchaseOrderCreated(PurchaseOrderCreated {
            purchase_order_id: po.purchase_order_id.clone(),
            part_id: part_id.to_string(),
            qty,
            supplier_id,
            supplier_country: country.unwrap_or_else(|| "Unknown".to_string()),
            supplier_reliability: reliability,
            effective_reliability: round_f64(reliability * seasonal.reliability_mult, 3),
            lead_time_hours,
            eta,
            is_reorder,
            unit_cost: cost.unit_cost,
            total_cost,
            base_cost: cost.base_cost,
            cost_variance_pct: cost.variance_pct,
            seasonal_lead_time_mult: seasonal.lead_time_mult,
            seasonal_reliability_mult: seasonal.reliability_mult,
        }));

        self.parts_on_order.insert(part_id.to_string());
        self.purchase_orders.push(po);
    }

    /// 處理已到貨的採購單
    pub(crate) fn process_purchase_orders(&mut self) {
        let now = self.clock.now();
        let (arrived, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.purchase_orders)
            .into_iter()
            .partition(|po| po.is_due(now));
        self.purchase_orders = pending;

        for po in arrived {
            self.receive_purchase_order(&po);
            self.parts_on_order.remove(&po.part_id);
        }
    }

    /// 收貨：部分出貨 → 品質退貨 → 入庫
    ///
    /// 退貨率套用在（可能已被部分出貨減少的）實收數量上。
    fn receive_purchase_order(&mut self, po: &PendingPurchaseOrder) {
        let reliability = po
            .supplier_id
            .as_deref()
            .and_then(|id| self.master.supplier(id))
            .map(|s| s.reliability_score)
            .unwrap_or(FALLBACK_RELIABILITY);

        let mut received = po.qty;
        let mut was_partial = false;

        let partial_probability = self.config.partial_shipment_probability * (1.1 - reliability);
        if self.rng.chance(partial_probability) {
            let pct = self.rng.uniform(
                self.config.partial_shipment_min_pct,
                self.config.partial_shipment_max_pct,
            );
            received = po.qty * to_decimal(pct);
            was_partial = true;

            self.emit(Event::PartialShipment(PartialShipment {
                purchase_order_id: po.purchase_order_id.clone(),
                part_id: po.part_id.clone(),
                ordered_qty: po.qty,
                received_qty: received.round_dp(2),
                supplier_id: po.supplier_id.clone(),
                shortfall_pct: round_f64((1.0 - pct) * 100.0, 1),
            }));
        }

        let base_reject_rate = self.rng.uniform(
            self.config.quality_reject_rate_min,
            self.config.quality_reject_rate_max,
        );
        let reject_rate = base_reject_rate * (1.2 - reliability);

        let mut rejected = Decimal::ZERO;
        if self.rng.chance(self.config.quality_issue_probability) {
            rejected = (received * to_decimal(reject_rate)).floor();
            if rejected > Decimal::ZERO {
                received -= rejected;
                self.emit(Event::QualityRejection(QualityRejection {
                    purchase_order_id: po.purchase_order_id.clone(),
                    part_id: po.part_id.clone(),
                    qty_rejected: rejected,
                    supplier_id: po.supplier_id.clone(),
                    reject_rate_pct: round_f64(reject_rate * 100.0, 2),
                }));
            }
        }

        let accepted = received.floor().max(Decimal::ZERO);
        let new_qty_on_hand = self
            .inventory
            .receive(&po.part_id, accepted, InventoryEntry::default_part);

        self.emit(Event::PurchaseOrderReceived(PurchaseOrderReceived {
            purchase_order_id: po.purchase_order_id.clone(),
            part_id: po.part_id.clone(),
            qty_ordered: po.qty,
            qty_received: accepted,
            qty_rejected: rejected,
            supplier_id: po.supplier_id.clone(),
            was_partial_shipment: was_partial,
            new_qty_on_hand,
            projected_eta: po.eta,
            actual_arrival: po.actual_arrival,
            arrival_variance_hours: po.arrival_variance_hours(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{EngineOptions, SimulationEngine};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use scsim_core::{
        BomComponent, InventoryEntry, InventoryLedger, MasterData, MemorySink, Part,
        PendingPurchaseOrder, SimConfig, Supplier,
    };

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap()
    }

    fn master() -> MasterData {
        MasterData::new()
            .with_suppliers(vec![Supplier::new("SUP-1", "USA", 0.95)])
            .with_parts(vec![
                Part::new("P-001", Decimal::from(12)).with_suppliers(vec!["SUP-1".into()]),
                Part::new("P-002", Decimal::from(3)).with_suppliers(vec!["SUP-1".into()]),
            ])
            .with_bom("D-101", vec![BomComponent::new("P-001", Decimal::ONE)])
            .finish()
    }

    fn build_engine(inventory: InventoryLedger) -> (SimulationEngine, MemorySink) {
        let sink = MemorySink::new();
        let config = SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_promos(false)
            .with_cost_drift(false);
        let engine = SimulationEngine::new(
            master(),
            config,
            EngineOptions::new(42, start()).with_inventory(inventory),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, sink)
    }

    fn stocked() -> InventoryLedger {
        InventoryLedger::new()
            .with_entry(
                "P-001",
                InventoryEntry::new(Decimal::from(30), Decimal::from(50), Decimal::from(20)),
            )
            .with_entry(
                "P-002",
                InventoryEntry::new(Decimal::from(500), Decimal::from(50), Decimal::from(20)),
            )
            .with_entry(
                "D-101",
                InventoryEntry::new(Decimal::from(100), Decimal::from(10), Decimal::ZERO),
            )
    }

    #[test]
    fn test_reorder_triggers_single_purchase_order() {
        let (mut engine, sink) = build_engine(stocked());
        engine.tick().unwrap();

        assert_eq!(engine.purchase_orders().len(), 1);
        let po = &engine.purchase_orders()[0];
        assert_eq!(po.part_id, "P-001");
        // 50 + 20 + 50 - 30
        assert_eq!(po.qty, Decimal::from(90));
        assert!(engine.parts_on_order().contains("P-001"));

        let lines = sink.lines();
        let reorder = lines.iter().position(|l| l.contains("ReorderTriggered")).unwrap();
        let created = lines.iter().position(|l| l.contains("PurchaseOrderCreated")).unwrap();
        assert!(reorder < created);

        // 已在途的零件不重複下單
        engine.tick().unwrap();
        assert_eq!(engine.purchase_orders().len(), 1);
    }

    #[test]
    fn test_purchase_order_is_received() {
        let (mut engine, sink) = build_engine(stocked());
        engine.tick().unwrap();
        let po = engine.purchase_orders()[0].clone();
        let hours = (po.actual_arrival - engine.now()).num_hours();
        engine.run_ticks(hours as u64).unwrap();

        assert!(engine
            .purchase_orders()
            .iter()
            .all(|p| p.purchase_order_id != po.purchase_order_id));
        let received = sink
            .lines()
            .into_iter()
            .find(|l| l.contains("PurchaseOrderReceived"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&received).unwrap();
        let qty_received = value["payload"]["qty_received"].as_f64().unwrap();
        assert!(qty_received > 0.0 && qty_received <= 90.0);
        assert_eq!(
            engine.inventory().on_hand("P-001"),
            Decimal::from(30) + Decimal::try_from(qty_received).unwrap()
        );
    }

    #[test]
    fn test_lead_time_within_window() {
        let (mut engine, sink) = build_engine(stocked());
        engine.tick().unwrap();

        let created = sink
            .lines()
            .into_iter()
            .find(|l| l.contains("PurchaseOrderCreated"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&created).unwrap();
        let lead_time = value["payload"]["lead_time_hours"].as_i64().unwrap();
        // USA 五月無季節效應，rf = 0.15 → [34, 56]
        assert!((34..=56).contains(&lead_time));
        assert_eq!(value["payload"]["supplier_country"], "USA");
        assert_eq!(value["payload"]["unit_cost"], 12.0);
    }

    fn payload(sink: &MemorySink, event_type: &str) -> Vec<serde_json::Value> {
        let marker = format!("\"event_type\":\"{}\"", event_type);
        sink.lines()
            .iter()
            .filter(|l| l.contains(&marker))
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["payload"].clone())
            .collect()
    }

    #[test]
    fn test_rejection_applies_to_partial_quantity() {
        // 可靠度 0.1：部分出貨機率 1.0 × (1.1 - 0.1)，退貨率 0.05 × (1.2 - 0.1)
        let master = MasterData::new()
            .with_suppliers(vec![Supplier::new("SUP-LOW", "USA", 0.1)])
            .with_parts(vec![
                Part::new("P-001", Decimal::from(12)).with_suppliers(vec!["SUP-LOW".into()])
            ])
            .finish();
        let mut config = SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_promos(false)
            .with_cost_drift(false);
        config.partial_shipment_probability = 1.0;
        config.partial_shipment_min_pct = 0.8;
        config.partial_shipment_max_pct = 0.8;
        config.quality_issue_probability = 1.0;
        config.quality_reject_rate_min = 0.05;
        config.quality_reject_rate_max = 0.05;

        let sink = MemorySink::new();
        let inventory = InventoryLedger::new().with_entry(
            "P-001",
            InventoryEntry::new(Decimal::from(10), Decimal::ZERO, Decimal::ZERO),
        );
        let mut engine = SimulationEngine::new(
            master,
            config,
            EngineOptions::new(42, start()).with_inventory(inventory),
            Box::new(sink.clone()),
        )
        .unwrap();

        let po = PendingPurchaseOrder::new("PO-1", "P-001", Decimal::from(100), start(), start())
            .with_supplier(Some("SUP-LOW".into()));
        engine.receive_purchase_order(&po);

        let partial = payload(&sink, "PartialShipment");
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0]["received_qty"], 80.0);

        // ⌊100 × 0.8 × 0.05 × 1.1⌋ = ⌊4.4⌋；若套用在訂購量上會是 5
        let rejection = payload(&sink, "QualityRejection");
        assert_eq!(rejection.len(), 1);
        assert_eq!(rejection[0]["qty_rejected"], 4.0);

        let received = payload(&sink, "PurchaseOrderReceived");
        assert_eq!(received[0]["qty_received"], 76.0);
        assert_eq!(received[0]["qty_rejected"], 4.0);
        assert_eq!(received[0]["was_partial_shipment"], true);
        assert_eq!(engine.inventory().on_hand("P-001"), Decimal::from(86));
    }
}
