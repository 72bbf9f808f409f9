//! 訂單履約：出貨、部分出貨、欠交與欠交補出

use rust_decimal::Decimal;
use scsim_core::event::{
    BackorderCreated, BackorderFulfilled, BackorderReason, JobTrigger, PartialShipmentCreated,
    ShipmentCreated,
};
use scsim_core::{Event, PendingBackorder, Result, SalesOrder};

use crate::engine::SimulationEngine;
use crate::lot_sizing::LotSizingCalculator;
use crate::netting::NettingCalculator;

/// 一次實際出貨（開立發票並排入待出貨）
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Shipment {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub qty: Decimal,
    pub unit_price: Decimal,
    pub destination: Option<String>,
}

impl Shipment {
    fn from_order(order: &SalesOrder, qty: Decimal) -> Self {
        Self {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: order.product_id.clone(),
            qty,
            unit_price: order.unit_price,
            destination: order.destination_facility_id.clone(),
        }
    }

    fn from_backorder(backorder: &PendingBackorder, qty: Decimal) -> Self {
        Self {
            order_id: backorder.order_id.clone(),
            customer_id: backorder.customer_id.clone(),
            product_id: backorder.product_id.clone(),
            qty,
            unit_price: backorder.unit_price,
            destination: backorder.destination_facility_id.clone(),
        }
    }
}

impl SimulationEngine {
    /// 履約一張銷售訂單
    pub(crate) fn fulfill(&mut self, order: SalesOrder) -> Result<()> {
        let product_id = order.product_id.clone();
        let on_hand = self.inventory.on_hand(&product_id);

        if on_hand >= order.qty {
            self.inventory.consume(&product_id, order.qty);
            let allocations = self.allocation.allocate(&product_id, order.qty);
            self.emit(Event::ShipmentCreated(ShipmentCreated {
                order_id: order.order_id.clone(),
                customer_id: order.customer_id.clone(),
                product_id: product_id.clone(),
                qty: order.qty,
                qty_ordered: order.qty,
                fulfillment_type: "full".to_string(),
                remaining_stock: self.inventory.on_hand(&product_id),
                allocations,
            }));
            self.ship(Shipment::from_order(&order, order.qty));
            return Ok(());
        }

        let backordered = order.qty - on_hand;
        let reason = if on_hand > Decimal::ZERO {
            self.inventory.consume(&product_id, on_hand);
            let allocations = self.allocation.allocate(&product_id, on_hand);
            self.emit(Event::PartialShipmentCreated(PartialShipmentCreated {
                order_id: order.order_id.clone(),
                customer_id: order.customer_id.clone(),
                product_id: product_id.clone(),
                qty_shipped: on_hand,
                qty_backordered: backordered,
                qty_ordered: order.qty,
                remaining_stock: self.inventory.on_hand(&product_id),
                allocations,
            }));
            self.ship(Shipment::from_order(&order, on_hand));
            BackorderReason::PartialStock
        } else {
            BackorderReason::NoStock
        };

        tracing::debug!("訂單 {} 欠交 {} ({:?})", order.order_id, backordered, reason);
        self.emit(Event::BackorderCreated(BackorderCreated {
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: product_id.clone(),
            qty_backordered: backordered,
            original_order_qty: order.qty,
            reason,
        }));
        self.backorders
            .push(PendingBackorder::from_order(&order, backordered, self.clock.now())?);

        self.cover_backorder_gap(&product_id);
        Ok(())
    }

    /// 在製量不足以覆蓋欠交時補開一張工單
    fn cover_backorder_gap(&mut self, product_id: &str) {
        let in_flight = NettingCalculator::in_flight_production(product_id, &self.jobs);
        let outstanding = NettingCalculator::outstanding_backorders(product_id, &self.backorders);

        if let Some(batch) =
            LotSizingCalculator::backorder_gap_batch(in_flight, outstanding, self.config.max_batch_size)
        {
            self.create_job(product_id, batch, JobTrigger::Backorder);
        }
    }

    /// 依 FIFO 以現有庫存補出欠交
    pub(crate) fn process_backorders(&mut self) {
        let mut backorders = std::mem::take(&mut self.backorders);

        for backorder in backorders.iter_mut() {
            let available = self.inventory.on_hand(&backorder.product_id);
            if available <= Decimal::ZERO {
                continue;
            }

            let shipped = backorder.fulfill(available);
            if shipped <= Decimal::ZERO {
                continue;
            }
            self.inventory.consume(&backorder.product_id, shipped);
            let allocations = self.allocation.allocate(&backorder.product_id, shipped);

            self.emit(Event::BackorderFulfilled(BackorderFulfilled {
                order_id: backorder.order_id.clone(),
                customer_id: backorder.customer_id.clone(),
                product_id: backorder.product_id.clone(),
                qty_shipped: shipped,
                qty_still_pending: backorder.qty_remaining(),
                original_order_qty: backorder.original_qty,
                remaining_stock: self.inventory.on_hand(&backorder.product_id),
                allocations,
            }));
            self.ship(Shipment::from_backorder(backorder, shipped));
        }

        backorders.retain(|b| !b.is_closed());
        backorders.append(&mut self.backorders);
        self.backorders = backorders;
    }

    fn ship(&mut self, shipment: Shipment) {
        self.issue_invoice(&shipment);
        self.stage_shipment(&shipment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use chrono::{DateTime, TimeZone, Utc};
    use scsim_core::{
        AllocationSource, BomComponent, Customer, Facility, InventoryEntry, InventoryLedger,
        MasterData, MemorySink, Product, SimConfig,
    };

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap()
    }

    fn build_engine(stock: i64) -> (SimulationEngine, MemorySink) {
        let master = MasterData::new()
            .with_bom("D-101", vec![BomComponent::new("P-001", Decimal::ONE)])
            .with_products(vec![Product::new("D-101").with_unit_price(Decimal::from(100))])
            .with_customers(vec![Customer::new("C-1", "Tier 1").with_destination("dist_na_01")])
            .with_facilities(vec![Facility::new(
                "dist_na_01",
                "distribution_center",
                "CHI",
            )])
            .finish();
        let config = SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_promos(false);
        let inventory = InventoryLedger::new().with_entry(
            "D-101",
            InventoryEntry::new(Decimal::from(stock), Decimal::ZERO, Decimal::ZERO),
        );
        let sink = MemorySink::new();
        let engine = SimulationEngine::new(
            master,
            config,
            EngineOptions::new(3, start()).with_inventory(inventory),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, sink)
    }

    fn order(qty: i64) -> SalesOrder {
        SalesOrder::new("SO-1", "C-1", "D-101", Decimal::from(qty), Decimal::from(100), start())
            .with_destination(Some("dist_na_01".to_string()))
    }

    fn events(sink: &MemorySink, event_type: &str) -> Vec<serde_json::Value> {
        let needle = format!("\"event_type\":\"{}\"", event_type);
        sink.lines()
            .iter()
            .filter(|l| l.contains(&needle))
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_full_shipment_with_invoice_and_staging() {
        let (mut engine, sink) = build_engine(20);
        engine.fulfill(order(5)).unwrap();

        let shipments = events(&sink, "ShipmentCreated");
        assert_eq!(shipments.len(), 1);
        assert_eq!(shipments[0]["payload"]["fulfillment_type"], "full");
        assert_eq!(shipments[0]["payload"]["remaining_stock"], 15.0);
        assert_eq!(engine.inventory().on_hand("D-101"), Decimal::from(15));

        let invoices = events(&sink, "InvoiceCreated");
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0]["payload"]["amount"], 500.0);
        assert_eq!(engine.staged_items(), 1);
        assert!(engine.backorders().is_empty());
    }

    #[test]
    fn test_partial_shipment_backorders_remainder() {
        let (mut engine, sink) = build_engine(3);
        engine.fulfill(order(5)).unwrap();

        let partial = events(&sink, "PartialShipmentCreated");
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0]["payload"]["qty_shipped"], 3.0);
        assert_eq!(partial[0]["payload"]["qty_backordered"], 2.0);

        let backorders = events(&sink, "BackorderCreated");
        assert_eq!(backorders[0]["payload"]["reason"], "partial_stock");
        assert_eq!(engine.backorders()[0].qty_remaining(), Decimal::from(2));

        // 只為已出貨的部分開立發票
        let invoices = events(&sink, "InvoiceCreated");
        assert_eq!(invoices[0]["payload"]["amount"], 300.0);

        let jobs = events(&sink, "ProductionJobCreated");
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["payload"]["trigger"], "backorder");
        assert_eq!(jobs[0]["payload"]["qty_per_job"], 2.0);
    }

    #[test]
    fn test_no_stock_backorder_covered_by_single_job() {
        let (mut engine, sink) = build_engine(0);
        engine.fulfill(order(5)).unwrap();

        let backorders = events(&sink, "BackorderCreated");
        assert_eq!(backorders[0]["payload"]["reason"], "no_stock");
        assert!(events(&sink, "InvoiceCreated").is_empty());
        assert_eq!(engine.active_jobs().len(), 1);

        // 第二張欠交只補在製量不足的差額
        let mut second = order(3);
        second.order_id = "SO-2".to_string();
        engine.fulfill(second).unwrap();
        assert_eq!(engine.active_jobs().len(), 2);
        assert_eq!(engine.active_jobs()[1].qty_per_job, Decimal::from(3));
    }

    #[test]
    fn test_backorder_replay_is_fifo_and_partial() {
        let (mut engine, sink) = build_engine(0);
        engine.fulfill(order(5)).unwrap();

        engine.inventory.receive("D-101", Decimal::from(3), InventoryEntry::default_product);
        engine.process_backorders();
        assert_eq!(engine.backorders()[0].qty_remaining(), Decimal::from(2));
        assert_eq!(engine.inventory().on_hand("D-101"), Decimal::ZERO);

        // 沒有庫存時不動作
        engine.process_backorders();
        assert_eq!(events(&sink, "BackorderFulfilled").len(), 1);

        engine.inventory.receive("D-101", Decimal::from(10), InventoryEntry::default_product);
        engine.process_backorders();
        assert!(engine.backorders().is_empty());
        assert_eq!(engine.inventory().on_hand("D-101"), Decimal::from(8));

        let fulfilled = events(&sink, "BackorderFulfilled");
        assert_eq!(fulfilled.len(), 2);
        assert_eq!(fulfilled[1]["payload"]["qty_still_pending"], 0.0);
        assert_eq!(events(&sink, "InvoiceCreated").len(), 2);
    }

    #[test]
    fn test_allocations_follow_completed_jobs_first() {
        let (mut engine, sink) = build_engine(20);
        engine
            .allocation
            .push_source("D-101", AllocationSource::new("J-1", Decimal::from(2)));
        engine.fulfill(order(5)).unwrap();

        let shipment = &events(&sink, "ShipmentCreated")[0];
        let allocations = shipment["payload"]["allocations"].as_array().unwrap();
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0]["source"]["job"], "J-1");
        assert_eq!(allocations[0]["qty"], 2.0);
        assert_eq!(allocations[1]["source"], "on_hand");
        assert_eq!(allocations[1]["qty"], 3.0);
    }
}
