//! 帳款：開立發票與收款

use chrono::{DateTime, Duration, Utc};
use scsim_core::event::{InvoiceCreated, PaymentReceived};
use scsim_core::{Event, PendingInvoice};

use crate::engine::SimulationEngine;
use crate::fulfillment::Shipment;

impl SimulationEngine {
    /// 每次出貨開立一張發票（取值：付款天數）
    pub(crate) fn issue_invoice(&mut self, shipment: &Shipment) {
        let now = self.clock.now();
        let days = self.rng.randint(
            i64::from(self.config.days_to_pay_min),
            i64::from(self.config.days_to_pay_max),
        );

        let invoice = PendingInvoice::new(
            self.ids.next_id(),
            shipment.order_id.clone(),
            shipment.customer_id.clone(),
            shipment.product_id.clone(),
            shipment.qty,
            shipment.unit_price,
            now,
            now + Duration::days(days),
        );
        self.ctc.record_invoice(invoice.amount);

        self.emit(Event::InvoiceCreated(InvoiceCreated {
            invoice_id: invoice.invoice_id.clone(),
            order_id: invoice.order_id.clone(),
            customer_id: invoice.customer_id.clone(),
            product_id: invoice.product_id.clone(),
            qty: invoice.qty,
            unit_price: invoice.unit_price,
            amount: invoice.amount,
            due_date: invoice.due_date,
        }));
        self.invoices.push(invoice);
    }

    /// 到期發票判定準時或延遲，延遲者到付款日才入帳
    pub(crate) fn process_invoices(&mut self) {
        let now = self.clock.now();
        let invoices = std::mem::take(&mut self.invoices);
        let mut open = Vec::with_capacity(invoices.len());

        for mut invoice in invoices {
            if invoice.is_late_settlement_due(now) {
                self.record_payment(&invoice, now, false);
                continue;
            }

            if invoice.is_unresolved() && invoice.is_due(now) {
                if self.rng.chance(self.config.late_payment_probability) {
                    let late_days = self.rng.randint(
                        i64::from(self.config.late_payment_days_min),
                        i64::from(self.config.late_payment_days_max),
                    );
                    invoice.late_settlement = Some(invoice.due_date + Duration::days(late_days));
                    tracing::debug!("發票 {} 將延遲 {} 天付款", invoice.invoice_id, late_days);
                    open.push(invoice);
                } else {
                    self.record_payment(&invoice, now, true);
                }
                continue;
            }

            open.push(invoice);
        }

        open.append(&mut self.invoices);
        self.invoices = open;
    }

    fn record_payment(&mut self, invoice: &PendingInvoice, paid_at: DateTime<Utc>, on_time: bool) {
        let days_late = if on_time {
            0
        } else {
            (paid_at - invoice.due_date).num_days().max(0)
        };

        self.ctc
            .record_payment(invoice.amount, on_time, invoice.days_to_pay(paid_at));
        self.emit(Event::PaymentReceived(PaymentReceived {
            invoice_id: invoice.invoice_id.clone(),
            order_id: invoice.order_id.clone(),
            customer_id: invoice.customer_id.clone(),
            amount: invoice.amount,
            due_date: invoice.due_date,
            paid_at,
            on_time,
            days_late,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use scsim_core::{MasterData, MemorySink, SimConfig};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()
    }

    fn build_engine(late_probability: f64) -> (SimulationEngine, MemorySink) {
        let mut config = SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_promos(false);
        config.days_to_pay_min = 30;
        config.days_to_pay_max = 30;
        config.late_payment_probability = late_probability;
        config.late_payment_days_min = 5;
        config.late_payment_days_max = 5;

        let sink = MemorySink::new();
        let engine = SimulationEngine::new(
            MasterData::new().finish(),
            config,
            EngineOptions::new(8, start()),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, sink)
    }

    fn shipment() -> Shipment {
        Shipment {
            order_id: "SO-1".to_string(),
            customer_id: "C-1".to_string(),
            product_id: "D-101".to_string(),
            qty: Decimal::from(3),
            unit_price: Decimal::new(19999, 2),
            destination: None,
        }
    }

    fn payments(sink: &MemorySink) -> Vec<serde_json::Value> {
        sink.lines()
            .iter()
            .filter(|l| l.contains("\"event_type\":\"PaymentReceived\""))
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_invoice_amount_and_due_date() {
        let (mut engine, _) = build_engine(0.0);
        engine.issue_invoice(&shipment());

        let invoice = &engine.invoices()[0];
        assert_eq!(invoice.amount, Decimal::new(59997, 2));
        assert_eq!(invoice.due_date, start() + Duration::days(30));
        assert_eq!(engine.ctc.invoices_issued, 1);
    }

    #[test]
    fn test_on_time_payment_at_due_date() {
        let (mut engine, sink) = build_engine(0.0);
        engine.issue_invoice(&shipment());

        engine.run_ticks(24 * 30 - 1).unwrap();
        assert!(payments(&sink).is_empty());

        engine.tick().unwrap();
        let paid = payments(&sink);
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0]["payload"]["on_time"], true);
        assert_eq!(paid[0]["payload"]["days_late"], 0);
        assert!(engine.invoices().is_empty());
    }

    #[test]
    fn test_late_payment_settles_after_delay() {
        let (mut engine, sink) = build_engine(1.0);
        engine.issue_invoice(&shipment());

        engine.run_ticks(24 * 30).unwrap();
        assert!(payments(&sink).is_empty());
        assert_eq!(
            engine.invoices()[0].late_settlement,
            Some(start() + Duration::days(35))
        );

        engine.run_ticks(24 * 5).unwrap();
        let paid = payments(&sink);
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0]["payload"]["on_time"], false);
        assert_eq!(paid[0]["payload"]["days_late"], 5);
        assert_eq!(paid[0]["payload"]["paid_at"], "2026-10-06T00:00:00Z");
    }
}
