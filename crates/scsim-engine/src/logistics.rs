//! 出貨物流：待出貨、併批、交貨

use chrono::Duration;
use rust_decimal::Decimal;
use scsim_core::event::{DeliveryEvent, DeliveryKind, LoadCreated};
use scsim_core::{Event, Load, ReadyForShippingItem};

use crate::engine::SimulationEngine;
use crate::fulfillment::Shipment;

impl SimulationEngine {
    /// 將出貨明細排入 (設施, 產品) 的待出貨群組
    pub(crate) fn stage_shipment(&mut self, shipment: &Shipment) {
        let Some(destination) = shipment.destination.clone() else {
            tracing::debug!("訂單 {} 沒有收貨設施，不進入物流", shipment.order_id);
            return;
        };

        let unit_weight = self
            .master
            .product(&shipment.product_id)
            .and_then(|p| p.weight_lbs)
            .unwrap_or(self.config.default_unit_weight_lbs);

        let item = ReadyForShippingItem {
            order_id: shipment.order_id.clone(),
            customer_id: shipment.customer_id.clone(),
            product_id: shipment.product_id.clone(),
            qty: shipment.qty,
            weight: shipment.qty * unit_weight,
            destination_facility_id: destination.clone(),
            staged_at: self.clock.now(),
        };
        self.staging
            .entry((destination, shipment.product_id.clone()))
            .or_default()
            .push(item);
    }

    /// 重量達門檻或最早明細已等候滿天數的群組併成一個運輸批次
    pub(crate) fn consolidate_loads(&mut self) {
        let now = self.clock.now();
        let threshold = self.config.load_weight_threshold_lbs;
        let max_age = Duration::days(i64::from(self.config.max_consolidation_days));

        let ready: Vec<(String, String)> = self
            .staging
            .iter()
            .filter(|(_, items)| {
                let weight: Decimal = items.iter().map(|i| i.weight).sum();
                let aged = items
                    .first()
                    .map(|i| now - i.staged_at >= max_age)
                    .unwrap_or(false);
                !items.is_empty() && (weight >= threshold || aged)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in ready {
            if let Some(items) = self.staging.remove(&key) {
                self.dispatch_load(&items);
            }
        }
    }

    /// 建立運輸批次（取值順序：是否中斷、中斷天數或抖動時數）
    fn dispatch_load(&mut self, items: &[ReadyForShippingItem]) {
        let now = self.clock.now();
        let Some(first) = items.first() else {
            return;
        };

        let plant = self.master.plant().cloned();
        let destination_code = self
            .master
            .facility(&first.destination_facility_id)
            .map(|f| f.location_code.clone());
        let route = match (plant.as_ref(), destination_code.as_deref()) {
            (Some(plant), Some(code)) => self.master.outbound_route(&plant.location_code, code).cloned(),
            _ => None,
        };
        let transit_days = route
            .as_ref()
            .map(|r| r.typical_transit_days)
            .unwrap_or(self.config.default_transit_days);

        let Some(load) = Load::from_items(self.ids.next_id(), items, now, transit_days) else {
            return;
        };
        let mut load = load.with_route(
            plant.map(|p| p.facility_id),
            route.and_then(|r| r.route_id),
        );

        if self.rng.chance(self.config.transit_disruption_probability) {
            let delay_days = self.rng.randint(
                i64::from(self.config.disruption_delay_days_min),
                i64::from(self.config.disruption_delay_days_max),
            );
            tracing::debug!("運輸批次 {} 中斷，延遲 {} 天", load.load_id, delay_days);
            let actual = load.scheduled_delivery + Duration::days(delay_days);
            load.set_actual_delivery(actual, true);
        } else {
            let jitter = i64::from(self.config.transit_jitter_hours);
            let jitter_hours = self.rng.randint(-jitter, jitter);
            let actual = load.scheduled_delivery + Duration::hours(jitter_hours);
            load.set_actual_delivery(actual, false);
        }

        self.emit(Event::LoadCreated(LoadCreated {
            load_id: load.load_id.clone(),
            order_ids: load.order_ids.clone(),
            customer_ids: load.customer_ids.clone(),
            product_id: load.product_id.clone(),
            qty: load.qty,
            weight_lbs: load.weight,
            origin_facility_id: load.origin_facility_id.clone(),
            destination_facility_id: load.destination_facility_id.clone(),
            route_id: load.route_id.clone(),
            transit_days: load.transit_days,
            scheduled_pickup: load.scheduled_pickup,
            scheduled_delivery: load.scheduled_delivery,
        }));
        self.loads.push(load);
    }

    /// 到達實際交貨時間的批次依序輸出取貨與交貨事件
    pub(crate) fn process_deliveries(&mut self) {
        let now = self.clock.now();
        let (delivered, in_transit): (Vec<Load>, Vec<Load>) = std::mem::take(&mut self.loads)
            .into_iter()
            .partition(|l| l.is_delivered_by(now));
        self.loads = in_transit;

        for load in delivered {
            self.emit(Event::DeliveryEvent(DeliveryEvent {
                load_id: load.load_id.clone(),
                delivery_type: DeliveryKind::Pickup,
                facility_id: load.origin_facility_id.clone(),
                order_ids: load.order_ids.clone(),
                scheduled_time: load.scheduled_pickup,
                actual_time: load.scheduled_pickup,
                on_time: true,
                disrupted: false,
            }));

            let on_time = load.is_on_time(self.config.delivery_grace_hours);
            self.emit(Event::DeliveryEvent(DeliveryEvent {
                load_id: load.load_id.clone(),
                delivery_type: DeliveryKind::Delivery,
                facility_id: Some(load.destination_facility_id.clone()),
                order_ids: load.order_ids,
                scheduled_time: load.scheduled_delivery,
                actual_time: load.actual_delivery,
                on_time,
                disrupted: load.disrupted,
            }));
        }
    }
}
