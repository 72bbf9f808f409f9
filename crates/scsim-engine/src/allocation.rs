//! 出貨分配追溯
//!
//! 每個產品維護一條已完工工單的 FIFO 佇列，出貨時依序扣抵；
//! 佇列不足的部分視為無法追溯的現有庫存。

use std::collections::{BTreeMap, VecDeque};

use rust_decimal::Decimal;
use scsim_core::{AllocationSlice, AllocationSource};

/// 產品 → 工單來源佇列
#[derive(Debug, Clone, Default)]
pub struct AllocationIndex {
    sources: BTreeMap<String, VecDeque<AllocationSource>>,
}

impl AllocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 工單完工時登記來源
    pub fn push_source(&mut self, product_id: &str, source: AllocationSource) {
        if source.remaining <= Decimal::ZERO {
            return;
        }
        self.sources
            .entry(product_id.to_string())
            .or_default()
            .push_back(source);
    }

    /// 為一次出貨分配來源
    pub fn allocate(&mut self, product_id: &str, qty: Decimal) -> Vec<AllocationSlice> {
        let mut slices = Vec::new();
        let mut remaining_qty = qty;

        if let Some(queue) = self.sources.get_mut(product_id) {
            while remaining_qty > Decimal::ZERO {
                let Some(front) = queue.front_mut() else {
                    break;
                };

                let taken = front.remaining.min(remaining_qty);
                slices.push(AllocationSlice::from_job(front.job_id.clone(), taken));
                front.remaining -= taken;
                remaining_qty -= taken;

                if front.remaining <= Decimal::ZERO {
                    queue.pop_front();
                }
            }
        }

        if remaining_qty > Decimal::ZERO {
            slices.push(AllocationSlice::on_hand(remaining_qty));
        }

        slices
    }

    /// 產品尚可追溯的數量
    pub fn traceable_qty(&self, product_id: &str) -> Decimal {
        self.sources
            .get(product_id)
            .map(|q| q.iter().map(|s| s.remaining).sum())
            .unwrap_or(Decimal::ZERO)
    }
}
