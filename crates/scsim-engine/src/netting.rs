//! 淨部位計算

use rust_decimal::Decimal;
use scsim_core::{MasterData, PendingBackorder, PendingPurchaseOrder, ProductionJob};

/// 淨部位計算結果
#[derive(Debug, Clone, PartialEq)]
pub struct NetPosition {
    pub on_hand: Decimal,
    /// 預計入庫（在途採購或在製工單）
    pub incoming: Decimal,
    /// 已承諾的需求（工單用料或欠交）
    pub committed: Decimal,
}

impl NetPosition {
    /// 淨部位 = 現有 + 預計入庫 - 已承諾
    pub fn net(&self) -> Decimal {
        self.on_hand + self.incoming - self.committed
    }
}

/// 淨部位計算器
pub struct NettingCalculator;

impl NettingCalculator {
    /// 零件淨部位
    ///
    /// 已承諾需求為所有 Planned/WIP 工單的 BOM 用量 × 批量。
    pub fn part_position(
        part_id: &str,
        on_hand: Decimal,
        purchase_orders: &[PendingPurchaseOrder],
        jobs: &[ProductionJob],
        master: &MasterData,
    ) -> NetPosition {
        let incoming = purchase_orders
            .iter()
            .filter(|po| po.part_id == part_id)
            .map(|po| po.qty)
            .sum();

        let committed = jobs
            .iter()
            .filter(|job| job.status().is_in_flight())
            .map(|job| {
                master
                    .bom(&job.product_id)
                    .iter()
                    .filter(|c| c.component_id == part_id)
                    .map(|c| c.qty * job.qty_per_job)
                    .sum::<Decimal>()
            })
            .sum();

        NetPosition {
            on_hand,
            incoming,
            committed,
        }
    }

    /// 成品淨部位
    ///
    /// 預計入庫為 Planned/WIP 工單批量，已承諾為未結欠交數量。
    pub fn finished_goods_position(
        product_id: &str,
        on_hand: Decimal,
        jobs: &[ProductionJob],
        backorders: &[PendingBackorder],
    ) -> NetPosition {
        NetPosition {
            on_hand,
            incoming: Self::in_flight_production(product_id, jobs),
            committed: Self::outstanding_backorders(product_id, backorders),
        }
    }

    /// 產品在製（Planned + WIP）批量合計
    pub fn in_flight_production(product_id: &str, jobs: &[ProductionJob]) -> Decimal {
        jobs.iter()
            .filter(|job| job.product_id == product_id && job.status().is_in_flight())
            .map(|job| job.qty_per_job)
            .sum()
    }

    /// 產品未結欠交數量合計
    pub fn outstanding_backorders(product_id: &str, backorders: &[PendingBackorder]) -> Decimal {
        backorders
            .iter()
            .filter(|b| b.product_id == product_id)
            .map(|b| b.qty_remaining())
            .sum()
    }
}
