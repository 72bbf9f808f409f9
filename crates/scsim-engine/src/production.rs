//! 生產排程：建立工單、開工、完工，以及成品再訂購點監控

use rust_decimal::Decimal;
use scsim_core::event::{JobTrigger, ProductionCompleted, ProductionJobCreated, ProductionStarted};
use scsim_core::{AllocationSource, Event, InventoryEntry, JobStatus, ProductionJob, Result};

use crate::engine::SimulationEngine;
use crate::lot_sizing::LotSizingCalculator;
use crate::netting::NettingCalculator;

impl SimulationEngine {
    /// 建立 Planned 工單（取值順序：生產時長、作業員）
    pub(crate) fn create_job(&mut self, product_id: &str, qty: Decimal, trigger: JobTrigger) {
        let now = self.clock.now();
        let duration = self.rng.randint(
            i64::from(self.config.production_duration_hours_min),
            i64::from(self.config.production_duration_hours_max),
        );
        let duration = u32::try_from(duration).unwrap_or(self.config.production_duration_hours_min);
        let worker = self.rng.randint(1, i64::from(self.config.worker_pool_size));
        let worker = u32::try_from(worker).unwrap_or(1);

        let job = ProductionJob::new(self.ids.next_id(), product_id, qty, duration, now)
            .with_worker(worker);

        tracing::debug!(
            "建立工單 {}：{} × {}，{} 小時",
            job.job_id,
            product_id,
            qty,
            duration
        );
        self.emit(Event::ProductionJobCreated(ProductionJobCreated {
            job_id: job.job_id.clone(),
            product_id: product_id.to_string(),
            status: job.status().as_str().to_string(),
            qty_per_job: qty,
            production_duration_hours: duration,
            assigned_worker_id: job.assigned_worker_id.clone(),
            due_date: job.due_date,
            trigger,
        }));
        self.jobs.push(job);
    }

    /// 成品再訂購點監控
    ///
    /// 每個產品每個模擬日最多觸發 `max_jobs_per_product_per_day` 張工單。
    pub(crate) fn check_finished_goods_reorder_points(&mut self, new_day: bool) {
        if new_day {
            self.fg_jobs_today.clear();
        }

        let candidates: Vec<(String, InventoryEntry)> = self
            .inventory
            .iter()
            .filter(|(id, _)| self.master.is_product(id))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();

        for (product_id, entry) in candidates {
            let created_today = self.fg_jobs_today.get(&product_id).copied().unwrap_or(0);
            if created_today >= self.config.max_jobs_per_product_per_day {
                continue;
            }

            let position = NettingCalculator::finished_goods_position(
                &product_id,
                entry.qty_on_hand,
                &self.jobs,
                &self.backorders,
            );
            let Some(batch) = LotSizingCalculator::finished_goods_batch(
                position.net(),
                entry.reorder_point,
                entry.safety_stock,
                self.config.max_batch_size,
            ) else {
                continue;
            };

            self.create_job(&product_id, batch, JobTrigger::ReorderPoint);
            *self.fg_jobs_today.entry(product_id).or_insert(0) += 1;
        }
    }

    /// 推進所有工單：Planned 備料齊全即開工，WIP 到時即完工
    pub(crate) fn run_production(&mut self) -> Result<()> {
        let mut jobs = std::mem::take(&mut self.jobs);
        let result = self.advance_jobs(&mut jobs);

        jobs.retain(|job| job.status() != JobStatus::Completed);
        jobs.append(&mut self.jobs);
        self.jobs = jobs;

        result
    }

    fn advance_jobs(&mut self, jobs: &mut [ProductionJob]) -> Result<()> {
        let now = self.clock.now();

        for job in jobs.iter_mut() {
            match job.status() {
                JobStatus::Planned => {
                    let missing = self.missing_parts(job);
                    if missing.is_empty() {
                        self.consume_parts(job);
                        let expected_completion = job.start(now)?;
                        self.emit(Event::ProductionStarted(ProductionStarted {
                            job_id: job.job_id.clone(),
                            product_id: job.product_id.clone(),
                            status: job.status().as_str().to_string(),
                            qty_per_job: job.qty_per_job,
                            expected_completion,
                        }));
                    } else {
                        for (part_id, qty) in missing {
                            if !self.parts_on_order.contains(&part_id) {
                                self.order_parts(&part_id, qty, false);
                            }
                        }
                    }
                }
                JobStatus::Wip if job.is_ready_to_complete(now) => {
                    job.complete(now)?;
                    let new_qty_on_hand = self.inventory.receive(
                        &job.product_id,
                        job.qty_per_job,
                        InventoryEntry::default_product,
                    );
                    self.allocation.push_source(
                        &job.product_id,
                        AllocationSource::new(job.job_id.clone(), job.qty_per_job),
                    );

                    tracing::debug!("工單 {} 完工，{} 庫存 {}", job.job_id, job.product_id, new_qty_on_hand);
                    self.emit(Event::ProductionCompleted(ProductionCompleted {
                        job_id: job.job_id.clone(),
                        product_id: job.product_id.clone(),
                        status: job.status().as_str().to_string(),
                        qty_completed: job.qty_per_job,
                        new_qty_on_hand,
                    }));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// 缺料清單（BOM 順序）：元件用量 × 批量 超過現有庫存的部分
    fn missing_parts(&self, job: &ProductionJob) -> Vec<(String, Decimal)> {
        self.master
            .bom(&job.product_id)
            .iter()
            .filter_map(|component| {
                let required = component.qty * job.qty_per_job;
                let on_hand = self.inventory.on_hand(&component.component_id);
                (on_hand < required).then(|| (component.component_id.clone(), required - on_hand))
            })
            .collect()
    }

    fn consume_parts(&mut self, job: &ProductionJob) {
        let components = self.master.bom(&job.product_id).to_vec();
        for component in components {
            self.inventory
                .consume(&component.component_id, component.qty * job.qty_per_job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use chrono::{DateTime, TimeZone, Utc};
    use scsim_core::{BomComponent, InventoryLedger, MasterData, MemorySink, Part, SimConfig};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap()
    }

    fn master() -> MasterData {
        MasterData::new()
            .with_parts(vec![
                Part::new("P-001", Decimal::from(12)),
                Part::new("P-003", Decimal::from(2)),
            ])
            .with_bom(
                "D-101",
                vec![
                    BomComponent::new("P-001", Decimal::ONE),
                    BomComponent::new("P-003", Decimal::from(4)),
                ],
            )
            .finish()
    }

    fn config() -> SimConfig {
        SimConfig::default()
            .with_demand_probabilities(0.0, 0.0)
            .with_production_duration(8, 8)
            .with_promos(false)
    }

    fn build_engine(inventory: InventoryLedger) -> (SimulationEngine, MemorySink) {
        let sink = MemorySink::new();
        let engine = SimulationEngine::new(
            master(),
            config(),
            EngineOptions::new(42, start()).with_inventory(inventory),
            Box::new(sink.clone()),
        )
        .unwrap();
        (engine, sink)
    }

    fn ledger(p001: i64, p003: i64, product: i64) -> InventoryLedger {
        InventoryLedger::new()
            .with_entry(
                "P-001",
                InventoryEntry::new(Decimal::from(p001), Decimal::ZERO, Decimal::ZERO),
            )
            .with_entry(
                "P-003",
                InventoryEntry::new(Decimal::from(p003), Decimal::ZERO, Decimal::ZERO),
            )
            .with_entry(
                "D-101",
                InventoryEntry::new(Decimal::from(product), Decimal::from(10), Decimal::ZERO),
            )
    }

    fn count(sink: &MemorySink, event_type: &str) -> usize {
        let needle = format!("\"event_type\":\"{}\"", event_type);
        sink.lines().iter().filter(|l| l.contains(&needle)).count()
    }

    #[test]
    fn test_reorder_point_job_runs_to_completion() {
        let (mut engine, sink) = build_engine(ledger(100, 100, 0));

        engine.tick().unwrap();
        assert_eq!(count(&sink, "ProductionJobCreated"), 1);
        assert_eq!(engine.active_jobs().len(), 1);
        assert_eq!(engine.active_jobs()[0].qty_per_job, Decimal::from(10));
        assert_eq!(engine.active_jobs()[0].status(), JobStatus::Wip);

        // 開工時扣料：1 × 10、4 × 10
        assert_eq!(engine.inventory().on_hand("P-001"), Decimal::from(90));
        assert_eq!(engine.inventory().on_hand("P-003"), Decimal::from(60));

        engine.run_ticks(8).unwrap();
        assert_eq!(count(&sink, "ProductionCompleted"), 1);
        assert_eq!(count(&sink, "ProductionJobCreated"), 1);
        assert!(engine.active_jobs().is_empty());
        assert_eq!(engine.inventory().on_hand("D-101"), Decimal::from(10));
    }

    #[test]
    fn test_missing_parts_trigger_purchase_orders() {
        let (mut engine, sink) = build_engine(ledger(100, 10, 0));
        engine.tick().unwrap();

        let job = &engine.active_jobs()[0];
        assert_eq!(job.status(), JobStatus::Planned);
        // 缺 4 × 10 - 10 = 30
        let po = engine
            .purchase_orders()
            .iter()
            .find(|po| po.part_id == "P-003")
            .unwrap();
        assert_eq!(po.qty, Decimal::from(30));
        assert_eq!(count(&sink, "ProductionStarted"), 0);
        // 未開工前不扣料
        assert_eq!(engine.inventory().on_hand("P-001"), Decimal::from(100));
    }

    #[test]
    fn test_daily_job_cap() {
        let mut config = config();
        config.max_jobs_per_product_per_day = 1;
        config.max_batch_size = 2;
        let sink = MemorySink::new();
        let mut engine = SimulationEngine::new(
            master(),
            config,
            EngineOptions::new(42, start()).with_inventory(ledger(0, 0, 0)),
            Box::new(sink.clone()),
        )
        .unwrap();

        engine.run_ticks(5).unwrap();
        assert_eq!(count(&sink, "ProductionJobCreated"), 1);

        // 跨日後重新計數
        engine.run_ticks(20).unwrap();
        assert_eq!(count(&sink, "ProductionJobCreated"), 2);
    }
}
