//! 模擬引擎主體
//!
//! 每次 [`SimulationEngine::tick`] 前進一小時，並依固定順序執行各階段。
//! 隨機決策全部從同一條 [`SimRng`] 依序取值，所以同樣的種子與主資料
//! 一定重現同一段事件歷史。

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use scsim_core::event::{iso_utc, BlackSwanEventScheduled};
use scsim_core::{
    BlackSwanEvent, Event, EventRecord, EventSink, InventoryEntry, InventoryLedger, Load,
    MasterData, PendingBackorder, PendingInvoice, PendingPurchaseOrder, PersistentState,
    ProductionJob, ProductionSchedule, Promo, ReadyForShippingItem, Result, SimConfig,
    SystemState,
};

use crate::allocation::AllocationIndex;
use crate::bucketing::DemandHistory;
use crate::clock::{IdGenerator, SimClock, SimRng};
use crate::corruption::CorruptionInjector;
use crate::snapshots::{CtcAccumulator, SnapshotMarks};
use crate::status::{BackorderSummary, DeliverySummary, StatusSnapshot};

/// 引擎啟動選項
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub seed: u64,
    pub start_time: DateTime<Utc>,
    pub inventory: InventoryLedger,
    pub active_jobs: Vec<ProductionJob>,
    pub tick_count: u64,
    /// 指定的黑天鵝事件；未指定時依配置隨機產生
    pub black_swan: Option<BlackSwanEvent>,
    /// 從持久化狀態恢復：沿用已存的黑天鵝事件，不重新產生也不再發出排程事件
    pub resumed: bool,
}

impl EngineOptions {
    pub fn new(seed: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            seed,
            start_time,
            inventory: InventoryLedger::new(),
            active_jobs: Vec::new(),
            tick_count: 0,
            black_swan: None,
            resumed: false,
        }
    }

    /// 建構器模式：設置初始庫存
    pub fn with_inventory(mut self, inventory: InventoryLedger) -> Self {
        self.inventory = inventory;
        self
    }

    /// 建構器模式：設置進行中的工單
    pub fn with_jobs(mut self, jobs: Vec<ProductionJob>) -> Self {
        self.active_jobs = jobs;
        self
    }

    /// 建構器模式：從持久化狀態恢復（有系統狀態時沿用其時間與 tick 數）
    pub fn with_state(mut self, state: PersistentState) -> Self {
        self.inventory = state.inventory;
        self.active_jobs = state.schedule.active_jobs;
        if let Some(system) = state.system {
            self.start_time = system.current_time;
            self.tick_count = system.tick_count;
            self.black_swan = system.black_swan;
            self.resumed = true;
        }
        self
    }

    /// 建構器模式：指定黑天鵝事件
    pub fn with_black_swan(mut self, event: BlackSwanEvent) -> Self {
        self.black_swan = Some(event);
        self
    }
}

/// 單一 tick 的執行結果
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub time: DateTime<Utc>,
    /// 本 tick 發出的事件數
    pub events_emitted: u64,
}

/// 供應鏈模擬引擎
pub struct SimulationEngine {
    pub(crate) config: SimConfig,
    pub(crate) master: MasterData,
    pub(crate) clock: SimClock,
    pub(crate) rng: SimRng,
    pub(crate) ids: IdGenerator,

    pub(crate) inventory: InventoryLedger,
    pub(crate) jobs: Vec<ProductionJob>,
    pub(crate) purchase_orders: Vec<PendingPurchaseOrder>,
    /// 已有在途採購單的零件
    pub(crate) parts_on_order: BTreeSet<String>,
    pub(crate) backorders: Vec<PendingBackorder>,
    pub(crate) allocation: AllocationIndex,
    /// (收貨設施, 產品) → 待併批明細
    pub(crate) staging: BTreeMap<(String, String), Vec<ReadyForShippingItem>>,
    pub(crate) loads: Vec<Load>,
    pub(crate) invoices: Vec<PendingInvoice>,

    pub(crate) promos: Vec<Promo>,
    pub(crate) black_swan: Option<BlackSwanEvent>,
    /// 零件 → 累計成本漂移比例
    pub(crate) cost_drift: BTreeMap<String, f64>,
    pub(crate) last_drift_day: Option<NaiveDate>,
    /// 產品 → 當日由再訂購點觸發的工單數
    pub(crate) fg_jobs_today: BTreeMap<String, u32>,

    pub(crate) demand_history: DemandHistory,
    pub(crate) marks: SnapshotMarks,
    pub(crate) ctc: CtcAccumulator,

    sink: Box<dyn EventSink>,
    events_emitted: u64,
}

impl SimulationEngine {
    /// 創建引擎
    ///
    /// 驗證配置，並為主資料中的每個零件與產品補齊庫存條目。
    pub fn new(
        master: MasterData,
        config: SimConfig,
        options: EngineOptions,
        sink: Box<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;

        let EngineOptions {
            seed,
            start_time,
            mut inventory,
            mut active_jobs,
            tick_count,
            black_swan,
            resumed,
        } = options;

        for part in master.parts() {
            inventory.ensure(&part.part_id, InventoryEntry::default_part);
        }
        for product in master.products() {
            inventory.ensure(&product.product_id, InventoryEntry::default_product);
        }
        active_jobs.retain(|job| job.status().is_in_flight());

        let mut engine = Self {
            config,
            master,
            clock: SimClock::resume(start_time, tick_count),
            rng: SimRng::new(seed),
            ids: IdGenerator::new(seed),
            inventory,
            jobs: active_jobs,
            purchase_orders: Vec::new(),
            parts_on_order: BTreeSet::new(),
            backorders: Vec::new(),
            allocation: AllocationIndex::new(),
            staging: BTreeMap::new(),
            loads: Vec::new(),
            invoices: Vec::new(),
            promos: Vec::new(),
            black_swan: None,
            cost_drift: BTreeMap::new(),
            last_drift_day: None,
            fg_jobs_today: BTreeMap::new(),
            demand_history: DemandHistory::new(),
            marks: SnapshotMarks::new(start_time),
            ctc: CtcAccumulator::new(start_time),
            sink,
            events_emitted: 0,
        };

        if resumed {
            engine.black_swan = black_swan;
            if let Some(event) = &engine.black_swan {
                tracing::info!("沿用已排程的黑天鵝事件: {}", event.name);
            }
        } else {
            engine.black_swan = match black_swan {
                Some(event) => Some(event),
                None => engine.generate_black_swan(),
            };
        }
        if let Some(event) = engine.black_swan.clone().filter(|_| !resumed) {
            tracing::info!(
                "黑天鵝事件已排程: {} ({} ~ {})",
                event.name,
                iso_utc(event.start_date),
                iso_utc(event.end_date())
            );
            engine.emit(Event::BlackSwanEventScheduled(BlackSwanEventScheduled {
                name: event.name.clone(),
                start_date: event.start_date,
                end_date: event.end_date(),
                duration_days: event.duration_days,
                demand_multiplier: event.demand_multiplier,
                lead_time_multiplier: event.lead_time_multiplier,
                affected_countries: event.affected_countries.clone(),
            }));
        }

        tracing::info!(
            "模擬引擎初始化完成：零件 {} 個，產品 {} 個，客戶 {} 個，進行中工單 {} 張",
            engine.master.parts().len(),
            engine.master.products().len(),
            engine.master.customers().len(),
            engine.jobs.len()
        );

        Ok(engine)
    }

    /// 前進一小時並執行所有階段
    pub fn tick(&mut self) -> Result<TickReport> {
        let events_before = self.events_emitted;
        let previous_day = self.clock.today();

        // Step 1: 時鐘前進
        let now = self.clock.advance();
        let new_day = self.clock.today() != previous_day;

        tracing::debug!("tick {} @ {}", self.clock.tick_count(), iso_utc(now));

        // Step 2: 週期快照（預測、S&OP、現金循環）
        self.emit_snapshots();

        // Step 3: 黑天鵝與促銷
        self.update_disruptions(new_day);

        // Step 4: 成本漂移
        self.apply_cost_drift();

        // Step 5: 採購收貨
        self.process_purchase_orders();

        // Step 6: 欠交補出
        self.process_backorders();

        // Step 7: 收款
        self.process_invoices();

        // Step 8: 併批與交貨
        self.consolidate_loads();
        self.process_deliveries();

        // Step 9: 再訂購點監控（零件、成品）
        self.check_part_reorder_points();
        self.check_finished_goods_reorder_points(new_day);

        // Step 10: 需求
        self.generate_demand()?;

        // Step 11: 生產
        self.run_production()?;

        Ok(TickReport {
            tick: self.clock.tick_count(),
            time: now,
            events_emitted: self.events_emitted - events_before,
        })
    }

    /// 連續執行多個 tick
    pub fn run_ticks(&mut self, ticks: u64) -> Result<u64> {
        let mut emitted = 0;
        for _ in 0..ticks {
            emitted += self.tick()?.events_emitted;
        }
        Ok(emitted)
    }

    /// 序列化並寫出事件
    ///
    /// 寫入失敗只記錄警告，tick 照常進行。
    pub(crate) fn emit(&mut self, event: Event) {
        let record = EventRecord::new(self.clock.now(), event);
        let mut line = match record.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("事件序列化失敗 ({}): {}", record.event_type(), e);
                return;
            }
        };

        if self.config.data_corruption_enabled
            && self.rng.chance(self.config.data_corruption_probability)
        {
            let corrupted = CorruptionInjector::corrupt(&line, &mut self.rng);
            line = corrupted.line;

            let meta = serde_json::json!({
                "timestamp": iso_utc(self.clock.now()),
                "corrupted_event_type": record.event_type(),
                "corruption_type": corrupted.label,
            });
            if let Err(e) = self.sink.append_corruption_meta(&meta.to_string()) {
                tracing::warn!("毀損記錄寫入失敗: {}", e);
            }
        }

        if let Err(e) = self.sink.append(self.clock.today(), &line) {
            tracing::warn!("事件寫入失敗 ({}): {}", record.event_type(), e);
        }
        self.events_emitted += 1;
    }

    /// 清空事件輸出緩衝
    pub fn flush_events(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    // ==================== 查詢 ====================

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick_count()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn master(&self) -> &MasterData {
        &self.master
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn active_jobs(&self) -> &[ProductionJob] {
        &self.jobs
    }

    pub fn purchase_orders(&self) -> &[PendingPurchaseOrder] {
        &self.purchase_orders
    }

    pub fn parts_on_order(&self) -> &BTreeSet<String> {
        &self.parts_on_order
    }

    pub fn backorders(&self) -> &[PendingBackorder] {
        &self.backorders
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn invoices(&self) -> &[PendingInvoice] {
        &self.invoices
    }

    pub fn promos(&self) -> &[Promo] {
        &self.promos
    }

    pub fn black_swan(&self) -> Option<&BlackSwanEvent> {
        self.black_swan.as_ref()
    }

    /// 尚未併入運輸批次的明細數
    pub fn staged_items(&self) -> usize {
        self.staging.values().map(Vec::len).sum()
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted
    }

    /// 產生狀態快照（執行旗標由服務層設定）
    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            current_time: self.clock.now(),
            tick_count: self.clock.tick_count(),
            running: false,
            inventory: self.inventory.clone(),
            backorders: self
                .backorders
                .iter()
                .map(|b| BackorderSummary {
                    order_id: b.order_id.clone(),
                    product_id: b.product_id.clone(),
                    qty_remaining: b.qty_remaining(),
                    created_at: b.created_at,
                })
                .collect(),
            in_flight_deliveries: self
                .loads
                .iter()
                .map(|l| DeliverySummary {
                    load_id: l.load_id.clone(),
                    product_id: l.product_id.clone(),
                    qty: l.qty,
                    destination_facility_id: l.destination_facility_id.clone(),
                    scheduled_delivery: l.scheduled_delivery,
                })
                .collect(),
            active_jobs: self.jobs.len(),
            open_purchase_orders: self.purchase_orders.len(),
            open_invoices: self.invoices.len(),
            events_emitted: self.events_emitted,
        }
    }

    /// 匯出可持久化的狀態
    pub fn export_state(&self) -> PersistentState {
        PersistentState {
            inventory: self.inventory.clone(),
            schedule: ProductionSchedule {
                active_jobs: self.jobs.clone(),
            },
            system: Some(SystemState {
                current_time: self.clock.now(),
                tick_count: self.clock.tick_count(),
                black_swan: self.black_swan.clone(),
            }),
        }
    }
}
