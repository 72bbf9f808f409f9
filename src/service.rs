//! 長時間執行的模擬服務
//!
//! [`ServiceRunner`] 反覆呼叫 [`SimulationEngine::tick`]，每個 tick 之後
//! 清空事件緩衝並發佈一份 [`StatusSnapshot`]；停止時寫出狀態且只寫一次。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use scsim_engine::{SimulationEngine, StatusSnapshot};
use scsim_io::StateStore;

/// 協作式停止旗標（可複製，所有複本共用）
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// 要求服務在目前 tick 結束後停止
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// 狀態快照的唯讀存取
#[derive(Debug, Clone)]
pub struct StatusHandle {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusHandle {
    /// 最近一次發佈的快照
    pub fn snapshot(&self) -> StatusSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn publish(&self, snapshot: StatusSnapshot) {
        match self.inner.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

/// 服務選項
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// tick 之間的實際等待時間
    pub tick_interval: Duration,
    /// 最多執行的 tick 數；`None` 表示直到要求停止
    pub max_ticks: Option<u64>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            max_ticks: None,
        }
    }
}

impl ServiceOptions {
    /// 建構器模式：設置 tick 間隔
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// 建構器模式：設置 tick 上限
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }
}

/// 一次 [`ServiceRunner::run`] 的結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub failed_ticks: u64,
}

/// 模擬服務
pub struct ServiceRunner {
    engine: SimulationEngine,
    options: ServiceOptions,
    store: Option<StateStore>,
    shutdown: ShutdownHandle,
    status: StatusHandle,
    finished: bool,
}

impl ServiceRunner {
    pub fn new(engine: SimulationEngine, options: ServiceOptions) -> Self {
        let status = StatusHandle {
            inner: Arc::new(RwLock::new(engine.status_snapshot())),
        };
        Self {
            engine,
            options,
            store: None,
            shutdown: ShutdownHandle::new(),
            status,
            finished: false,
        }
    }

    /// 建構器模式：停止時將狀態寫入此目錄
    pub fn with_state_store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// 執行到要求停止或達到 tick 上限，然後寫出狀態
    ///
    /// 單一 tick 失敗只記錄錯誤，服務繼續執行。
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!("模擬服務啟動 @ {}", self.engine.now());

        while self.shutdown.is_running() {
            if let Some(max) = self.options.max_ticks {
                if summary.ticks_run >= max {
                    break;
                }
            }

            match self.engine.tick() {
                Ok(report) => {
                    tracing::debug!(
                        "tick {} 完成，事件 {} 筆",
                        report.tick,
                        report.events_emitted
                    );
                }
                Err(e) => {
                    summary.failed_ticks += 1;
                    tracing::error!("tick 執行失敗: {}", e);
                }
            }
            summary.ticks_run += 1;
            if let Err(e) = self.engine.flush_events() {
                tracing::warn!("事件清空失敗: {}", e);
            }
            self.status
                .publish(self.engine.status_snapshot().with_running(true));

            if !self.options.tick_interval.is_zero() {
                thread::sleep(self.options.tick_interval);
            }
        }

        self.finish();
        tracing::info!(
            "模擬服務停止：執行 {} 個 tick（失敗 {}）",
            summary.ticks_run,
            summary.failed_ticks
        );
        summary
    }

    /// 清空事件並寫出狀態；只有第一次呼叫會執行，回傳是否執行
    ///
    /// 寫出失敗只記錄錯誤。
    pub fn finish(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        self.shutdown.request_shutdown();

        if let Err(e) = self.engine.flush_events() {
            tracing::error!("事件清空失敗: {}", e);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.engine.export_state()) {
                tracing::error!("狀態寫出失敗: {}", e);
            }
        }
        self.status
            .publish(self.engine.status_snapshot().with_running(false));
        true
    }
}

impl Drop for ServiceRunner {
    fn drop(&mut self) {
        self.finish();
    }
}
