//! 生產工單與庫存分配來源模型

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 工單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// 已計劃（等待零件）
    Planned,
    /// 生產中
    #[serde(rename = "WIP")]
    Wip,
    /// 已完工
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Planned => "Planned",
            JobStatus::Wip => "WIP",
            JobStatus::Completed => "Completed",
        }
    }

    /// 是否仍佔用產能（Planned 或 WIP）
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobStatus::Planned | JobStatus::Wip)
    }
}

fn default_batch() -> Decimal {
    Decimal::ONE
}

/// 生產工單
///
/// 狀態只能依 Planned → WIP → Completed 前進。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionJob {
    pub job_id: String,
    pub product_id: String,
    status: JobStatus,
    /// 批量
    #[serde(default = "default_batch")]
    pub qty_per_job: Decimal,
    pub production_duration_hours: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    expected_completion: Option<DateTime<Utc>>,
    #[serde(default)]
    actual_completion: Option<DateTime<Utc>>,
    pub assigned_worker_id: String,
}

impl ProductionJob {
    /// 建立 Planned 狀態的工單
    pub fn new(
        job_id: impl Into<String>,
        product_id: impl Into<String>,
        qty_per_job: Decimal,
        production_duration_hours: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            product_id: product_id.into(),
            status: JobStatus::Planned,
            qty_per_job,
            production_duration_hours,
            created_at,
            start_date: None,
            due_date: created_at + Duration::days(3),
            expected_completion: None,
            actual_completion: None,
            assigned_worker_id: String::new(),
        }
    }

    /// 建構器模式：指派作業員（編號格式 `WORKER-NNN`）
    pub fn with_worker(mut self, worker_number: u32) -> Self {
        self.assigned_worker_id = format!("WORKER-{:03}", worker_number);
        self
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn expected_completion(&self) -> Option<DateTime<Utc>> {
        self.expected_completion
    }

    pub fn actual_completion(&self) -> Option<DateTime<Utc>> {
        self.actual_completion
    }

    /// Planned → WIP
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if self.status != JobStatus::Planned {
            return Err(SimError::InvalidTransition(format!(
                "工單 {} 無法從 {} 開始生產",
                self.job_id,
                self.status.as_str()
            )));
        }
        let completion = now + Duration::hours(i64::from(self.production_duration_hours));
        self.status = JobStatus::Wip;
        self.start_date = Some(now);
        self.expected_completion = Some(completion);
        Ok(completion)
    }

    /// 是否已達預計完工時間
    pub fn is_ready_to_complete(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Wip
            && self.expected_completion.map(|t| now >= t).unwrap_or(false)
    }

    /// WIP → Completed
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != JobStatus::Wip {
            return Err(SimError::InvalidTransition(format!(
                "工單 {} 無法從 {} 完工",
                self.job_id,
                self.status.as_str()
            )));
        }
        self.status = JobStatus::Completed;
        self.actual_completion = Some(now);
        Ok(())
    }
}

/// 可追溯的庫存來源：已完工工單的剩餘數量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSource {
    pub job_id: String,
    pub remaining: Decimal,
}

impl AllocationSource {
    pub fn new(job_id: impl Into<String>, remaining: Decimal) -> Self {
        Self {
            job_id: job_id.into(),
            remaining,
        }
    }
}

/// 出貨數量的來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOrigin {
    /// 來自特定工單
    Job(String),
    /// 無法追溯的現有庫存
    OnHand,
}

/// 一次出貨的分配片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub source: StockOrigin,
    pub qty: Decimal,
}

impl AllocationSlice {
    pub fn from_job(job_id: impl Into<String>, qty: Decimal) -> Self {
        Self {
            source: StockOrigin::Job(job_id.into()),
            qty,
        }
    }

    pub fn on_hand(qty: Decimal) -> Self {
        Self {
            source: StockOrigin::OnHand,
            qty,
        }
    }
}
