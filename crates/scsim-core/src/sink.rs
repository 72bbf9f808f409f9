//! 事件輸出介面

use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

/// 只追加的事件輸出
///
/// 寫入失敗由呼叫端記錄後略過，事件不重送。
pub trait EventSink: Send {
    /// 追加一行事件 JSON（`day` 為模擬日期，供依日分檔）
    fn append(&mut self, day: NaiveDate, line: &str) -> io::Result<()>;

    /// 追加一筆資料毀損紀錄
    fn append_corruption_meta(&mut self, _line: &str) -> io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 記憶體事件輸出
///
/// 可複製；所有複本共用同一份緩衝，方便在引擎外讀取。
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    meta: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 目前所有事件行的複本
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 目前所有資料毀損紀錄的複本
    pub fn corruption_meta(&self) -> Vec<String> {
        self.meta
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn append(&mut self, _day: NaiveDate, line: &str) -> io::Result<()> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?;
        lines.push(line.to_string());
        Ok(())
    }

    fn append_corruption_meta(&mut self, line: &str) -> io::Result<()> {
        let mut meta = self
            .meta
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?;
        meta.push(line.to_string());
        Ok(())
    }
}
