//! JSONL 事件輸出
//!
//! - [`DailyJsonlSink`]：依模擬日期分檔（`YYYY-MM-DD.jsonl`），服務模式使用
//! - [`SingleFileJsonlSink`]：所有事件寫入同一個檔案，批次產生歷史資料使用
//!
//! 兩者的資料毀損紀錄都寫在 `_meta/corruption_meta_log.jsonl`。

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use scsim_core::EventSink;

pub const META_DIR: &str = "_meta";
pub const CORRUPTION_META_FILE: &str = "corruption_meta_log.jsonl";

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

fn append_meta_line(meta_path: &Path, line: &str) -> io::Result<()> {
    let mut writer = open_append(meta_path)?;
    writeln!(writer, "{}", line)?;
    writer.flush()
}

/// 依模擬日期分檔的事件輸出
///
/// 同一時間只開啟當天的檔案；跨日時先清空舊檔緩衝再開新檔。
pub struct DailyJsonlSink {
    events_dir: PathBuf,
    current_day: Option<NaiveDate>,
    writer: Option<BufWriter<File>>,
}

impl DailyJsonlSink {
    pub fn new(events_dir: impl Into<PathBuf>) -> Self {
        Self {
            events_dir: events_dir.into(),
            current_day: None,
            writer: None,
        }
    }

    pub fn events_dir(&self) -> &Path {
        &self.events_dir
    }

    /// 指定日期的事件檔路徑
    pub fn day_path(&self, day: NaiveDate) -> PathBuf {
        self.events_dir
            .join(format!("{}.jsonl", day.format("%Y-%m-%d")))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.events_dir.join(META_DIR).join(CORRUPTION_META_FILE)
    }

    fn writer_for(&mut self, day: NaiveDate) -> io::Result<&mut BufWriter<File>> {
        if self.current_day != Some(day) || self.writer.is_none() {
            if let Some(mut previous) = self.writer.take() {
                previous.flush()?;
            }
            let path = self.day_path(day);
            tracing::debug!("開啟事件檔: {}", path.display());
            self.writer = Some(open_append(&path)?);
            self.current_day = Some(day);
        }

        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "事件檔未開啟"))
    }
}

impl EventSink for DailyJsonlSink {
    fn append(&mut self, day: NaiveDate, line: &str) -> io::Result<()> {
        let writer = self.writer_for(day)?;
        writeln!(writer, "{}", line)
    }

    fn append_corruption_meta(&mut self, line: &str) -> io::Result<()> {
        append_meta_line(&self.meta_path(), line)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// 單一檔案的事件輸出
pub struct SingleFileJsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SingleFileJsonlSink {
    /// 建立（或清空）輸出檔
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta_path(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(META_DIR)
            .join(CORRUPTION_META_FILE)
    }
}

impl EventSink for SingleFileJsonlSink {
    fn append(&mut self, _day: NaiveDate, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn append_corruption_meta(&mut self, line: &str) -> io::Result<()> {
        append_meta_line(&self.meta_path(), line)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_daily_sink_partitions_by_day() {
        let dir = TempDir::new().unwrap();
        let mut sink = DailyJsonlSink::new(dir.path().join("events"));

        sink.append(day(1), r#"{"n":1}"#).unwrap();
        sink.append(day(1), r#"{"n":2}"#).unwrap();
        sink.append(day(2), r#"{"n":3}"#).unwrap();
        sink.flush().unwrap();

        let first = fs::read_to_string(sink.day_path(day(1))).unwrap();
        assert_eq!(first, "{\"n\":1}\n{\"n\":2}\n");
        let second = fs::read_to_string(dir.path().join("events/2026-01-02.jsonl")).unwrap();
        assert_eq!(second, "{\"n\":3}\n");
    }

    #[test]
    fn test_daily_sink_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        {
            let mut sink = DailyJsonlSink::new(dir.path());
            sink.append(day(5), "a").unwrap();
            sink.flush().unwrap();
        }
        let mut sink = DailyJsonlSink::new(dir.path());
        sink.append(day(5), "b").unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(sink.day_path(day(5))).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_corruption_meta_log_location() {
        let dir = TempDir::new().unwrap();
        let mut sink = DailyJsonlSink::new(dir.path());
        sink.append_corruption_meta(r#"{"corruption_type":"null_injection"}"#)
            .unwrap();

        let meta = fs::read_to_string(dir.path().join("_meta/corruption_meta_log.jsonl")).unwrap();
        assert!(meta.contains("null_injection"));
    }

    #[test]
    fn test_single_file_sink_truncates_on_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history/history.jsonl");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale\n").unwrap();

        let mut sink = SingleFileJsonlSink::create(&path).unwrap();
        sink.append(day(1), "x").unwrap();
        sink.append(day(9), "y").unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x\ny\n");
        assert_eq!(sink.meta_path(), dir.path().join("history/_meta/corruption_meta_log.jsonl"));
    }
}
