//! 可變狀態的讀寫（庫存、生產排程、系統狀態）

use std::fs;
use std::path::{Path, PathBuf};

use scsim_core::{
    InventoryLedger, PersistentState, ProductionSchedule, Result, SimError, SystemState,
};
use serde::Serialize;

use crate::loader::read_optional_json;

pub const INVENTORY_FILE: &str = "inventory.json";
pub const PRODUCTION_SCHEDULE_FILE: &str = "production_schedule.json";
pub const SYSTEM_STATE_FILE: &str = "system_state.json";

/// 狀態檔存放目錄
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 讀取狀態；缺少的檔案視為空狀態
    pub fn load(&self) -> Result<PersistentState> {
        let inventory: InventoryLedger =
            read_optional_json(&self.data_dir.join(INVENTORY_FILE))?.unwrap_or_default();
        let schedule: ProductionSchedule =
            read_optional_json(&self.data_dir.join(PRODUCTION_SCHEDULE_FILE))?.unwrap_or_default();
        let system: Option<SystemState> =
            read_optional_json(&self.data_dir.join(SYSTEM_STATE_FILE))?;

        tracing::info!(
            "狀態載入完成：庫存 {} 項，進行中工單 {} 張",
            inventory.len(),
            schedule.active_jobs.len()
        );

        Ok(PersistentState {
            inventory,
            schedule,
            system,
        })
    }

    /// 寫出狀態（每個檔案先寫暫存檔再改名）
    pub fn save(&self, state: &PersistentState) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        write_json(&self.data_dir.join(INVENTORY_FILE), &state.inventory)?;
        write_json(&self.data_dir.join(PRODUCTION_SCHEDULE_FILE), &state.schedule)?;
        if let Some(system) = &state.system {
            write_json(&self.data_dir.join(SYSTEM_STATE_FILE), system)?;
        }

        tracing::info!("狀態已寫出: {}", self.data_dir.display());
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path).map_err(|e| {
        SimError::Io(std::io::Error::new(
            e.kind(),
            format!("無法寫入 {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use scsim_core::{BlackSwanEvent, InventoryEntry, ProductionJob};
    use tempfile::TempDir;

    fn sample_state() -> PersistentState {
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 4, 0, 0).unwrap();
        let mut wip = ProductionJob::new("J-2", "D-101", Decimal::from(5), 12, now).with_worker(3);
        wip.start(now).unwrap();

        PersistentState {
            inventory: InventoryLedger::new()
                .with_entry(
                    "P-001",
                    InventoryEntry::new(Decimal::from(120), Decimal::from(50), Decimal::from(20)),
                )
                .with_entry(
                    "D-101",
                    InventoryEntry::new(Decimal::from(3), Decimal::from(15), Decimal::from(5)),
                ),
            schedule: ProductionSchedule {
                active_jobs: vec![
                    ProductionJob::new("J-1", "D-101", Decimal::from(10), 8, now).with_worker(1),
                    wip,
                ],
            },
            system: Some(SystemState {
                current_time: now,
                tick_count: 42,
                black_swan: Some(BlackSwanEvent::new(
                    "Port Strike",
                    now + Duration::days(10),
                    30,
                    0.8,
                    2.5,
                    vec!["USA".into(), "CHN".into()],
                )),
            }),
        }
    }

    #[test]
    fn test_save_then_load_reproduces_state() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state"));
        let state = sample_state();

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, state);
        assert!(!dir.path().join("state/inventory.json.tmp").exists());
    }

    #[test]
    fn test_missing_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let state = StateStore::new(dir.path()).load().unwrap();
        assert!(state.inventory.is_empty());
        assert!(state.schedule.active_jobs.is_empty());
        assert!(state.system.is_none());
    }

    #[test]
    fn test_inventory_file_shape() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(INVENTORY_FILE),
            r#"{"P-003": {"qty_on_hand": 400, "reorder_point": 100, "safety_stock": 40}, "D-101": {"qty_on_hand": 0}}"#,
        )
        .unwrap();

        let state = StateStore::new(dir.path()).load().unwrap();
        assert_eq!(state.inventory.on_hand("P-003"), Decimal::from(400));
        assert_eq!(state.inventory.get("D-101").unwrap().reorder_point, Decimal::ZERO);
    }

    #[test]
    fn test_corrupt_state_file_is_data_load_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PRODUCTION_SCHEDULE_FILE), "[1, 2").unwrap();
        let err = StateStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, SimError::DataLoad { .. }));
    }
}
