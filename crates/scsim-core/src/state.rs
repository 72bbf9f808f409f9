//! 可持久化的引擎狀態

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::disruption::BlackSwanEvent;
use crate::inventory::InventoryLedger;
use crate::plan::ProductionJob;

/// 生產排程（`production_schedule.json`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionSchedule {
    #[serde(default)]
    pub active_jobs: Vec<ProductionJob>,
}

/// 系統狀態（`system_state.json`），用於恢復模擬時間
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub current_time: DateTime<Utc>,
    pub tick_count: u64,
    /// 已排程的黑天鵝事件；恢復時沿用，不重新抽選
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_swan: Option<BlackSwanEvent>,
}

/// 關機時寫出、啟動時讀回的完整狀態
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentState {
    pub inventory: InventoryLedger,
    pub schedule: ProductionSchedule,
    pub system: Option<SystemState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_accepts_missing_jobs() {
        let schedule: ProductionSchedule = serde_json::from_str("{}").unwrap();
        assert!(schedule.active_jobs.is_empty());
    }

    #[test]
    fn test_system_state_json() {
        let state: SystemState = serde_json::from_str(
            r#"{"current_time": "2026-01-01T05:00:00Z", "tick_count": 5}"#,
        )
        .unwrap();
        assert_eq!(state.tick_count, 5);
        assert!(state.black_swan.is_none());
        assert_eq!(
            serde_json::to_value(&state).unwrap()["current_time"],
            "2026-01-01T05:00:00Z"
        );
    }

    #[test]
    fn test_system_state_keeps_black_swan() {
        let state: SystemState = serde_json::from_str(
            r#"{
                "current_time": "2026-01-01T05:00:00Z",
                "tick_count": 5,
                "black_swan": {
                    "name": "Port Strike",
                    "start_date": "2026-03-01T00:00:00Z",
                    "duration_days": 30,
                    "demand_multiplier": 0.8,
                    "lead_time_multiplier": 2.5,
                    "affected_countries": ["USA"]
                }
            }"#,
        )
        .unwrap();
        let event = state.black_swan.as_ref().unwrap();
        assert_eq!(event.name, "Port Strike");
        assert_eq!(event.duration_days, 30);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["black_swan"]["affected_countries"][0], "USA");
    }
}
