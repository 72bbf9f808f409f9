//! # SCSim Engine
//!
//! 逐小時推進的供應鏈模擬引擎
//!
//! [`SimulationEngine`] 持有所有可變狀態，每次 [`SimulationEngine::tick`]
//! 依固定順序執行各階段；各階段分散在同名模組中的 `impl` 區塊。
//! 無狀態的計算（淨部位、批量、提前期、季節性、分桶預測）以計算器
//! 型別提供，可獨立測試。

pub mod allocation;
pub mod billing;
pub mod bucketing;
pub mod clock;
pub mod corruption;
pub mod demand;
pub mod disruptions;
pub mod engine;
pub mod fulfillment;
pub mod lead_time;
pub mod logistics;
pub mod lot_sizing;
pub mod netting;
pub mod procurement;
pub mod production;
pub mod seasonality;
pub mod snapshots;
pub mod status;

// Re-export 主要類型
pub use allocation::AllocationIndex;
pub use bucketing::{BucketingCalculator, DemandHistory};
pub use clock::{IdGenerator, SimClock, SimRng};
pub use corruption::{CorruptedLine, CorruptionInjector, CorruptionKind};
pub use disruptions::PartCost;
pub use engine::{EngineOptions, SimulationEngine, TickReport};
pub use lead_time::{LeadTimeCalculator, LeadTimeWindow};
pub use lot_sizing::LotSizingCalculator;
pub use netting::{NetPosition, NettingCalculator};
pub use seasonality::{SeasonalityCalculator, SupplierFactor};
pub use status::{BackorderSummary, DeliverySummary, StatusSnapshot};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// f64 轉 Decimal（NaN 或溢位時為 0）
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(1.5), Decimal::new(15, 1));
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
