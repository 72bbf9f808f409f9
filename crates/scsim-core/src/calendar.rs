//! 日曆與季節性表格
//!
//! 月份、星期、期末以及供應商所在國家的節慶期間係數。

use chrono::{Datelike, NaiveDate};

/// 月份需求係數（1 月 ~ 12 月）
pub const DEMAND_MONTH_FACTORS: [f64; 12] = [
    0.8,  // 1 月：節後低迷
    0.85, // 2 月
    1.0,  // 3 月
    1.0,  // 4 月
    1.05, // 5 月
    0.9,  // 6 月：夏季淡季開始
    0.85, // 7 月
    0.85, // 8 月
    1.1,  // 9 月：回到正軌
    1.2,  // 10 月：第四季拉升
    1.4,  // 11 月：旺季
    1.3,  // 12 月
];

/// 星期需求係數（索引 0 = 週一, 6 = 週日）
pub const DEMAND_WEEKDAY_FACTORS: [f64; 7] = [0.85, 0.95, 1.0, 1.05, 1.25, 0.6, 0.4];

/// 月底（最後 3 天）加成
pub const MONTH_END_FACTOR: f64 = 1.2;

/// 季末月份（最後 5 天）額外加成
pub const QUARTER_END_FACTOR: f64 = 1.15;

/// 供應商季節性期間
///
/// 起訖皆為 (月, 日) 並包含端點；起點大於終點時表示跨年。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplierSeason {
    pub start: (u32, u32),
    pub end: (u32, u32),
    pub lead_time_mult: f64,
    pub reliability_mult: f64,
}

const fn season(
    start: (u32, u32),
    end: (u32, u32),
    lead_time_mult: f64,
    reliability_mult: f64,
) -> SupplierSeason {
    SupplierSeason {
        start,
        end,
        lead_time_mult,
        reliability_mult,
    }
}

const CHINA_SEASONS: [SupplierSeason; 4] = [
    // 農曆新年
    season((1, 15), (1, 31), 2.5, 0.7),
    season((2, 1), (2, 15), 3.0, 0.5),
    season((2, 16), (2, 28), 1.5, 0.8),
    // 十一黃金週
    season((10, 1), (10, 7), 1.8, 0.75),
];

const TAIWAN_SEASONS: [SupplierSeason; 3] = [
    season((1, 15), (1, 31), 2.0, 0.75),
    season((2, 1), (2, 15), 2.5, 0.6),
    season((2, 16), (2, 28), 1.3, 0.85),
];

const GERMANY_SEASONS: [SupplierSeason; 3] = [
    season((8, 1), (8, 31), 1.5, 0.85),
    season((12, 15), (12, 31), 1.8, 0.8),
    season((1, 1), (1, 6), 1.5, 0.85),
];

const USA_SEASONS: [SupplierSeason; 4] = [
    // 感恩節
    season((11, 20), (11, 30), 1.3, 0.9),
    season((12, 20), (12, 31), 1.5, 0.85),
    season((1, 1), (1, 3), 1.3, 0.9),
    // 美國國慶週
    season((7, 1), (7, 7), 1.2, 0.92),
];

/// 取得國家的供應商季節性表格（未知國家回傳空切片）
pub fn supplier_seasons(country: &str) -> &'static [SupplierSeason] {
    match country {
        "China" => &CHINA_SEASONS,
        "Taiwan" => &TAIWAN_SEASONS,
        "Germany" => &GERMANY_SEASONS,
        "USA" => &USA_SEASONS,
        _ => &[],
    }
}

/// 檢查 (月, 日) 是否落在期間內（處理跨年）
pub fn date_in_period(month: u32, day: u32, start: (u32, u32), end: (u32, u32)) -> bool {
    let current = (month, day);
    if start <= end {
        start <= current && current <= end
    } else {
        current >= start || current <= end
    }
}

/// 該月份的天數
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// 是否位於當月最後 `n` 天
pub fn is_last_days_of_month(date: NaiveDate, n: u32) -> bool {
    let last = days_in_month(date.year(), date.month());
    date.day() + n > last
}

/// 是否為季末月份（3、6、9、12 月）
pub fn is_quarter_end_month(month: u32) -> bool {
    matches!(month, 3 | 6 | 9 | 12)
}
