//! 模擬時鐘與決定性亂數
//!
//! 所有隨機決策都從同一條 [`SimRng`] 依固定順序取值；實體 ID 另由
//! [`IdGenerator`] 的獨立串流產生，不會擾動決策序列。

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// 模擬時鐘（每個 tick 前進一小時）
#[derive(Debug, Clone)]
pub struct SimClock {
    now: DateTime<Utc>,
    tick_count: u64,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: start,
            tick_count: 0,
        }
    }

    /// 從已儲存的狀態恢復
    pub fn resume(now: DateTime<Utc>, tick_count: u64) -> Self {
        Self { now, tick_count }
    }

    /// 前進一小時，回傳新的時間
    pub fn advance(&mut self) -> DateTime<Utc> {
        self.now += Duration::hours(1);
        self.tick_count += 1;
        self.now
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// 決策亂數串流
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: ChaCha20Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// 一次取值，小於 `p` 時為真
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// `[lo, hi)` 均勻分布；`hi <= lo` 時直接回傳 `lo`，不取值
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.rng.gen::<f64>()
    }

    /// `[lo, hi]` 整數；`hi <= lo` 時直接回傳 `lo`，不取值
    pub fn randint(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// 從長度 `len` 的清單中選一個索引
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.gen_range(0..len))
    }
}

/// 實體 ID 產生器（v4 格式 UUID）
#[derive(Debug, Clone)]
pub struct IdGenerator {
    rng: ChaCha20Rng,
}

impl IdGenerator {
    /// 與決策串流同種子，但使用另一條 ChaCha 串流
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(1);
        Self { rng }
    }

    pub fn next_id(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }
}
