//! 資料毀損注入
//!
//! 啟用後對已序列化的事件行施加五種毀損之一，供下游練習錯誤處理。
//! 每一種毀損都只從決策串流取值，維持整體可重現。

use crate::clock::SimRng;

const INVALID_TIMESTAMPS: [&str; 6] = [
    "\"2026-02-30T12:00:00Z\"",
    "\"2026-13-01T12:00:00Z\"",
    "\"2026-01-01T25:00:00Z\"",
    "\"2026-01-01T12:60:00Z\"",
    "\"not-a-date\"",
    "\"\"",
];

const NULLABLE_FIELDS: [&str; 4] = ["customer_id", "supplier_id", "product_id", "part_id"];

/// 毀損類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    InvalidTimestamp,
    MissingComma,
    TruncatedLine,
    WrongType,
    NullInjection,
}

impl CorruptionKind {
    const ALL: [CorruptionKind; 5] = [
        CorruptionKind::InvalidTimestamp,
        CorruptionKind::MissingComma,
        CorruptionKind::TruncatedLine,
        CorruptionKind::WrongType,
        CorruptionKind::NullInjection,
    ];
}

/// 毀損結果
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptedLine {
    pub line: String,
    /// 寫入 meta 記錄的毀損標籤
    pub label: &'static str,
}

/// 毀損注入器
pub struct CorruptionInjector;

impl CorruptionInjector {
    /// 隨機選一種毀損並套用
    pub fn corrupt(line: &str, rng: &mut SimRng) -> CorruptedLine {
        let kind = rng
            .pick(CorruptionKind::ALL.len())
            .map(|i| CorruptionKind::ALL[i])
            .unwrap_or(CorruptionKind::TruncatedLine);
        Self::apply(kind, line, rng)
    }

    pub fn apply(kind: CorruptionKind, line: &str, rng: &mut SimRng) -> CorruptedLine {
        match kind {
            CorruptionKind::InvalidTimestamp => {
                let invalid = rng
                    .pick(INVALID_TIMESTAMPS.len())
                    .map(|i| INVALID_TIMESTAMPS[i])
                    .unwrap_or("\"\"");
                let line = replace_first_value(line, "timestamp", string_value_len, invalid)
                    .unwrap_or_else(|| line.to_string());
                CorruptedLine {
                    line,
                    label: "invalid_timestamp",
                }
            }
            CorruptionKind::MissingComma => {
                let commas: Vec<usize> = line.match_indices(',').map(|(i, _)| i).collect();
                match rng.pick(commas.len()) {
                    Some(i) => {
                        let pos = commas[i];
                        CorruptedLine {
                            line: format!("{}{}", &line[..pos], &line[pos + 1..]),
                            label: "missing_comma",
                        }
                    }
                    None => CorruptedLine {
                        line: line.to_string(),
                        label: "missing_comma_failed",
                    },
                }
            }
            CorruptionKind::TruncatedLine => {
                let total = line.chars().count();
                let cut = (total as f64 * rng.uniform(0.3, 0.8)).floor() as usize;
                CorruptedLine {
                    line: line.chars().take(cut).collect(),
                    label: "truncated_line",
                }
            }
            CorruptionKind::WrongType => {
                if let Some(line) = replace_first_value(line, "qty", digits_len, "\"not_a_number\"") {
                    return CorruptedLine {
                        line,
                        label: "wrong_type_qty",
                    };
                }
                if let Some(line) = replace_first_value(line, "order_id", string_value_len, "12345") {
                    return CorruptedLine {
                        line,
                        label: "wrong_type_order_id",
                    };
                }
                CorruptedLine {
                    line: line.to_string(),
                    label: "wrong_type_failed",
                }
            }
            CorruptionKind::NullInjection => {
                let field = rng
                    .pick(NULLABLE_FIELDS.len())
                    .map(|i| NULLABLE_FIELDS[i])
                    .unwrap_or("product_id");
                let line = replace_first_value(line, field, string_value_len, "null")
                    .unwrap_or_else(|| line.to_string());
                CorruptedLine {
                    line,
                    label: "null_injection",
                }
            }
        }
    }
}

/// 字串值（含引號）的長度
fn string_value_len(value: &str) -> Option<usize> {
    if !value.starts_with('"') {
        return None;
    }
    value[1..].find('"').map(|end| end + 2)
}

/// 開頭連續數字的長度
fn digits_len(value: &str) -> Option<usize> {
    let len = value.bytes().take_while(|b| b.is_ascii_digit()).count();
    (len > 0).then_some(len)
}

/// 取代第一個符合的 `"key": value`
fn replace_first_value(
    line: &str,
    key: &str,
    value_len: fn(&str) -> Option<usize>,
    replacement: &str,
) -> Option<String> {
    let needle = format!("\"{}\":", key);
    let mut search_from = 0;

    while let Some(offset) = line[search_from..].find(&needle) {
        let key_start = search_from + offset;
        let after_key = key_start + needle.len();
        let rest = &line[after_key..];
        let value_start = after_key + (rest.len() - rest.trim_start().len());

        if let Some(len) = value_len(&line[value_start..]) {
            return Some(format!(
                "{}\"{}\": {}{}",
                &line[..key_start],
                key,
                replacement,
                &line[value_start + len..]
            ));
        }
        search_from = after_key;
    }

    None
}
