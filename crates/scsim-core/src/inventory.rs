//! 庫存模型

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 庫存狀態（零件或成品共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// 現有庫存（永不為負）
    pub qty_on_hand: Decimal,

    /// 再訂購點
    #[serde(default)]
    pub reorder_point: Decimal,

    /// 安全庫存
    #[serde(default)]
    pub safety_stock: Decimal,
}

impl InventoryEntry {
    /// 創建新的庫存記錄（負數在建立時即歸零）
    pub fn new(qty_on_hand: Decimal, reorder_point: Decimal, safety_stock: Decimal) -> Self {
        Self {
            qty_on_hand: qty_on_hand.max(Decimal::ZERO),
            reorder_point,
            safety_stock,
        }
    }

    /// 零件首次入庫的預設值
    pub fn default_part() -> Self {
        Self::new(Decimal::ZERO, Decimal::from(50), Decimal::from(20))
    }

    /// 成品首次入庫的預設值
    pub fn default_product() -> Self {
        Self::new(Decimal::ZERO, Decimal::from(15), Decimal::from(5))
    }

    /// 檢查是否已達再訂購點
    pub fn is_at_or_below_reorder_point(&self) -> bool {
        self.qty_on_hand <= self.reorder_point
    }
}

/// 庫存帳
///
/// 以物料 ID 排序儲存，迭代順序固定。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLedger {
    entries: BTreeMap<String, InventoryEntry>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入一筆庫存
    pub fn with_entry(mut self, item_id: impl Into<String>, entry: InventoryEntry) -> Self {
        self.entries.insert(item_id.into(), entry);
        self
    }

    pub fn insert(&mut self, item_id: impl Into<String>, entry: InventoryEntry) {
        self.entries.insert(item_id.into(), entry);
    }

    pub fn get(&self, item_id: &str) -> Option<&InventoryEntry> {
        self.entries.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    /// 現有庫存（不存在時為 0）
    pub fn on_hand(&self, item_id: &str) -> Decimal {
        self.entries
            .get(item_id)
            .map(|e| e.qty_on_hand)
            .unwrap_or(Decimal::ZERO)
    }

    /// 確保項目存在，不存在時以 `default` 建立
    pub fn ensure(&mut self, item_id: &str, default: impl FnOnce() -> InventoryEntry) {
        if !self.entries.contains_key(item_id) {
            self.entries.insert(item_id.to_string(), default());
        }
    }

    /// 入庫，回傳新的現有庫存
    ///
    /// 項目不存在時以 `default` 建立後再入庫。
    pub fn receive(
        &mut self,
        item_id: &str,
        qty: Decimal,
        default: impl FnOnce() -> InventoryEntry,
    ) -> Decimal {
        let entry = self
            .entries
            .entry(item_id.to_string())
            .or_insert_with(default);
        entry.qty_on_hand = (entry.qty_on_hand + qty).max(Decimal::ZERO);
        entry.qty_on_hand
    }

    /// 出庫（於零處截斷），回傳實際扣除的數量
    pub fn consume(&mut self, item_id: &str, qty: Decimal) -> Decimal {
        match self.entries.get_mut(item_id) {
            Some(entry) => {
                let taken = qty.min(entry.qty_on_hand).max(Decimal::ZERO);
                entry.qty_on_hand -= taken;
                taken
            }
            None => Decimal::ZERO,
        }
    }

    /// 依 ID 排序迭代
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InventoryEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
