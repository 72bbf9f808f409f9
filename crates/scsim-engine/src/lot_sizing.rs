//! 補貨批量規則

use rust_decimal::Decimal;

/// 批量規則計算器
pub struct LotSizingCalculator;

impl LotSizingCalculator {
    /// 零件再訂購量
    ///
    /// 淨部位 ≤ 再訂購點時，補到 再訂購點 + 安全庫存 + 緩衝量。
    pub fn part_reorder_qty(
        net_position: Decimal,
        reorder_point: Decimal,
        safety_stock: Decimal,
        buffer: Decimal,
    ) -> Option<Decimal> {
        if net_position > reorder_point {
            return None;
        }
        let qty = reorder_point + safety_stock + buffer - net_position;
        (qty > Decimal::ZERO).then_some(qty)
    }

    /// 成品補貨工單批量
    ///
    /// 淨部位 < 再訂購點時，補到 再訂購點 + 安全庫存，但不超過最大批量。
    pub fn finished_goods_batch(
        net_position: Decimal,
        reorder_point: Decimal,
        safety_stock: Decimal,
        max_batch_size: u32,
    ) -> Option<Decimal> {
        if net_position >= reorder_point {
            return None;
        }
        let shortfall = reorder_point + safety_stock - net_position;
        Self::capped(shortfall, max_batch_size)
    }

    /// 欠交缺口工單批量
    ///
    /// 在製量不足以覆蓋未結欠交時，為差額開一張工單（不超過最大批量）。
    pub fn backorder_gap_batch(
        in_flight: Decimal,
        outstanding_backorders: Decimal,
        max_batch_size: u32,
    ) -> Option<Decimal> {
        if in_flight >= outstanding_backorders {
            return None;
        }
        Self::capped(outstanding_backorders - in_flight, max_batch_size)
    }

    fn capped(qty: Decimal, max_batch_size: u32) -> Option<Decimal> {
        let qty = qty.min(Decimal::from(max_batch_size));
        (qty > Decimal::ZERO).then_some(qty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[rstest]
    #[case(d(30), d(50), d(20), d(50), Some(d(90)))]
    #[case(d(50), d(50), d(20), d(50), Some(d(70)))]
    #[case(d(51), d(50), d(20), d(50), None)]
    #[case(d(-10), d(50), d(20), d(50), Some(d(130)))]
    fn test_part_reorder_qty(
        #[case] net: Decimal,
        #[case] rp: Decimal,
        #[case] ss: Decimal,
        #[case] buffer: Decimal,
        #[case] expected: Option<Decimal>,
    ) {
        assert_eq!(LotSizingCalculator::part_reorder_qty(net, rp, ss, buffer), expected);
    }

    #[rstest]
    #[case(d(0), d(10), d(0), 10, Some(d(10)))]
    #[case(d(0), d(10), d(5), 10, Some(d(10)))]
    #[case(d(6), d(10), d(2), 10, Some(d(6)))]
    #[case(d(10), d(10), d(2), 10, None)]
    fn test_finished_goods_batch(
        #[case] net: Decimal,
        #[case] rp: Decimal,
        #[case] ss: Decimal,
        #[case] max_batch: u32,
        #[case] expected: Option<Decimal>,
    ) {
        assert_eq!(
            LotSizingCalculator::finished_goods_batch(net, rp, ss, max_batch),
            expected
        );
    }

    #[test]
    fn test_backorder_gap_batch() {
        assert_eq!(LotSizingCalculator::backorder_gap_batch(d(0), d(4), 10), Some(d(4)));
        assert_eq!(LotSizingCalculator::backorder_gap_batch(d(3), d(25), 10), Some(d(10)));
        assert_eq!(LotSizingCalculator::backorder_gap_batch(d(5), d(5), 10), None);
    }
}
