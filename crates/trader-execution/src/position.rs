//! 포지션 상태 분류.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::carry::Carry;

/// 세 가지 값의 포지션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    /// 대상 통화 노출이 없거나 무시할 수준
    Empty,
    /// 호가 통화가 소진됨 (이미 진입)
    Full,
    /// 어느 기준도 충족하지 않음
    Indeterminate,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Empty => "empty",
            PositionStatus::Full => "full",
            PositionStatus::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 거래 가능 잔고로 포지션 상태를 판정합니다.
///
/// 1. 호가 통화 거래 가능 잔고 < `dust_threshold` → `Full`
/// 2. 대상 통화 거래 가능 잔고 × `price` < `dust_threshold` → `Empty`
/// 3. 그 외 → `Indeterminate`
///
/// 잔고는 매 거래 후 바뀌므로 결과를 캐시하지 않습니다.
pub fn classify(
    quote: &Carry,
    target: &Carry,
    price: Decimal,
    dust_threshold: Decimal,
) -> PositionStatus {
    if quote.trade < dust_threshold {
        PositionStatus::Full
    } else if target.trade * price < dust_threshold {
        PositionStatus::Empty
    } else {
        PositionStatus::Indeterminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn carry(currency: &str, trade: Decimal) -> Carry {
        Carry {
            trade,
            ..Carry::zero(currency)
        }
    }

    #[test]
    fn test_quote_exhausted_is_full() {
        let status = classify(&carry("usdt", dec!(5)), &carry("btc", dec!(3)), dec!(30000), dec!(10));
        assert_eq!(status, PositionStatus::Full);

        let status = classify(&carry("usdt", dec!(5)), &carry("btc", dec!(0)), dec!(30000), dec!(10));
        assert_eq!(status, PositionStatus::Full);
    }

    #[test]
    fn test_negligible_target_is_empty() {
        // 0.0001 BTC × 20000 = 2 USDT
        let status = classify(
            &carry("usdt", dec!(1000)),
            &carry("btc", dec!(0.0001)),
            dec!(20000),
            dec!(10),
        );
        assert_eq!(status, PositionStatus::Empty);
    }

    #[test]
    fn test_both_sides_held_is_indeterminate() {
        // 0.0025 BTC × 20000 = 50 USDT
        let status = classify(
            &carry("usdt", dec!(1000)),
            &carry("btc", dec!(0.0025)),
            dec!(20000),
            dec!(10),
        );
        assert_eq!(status, PositionStatus::Indeterminate);
    }
}
