//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 거래소로 보내는 주문/차입/상환 수량은 항상 0 방향으로 절사합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 양수인지 확인합니다.
    fn is_positive(&self) -> bool;

    /// 지정된 소수점 자릿수로 절사합니다 (0 방향).
    fn floor_dp(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn is_positive(&self) -> bool {
        *self > Decimal::ZERO
    }

    fn floor_dp(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
    }
}
