//! 주문 수량 계획.
//!
//! 내어줄 통화의 거래 가능 잔고 전체를 수수료만큼 줄여 주문 수량을 정하고,
//! 거래소 최소/최대 한도를 적용합니다.

use rust_decimal::Decimal;
use trader_core::{DecimalExt, Side, SymbolLimits};

use crate::carry::Carry;

/// 계획 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// 주문할 수량
    Trade(Decimal),
    /// 최소 한도 미만이라 주문하지 않음 (에러 아님)
    Skip {
        /// 수수료 반영 후 수량
        amount: Decimal,
        /// 방향별 최소 한도
        minimum: Decimal,
    },
}

impl PlanOutcome {
    /// 주문 수량 (Skip이면 None).
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            PlanOutcome::Trade(amount) => Some(*amount),
            PlanOutcome::Skip { .. } => None,
        }
    }
}

/// 수수료와 주문 한도를 반영한 수량 계획기.
#[derive(Debug, Clone, Copy)]
pub struct ExposurePlanner {
    taker_fee_rate: Decimal,
}

impl ExposurePlanner {
    pub fn new(taker_fee_rate: Decimal) -> Self {
        Self { taker_fee_rate }
    }

    /// 주문 수량을 계획합니다.
    ///
    /// `carry`는 내어줄 통화(매수는 호가 통화, 매도는 기준 통화)의 잔고입니다.
    /// 수량은 `trade / (1 + fee)`를 `precision` 자릿수로 절사한 값이며,
    /// 최대 한도가 양수이면 그 값으로 제한합니다.
    pub fn plan(
        &self,
        side: Side,
        carry: &Carry,
        limits: &SymbolLimits,
        precision: u32,
    ) -> PlanOutcome {
        let (minimum, maximum) = limits.for_side(side);

        let mut amount = carry.trade / (Decimal::ONE + self.taker_fee_rate);
        if maximum.is_positive() && amount > maximum {
            amount = maximum;
        }
        let amount = amount.floor_dp(precision);

        if amount < minimum || amount.is_zero() {
            PlanOutcome::Skip { amount, minimum }
        } else {
            PlanOutcome::Trade(amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> SymbolLimits {
        SymbolLimits {
            buy_min: dec!(1),
            buy_max: dec!(50),
            sell_min: dec!(0.0001),
            sell_max: dec!(100),
        }
    }

    fn carry(currency: &str, trade: Decimal) -> Carry {
        Carry {
            trade,
            ..Carry::zero(currency)
        }
    }

    #[test]
    fn test_clamps_to_maximum() {
        let planner = ExposurePlanner::new(dec!(0.002));
        let outcome = planner.plan(Side::Buy, &carry("usdt", dec!(100)), &limits(), 8);
        assert_eq!(outcome, PlanOutcome::Trade(dec!(50)));
    }

    #[test]
    fn test_below_minimum_is_skip() {
        let planner = ExposurePlanner::new(dec!(0.002));
        let outcome = planner.plan(Side::Buy, &carry("usdt", dec!(0.5)), &limits(), 8);
        assert!(matches!(outcome, PlanOutcome::Skip { minimum, .. } if minimum == dec!(1)));
        assert_eq!(outcome.amount(), None);
    }

    #[test]
    fn test_fee_adjusted_and_truncated() {
        let planner = ExposurePlanner::new(dec!(0.002));
        let outcome = planner.plan(Side::Sell, &carry("btc", dec!(0.02)), &limits(), 4);
        // 0.02 / 1.002 = 0.019960...
        assert_eq!(outcome, PlanOutcome::Trade(dec!(0.0199)));
    }

    #[test]
    fn test_zero_balance_is_skip() {
        let planner = ExposurePlanner::new(dec!(0.002));
        let zero_min = SymbolLimits {
            sell_min: Decimal::ZERO,
            ..limits()
        };
        let outcome = planner.plan(Side::Sell, &carry("btc", Decimal::ZERO), &zero_min, 4);
        assert!(matches!(outcome, PlanOutcome::Skip { .. }));
    }
}
