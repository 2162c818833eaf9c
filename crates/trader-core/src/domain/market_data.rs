//! 시장 데이터 타입.
//!
//! - `Ticker` - 24시간 통합 시세 (최우선 호가, 최근 체결가, 변동률)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Symbol;

/// 24시간 통합 시세 데이터.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 최우선 매수 호가
    pub bid: Decimal,
    /// 최우선 매도 호가
    pub ask: Decimal,
    /// 최근 체결가
    pub last: Decimal,
    /// 24시간 시가
    pub open_24h: Decimal,
    /// 24시간 변동률(%)
    pub change_24h_percent: Decimal,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// 시가와 최근 체결가로부터 변동률을 계산해 시세를 생성합니다.
    ///
    /// 시가가 0이면 변동률은 0입니다.
    pub fn new(
        symbol: Symbol,
        bid: Decimal,
        ask: Decimal,
        last: Decimal,
        open_24h: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let change_24h_percent = if open_24h.is_zero() {
            Decimal::ZERO
        } else {
            (last - open_24h) / open_24h * Decimal::ONE_HUNDRED
        };

        Self {
            symbol,
            bid,
            ask,
            last,
            open_24h,
            change_24h_percent,
            timestamp,
        }
    }

    /// 매수/매도 스프레드를 반환합니다.
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// 중간 가격을 반환합니다.
    pub fn mid_price(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_percent_change() {
        let ticker = Ticker::new(
            Symbol::new("doge", "usdt"),
            dec!(0.105),
            dec!(0.106),
            dec!(0.11),
            dec!(0.10),
            Utc::now(),
        );
        assert_eq!(ticker.change_24h_percent, dec!(10));
        assert_eq!(ticker.spread(), dec!(0.001));
        assert_eq!(ticker.mid_price(), dec!(0.1055));
    }

    #[test]
    fn test_ticker_zero_open() {
        let ticker = Ticker::new(
            Symbol::new("btc", "usdt"),
            dec!(1),
            dec!(1),
            dec!(1),
            Decimal::ZERO,
            Utc::now(),
        );
        assert_eq!(ticker.change_24h_percent, Decimal::ZERO);
    }
}
