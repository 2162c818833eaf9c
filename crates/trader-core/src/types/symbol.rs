//! 거래쌍 심볼 및 거래소 메타데이터 정의.
//!
//! 이 모듈은 거래쌍 관련 타입을 정의합니다:
//! - `Symbol` - 기준 통화와 호가 통화로 분해된 거래쌍 (예: `btc_usdt`)
//! - `SymbolLimits` - 방향별 최소/최대 주문 크기
//! - `SymbolSpec` - 정밀도와 주문 한도를 포함한 거래소 메타데이터

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Side;
use crate::error::TraderError;

/// 기준 통화와 호가 통화로 구성된 거래쌍.
///
/// 통화 코드는 거래소 형식(소문자)으로 저장됩니다.
/// 예: `btc_usdt` → base `btc`, quote `usdt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 통화 (예: btc)
    pub base: String,
    /// 호가 통화 (예: usdt)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_lowercase(),
            quote: quote.into().to_lowercase(),
        }
    }

    /// `base_quote` 형식 문자열에서 심볼을 파싱합니다.
    ///
    /// # Errors
    /// 구분자 `_`로 나눈 결과가 비어 있지 않은 두 부분이 아니면
    /// `TraderError::InvalidSymbol`을 반환합니다.
    pub fn parse(s: &str) -> Result<Self, TraderError> {
        let parts: Vec<&str> = s.trim().split('_').collect();
        match parts.as_slice() {
            [base, quote] if !base.is_empty() && !quote.is_empty() => Ok(Self::new(*base, *quote)),
            _ => Err(TraderError::InvalidSymbol(format!(
                "{s:?} (a valid symbol looks like btc_usdt)"
            ))),
        }
    }

    /// 기준/호가 통화가 모두 비어 있지 않은지 확인합니다.
    pub fn validate(&self) -> Result<(), TraderError> {
        if self.base.trim().is_empty() || self.quote.trim().is_empty() {
            return Err(TraderError::InvalidSymbol(format!(
                "{:?} (base and quote must not be empty)",
                self.to_string()
            )));
        }
        Ok(())
    }

    /// 거래소 API에서 사용하는 구분자 없는 형식 (예: `btcusdt`).
    pub fn venue_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// 표준 표시 형식 (예: `BTC/USDT`).
    pub fn to_standard_string(&self) -> String {
        format!(
            "{}/{}",
            self.base.to_uppercase(),
            self.quote.to_uppercase()
        )
    }

    /// 해당 방향의 주문에서 내어주는 통화.
    ///
    /// 매수는 호가 통화를, 매도는 기준 통화를 소비합니다.
    pub fn spend_currency(&self, side: Side) -> &str {
        match side {
            Side::Buy => &self.quote,
            Side::Sell => &self.base,
        }
    }

    /// 해당 방향의 주문에서 받는 통화.
    pub fn receive_currency(&self, side: Side) -> &str {
        match side {
            Side::Buy => &self.base,
            Side::Sell => &self.quote,
        }
    }
}

impl FromStr for Symbol {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

/// 방향별 시장가 주문 크기 한도.
///
/// 매수 한도는 호가 통화 금액, 매도 한도는 기준 통화 수량입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLimits {
    /// 매수 최소 금액
    pub buy_min: Decimal,
    /// 매수 최대 금액
    pub buy_max: Decimal,
    /// 매도 최소 수량
    pub sell_min: Decimal,
    /// 매도 최대 수량
    pub sell_max: Decimal,
}

impl SymbolLimits {
    /// 방향에 해당하는 (최소, 최대) 한도를 반환합니다.
    pub fn for_side(&self, side: Side) -> (Decimal, Decimal) {
        match side {
            Side::Buy => (self.buy_min, self.buy_max),
            Side::Sell => (self.sell_min, self.sell_max),
        }
    }
}

/// 거래소가 제공하는 거래쌍 메타데이터.
///
/// 실행 중 한 번 로드되어 읽기 전용 설정으로 취급됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// 거래쌍
    pub symbol: Symbol,
    /// 가격 소수점 자릿수
    pub price_precision: u32,
    /// 수량(기준 통화) 소수점 자릿수
    pub amount_precision: u32,
    /// 금액(호가 통화) 소수점 자릿수
    pub value_precision: u32,
    /// 주문 크기 한도
    pub limits: SymbolLimits,
}

impl SymbolSpec {
    /// 해당 방향 주문 수량의 소수점 자릿수.
    ///
    /// 시장가 매수는 호가 통화 금액으로, 시장가 매도는 기준 통화 수량으로 주문합니다.
    pub fn order_precision(&self, side: Side) -> u32 {
        match side {
            Side::Buy => self.value_precision,
            Side::Sell => self.amount_precision,
        }
    }
}
