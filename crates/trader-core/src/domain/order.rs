//! 주문 타입.
//!
//! 이 모듈은 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderState` - 거래소 주문 상태
//! - `OpenOrder` - 미체결 주문 (취소 여부 판단용)
//! - `MarketOrderRequest` - 시장가 주문 요청
//! - `OrderDetail` - 체결 상세

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::Symbol;

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 거래소 주문 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderState {
    /// 생성됨
    Created,
    /// 접수 전
    PreSubmitted,
    /// 접수 중
    Submitting,
    /// 접수됨 (대기 중)
    Submitted,
    /// 부분 체결
    PartialFilled,
    /// 부분 체결 후 취소
    PartialCanceled,
    /// 전량 체결
    Filled,
    /// 취소됨
    Canceled,
}

impl OrderState {
    /// 미체결 주문 조회에 사용하는 상태 목록.
    pub const OPEN: [OrderState; 3] = [
        OrderState::PreSubmitted,
        OrderState::Submitted,
        OrderState::PartialFilled,
    ];

    /// 아직 체결을 기다리는 상태인지 확인합니다.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderState::Created
                | OrderState::PreSubmitted
                | OrderState::Submitting
                | OrderState::Submitted
                | OrderState::PartialFilled
        )
    }

    /// 거래소 API 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Created => "created",
            OrderState::PreSubmitted => "pre-submitted",
            OrderState::Submitting => "submitting",
            OrderState::Submitted => "submitted",
            OrderState::PartialFilled => "partial-filled",
            OrderState::PartialCanceled => "partial-canceled",
            OrderState::Filled => "filled",
            OrderState::Canceled => "canceled",
        }
    }
}

impl FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderState::Created),
            "pre-submitted" => Ok(OrderState::PreSubmitted),
            "submitting" => Ok(OrderState::Submitting),
            "submitted" => Ok(OrderState::Submitted),
            "partial-filled" => Ok(OrderState::PartialFilled),
            "partial-canceled" => Ok(OrderState::PartialCanceled),
            "filled" => Ok(OrderState::Filled),
            "canceled" => Ok(OrderState::Canceled),
            other => Err(format!("unknown order state: {other}")),
        }
    }
}

/// 미체결 주문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// 거래소 주문 ID
    pub id: String,
    /// 현재 상태
    pub state: OrderState,
}

/// 시장가 주문 요청.
///
/// 매수 수량은 호가 통화 금액, 매도 수량은 기준 통화 수량입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrderRequest {
    /// 거래쌍
    pub symbol: Symbol,
    /// 주문 방향
    pub side: Side,
    /// 주문 수량
    pub amount: Decimal,
}

impl MarketOrderRequest {
    /// 시장가 매수 주문을 생성합니다.
    pub fn market_buy(symbol: Symbol, amount: Decimal) -> Self {
        Self {
            symbol,
            side: Side::Buy,
            amount,
        }
    }

    /// 시장가 매도 주문을 생성합니다.
    pub fn market_sell(symbol: Symbol, amount: Decimal) -> Self {
        Self {
            symbol,
            side: Side::Sell,
            amount,
        }
    }
}

/// 주문 체결 상세.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    /// 거래소 주문 ID
    pub order_id: String,
    /// 현재 상태
    pub state: OrderState,
    /// 체결 수량 (기준 통화)
    pub filled_amount: Decimal,
    /// 체결 금액 (호가 통화)
    pub filled_cash_amount: Decimal,
    /// 체결 수수료
    pub filled_fees: Decimal,
}
