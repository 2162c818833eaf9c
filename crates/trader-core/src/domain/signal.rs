//! 전략이 생성하는 이산 트레이딩 시그널.
//!
//! - `Signal` - 시그널 값 (None/Rise/Fall/Bull/Bear)
//! - `TradeCommand` - 시그널에서 도출한 주문 방향과 증거금 사용 여부

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Side;

/// 시장 상태 분류 시그널.
///
/// 한 번의 폴링 주기 동안 불변입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// 아무 것도 하지 않음
    #[default]
    None,
    /// 시장가 진입
    Rise,
    /// 시장가 청산
    Fall,
    /// 최대 레버리지로 진입
    Bull,
    /// 최대 레버리지로 청산 (공매도)
    Bear,
}

impl Signal {
    /// 모든 시그널 값.
    pub const ALL: [Signal; 5] = [
        Signal::None,
        Signal::Rise,
        Signal::Fall,
        Signal::Bull,
        Signal::Bear,
    ];

    /// 증거금(차입)이 필요한 시그널인지 확인합니다.
    pub fn is_margin(&self) -> bool {
        matches!(self, Signal::Bull | Signal::Bear)
    }

    /// 시그널을 주문 명령으로 변환합니다.
    ///
    /// `Signal::None`은 명령이 없습니다.
    pub fn command(&self) -> Option<TradeCommand> {
        let side = match self {
            Signal::None => return None,
            Signal::Rise | Signal::Bull => Side::Buy,
            Signal::Fall | Signal::Bear => Side::Sell,
        };

        Some(TradeCommand {
            side,
            margin: self.is_margin(),
        })
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::None => write!(f, "none"),
            Signal::Rise => write!(f, "rise"),
            Signal::Fall => write!(f, "fall"),
            Signal::Bull => write!(f, "bull"),
            Signal::Bear => write!(f, "bear"),
        }
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Signal::None),
            "rise" => Ok(Signal::Rise),
            "fall" => Ok(Signal::Fall),
            "bull" => Ok(Signal::Bull),
            "bear" => Ok(Signal::Bear),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

/// 시그널에서 도출한 주문 명령.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeCommand {
    /// 주문 방향
    pub side: Side,
    /// 증거금 차입 여부
    pub margin: bool,
}
