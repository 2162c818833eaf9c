//! 전략 에러 타입.

use thiserror::Error;
use trader_exchange::ExchangeError;

/// 시그널 계산 에러.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// 등록되지 않은 전략 이름
    #[error("알 수 없는 전략: {0} (사용 가능: {1})")]
    UnknownStrategy(String, String),

    /// 잘못된 전략 설정
    #[error("잘못된 전략 설정: {0}")]
    InvalidConfig(String),

    /// 시세 조회 실패
    #[error("시세 조회 실패 ({symbol}): {source}")]
    MarketData {
        symbol: String,
        #[source]
        source: ExchangeError,
    },
}

/// 전략 작업용 Result 타입.
pub type StrategyResult<T> = Result<T, StrategyError>;
