//! 트레이딩 에이전트의 핵심 에러 타입.
//!
//! 설정 및 로컬 검증 단계의 에러를 정의합니다. 거래소 호출 에러는
//! `trader-exchange`의 `ExchangeError`가 담당합니다.

use thiserror::Error;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 심볼
    #[error("잘못된 심볼: {0}")]
    InvalidSymbol(String),

    /// 알 수 없는 시그널
    #[error("알 수 없는 시그널: {0}")]
    InvalidSignal(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

impl TraderError {
    /// 사용자 입력 검증 에러인지 확인합니다.
    ///
    /// 검증 에러는 거래소 호출 전에 반환됩니다.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TraderError::InvalidSymbol(_)
                | TraderError::InvalidSignal(_)
                | TraderError::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for TraderError {
    fn from(err: serde_json::Error) -> Self {
        TraderError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for TraderError {
    fn from(err: config::ConfigError) -> Self {
        TraderError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_validation() {
        let symbol_err = TraderError::InvalidSymbol("btcusdt".to_string());
        assert!(symbol_err.is_validation());

        let config_err = TraderError::Config("missing file".to_string());
        assert!(!config_err.is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = TraderError::InvalidSignal("moon".to_string());
        assert_eq!(err.to_string(), "알 수 없는 시그널: moon");
    }
}
