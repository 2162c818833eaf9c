//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 거래소 업무 에러 (원본 `err-code`/`err-msg` 보존)
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 유효하지 않은 심볼
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// 유효하지 않은 수량
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// 잔고 부족
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// 주문을 찾을 수 없거나 상태 충돌
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// 거래소가 지원하지 않는 심볼
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// 주문 거부됨
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// 여러 건의 개별 요청 실패를 모은 에러 (예: 주문별 취소)
    #[error("{} request(s) failed: {}", .0.len(), join_failures(.0))]
    Aggregate(Vec<(String, ExchangeError)>),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

fn join_failures(failures: &[(String, ExchangeError)]) -> String {
    failures
        .iter()
        .map(|(id, err)| format!("{err} (ID: {id})"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExchangeError {
    /// Huobi `err-code`/`err-msg`를 에러로 매핑합니다.
    ///
    /// 알려진 코드는 타입이 있는 변형으로, 나머지는 `Api`로 보존합니다.
    /// 매핑된 변형도 메시지에 원본 코드를 포함합니다.
    pub fn from_venue(code: &str, message: &str) -> Self {
        let detail = format!("{message} [{code}]");
        match code {
            "account-frozen-balance-insufficient-error"
            | "order-accountbalance-error"
            | "account-balance-insufficient-error"
            | "loan-insufficient-balance" => ExchangeError::InsufficientBalance(detail),
            "base-symbol-error" | "invalid-symbol" | "base-symbol-trade-disabled" => {
                ExchangeError::SymbolNotFound(detail)
            }
            "base-record-invalid" | "order-orderstate-error" | "loan-order-not-exist" => {
                ExchangeError::OrderNotFound(detail)
            }
            "order-value-min-error"
            | "order-orderamount-precision-error"
            | "order-limitorder-amount-min-error"
            | "order-marketorder-amount-min-error"
            | "loan-amount-scale-error" => ExchangeError::InvalidQuantity(detail),
            "api-signature-not-valid"
            | "api-signature-check-failed"
            | "login-required"
            | "invalid-access-key" => ExchangeError::Unauthorized(detail),
            "api-request-limit-exceeded" | "too-many-request" => ExchangeError::RateLimited,
            _ => ExchangeError::Api {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// 원본 거래소 에러 코드 (`Api` 변형만).
    pub fn venue_code(&self) -> Option<&str> {
        match self {
            ExchangeError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// 전송 계층에서 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_) | ExchangeError::Timeout(_)
        )
    }

    /// 재시도해도 결과가 바뀌지 않는 치명적 에러인지 확인.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExchangeError::Unauthorized(_)
                | ExchangeError::InsufficientBalance(_)
                | ExchangeError::InvalidQuantity(_)
                | ExchangeError::InvalidSymbol(_)
                | ExchangeError::SymbolNotFound(_)
                | ExchangeError::OrderRejected(_)
        )
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ExchangeError::NetworkError(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<trader_core::TraderError> for ExchangeError {
    fn from(err: trader_core::TraderError) -> Self {
        ExchangeError::InvalidSymbol(err.to_string())
    }
}
