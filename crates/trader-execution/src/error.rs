//! 실행 에러 타입.

use std::fmt;
use thiserror::Error;
use trader_core::TraderError;
use trader_exchange::ExchangeError;

/// 실행 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStep {
    Validate,
    CancelOpenOrders,
    AssessPosition,
    Borrow,
    SizeAndTrade,
    Repay,
}

impl ExecutionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStep::Validate => "validate",
            ExecutionStep::CancelOpenOrders => "cancel_open_orders",
            ExecutionStep::AssessPosition => "assess_position",
            ExecutionStep::Borrow => "borrow",
            ExecutionStep::SizeAndTrade => "size_and_trade",
            ExecutionStep::Repay => "repay",
        }
    }
}

impl fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 대출 주문 하나의 상환 실패.
#[derive(Debug)]
pub struct RepayFailure {
    /// 대출 주문 ID
    pub borrow_order_id: String,
    /// 원인
    pub error: ExchangeError,
}

/// 실행 오류 유형.
///
/// 모든 오류는 발생한 단계를 함께 가집니다.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 거래소 호출 전 입력 검증 실패
    #[error("validate failed: {0}")]
    Validation(#[from] TraderError),

    #[error("{step} failed: {source}")]
    Exchange {
        step: ExecutionStep,
        #[source]
        source: ExchangeError,
    },

    #[error("repay failed for {} order(s): {}", failures.len(), describe_failures(failures))]
    Repay { failures: Vec<RepayFailure> },
}

fn describe_failures(failures: &[RepayFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} (ID: {})", f.error, f.borrow_order_id))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ExecutionError {
    /// 단계와 거래소 에러로 생성합니다.
    pub fn at(step: ExecutionStep) -> impl FnOnce(ExchangeError) -> Self {
        move |source| ExecutionError::Exchange { step, source }
    }

    /// 실패한 단계.
    pub fn step(&self) -> ExecutionStep {
        match self {
            ExecutionError::Validation(_) => ExecutionStep::Validate,
            ExecutionError::Exchange { step, .. } => *step,
            ExecutionError::Repay { .. } => ExecutionStep::Repay,
        }
    }

    /// 다음 주기에 다시 시도해도 같은 결과가 나올 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        match self {
            ExecutionError::Validation(_) => true,
            ExecutionError::Exchange { source, .. } => source.is_fatal(),
            ExecutionError::Repay { failures } => failures.iter().all(|f| f.error.is_fatal()),
        }
    }

    /// 거래소 에러 코드 (있는 경우).
    pub fn venue_code(&self) -> Option<&str> {
        match self {
            ExecutionError::Exchange { source, .. } => source.venue_code(),
            ExecutionError::Validation(_) | ExecutionError::Repay { .. } => None,
        }
    }

    /// 상환에 실패한 대출 주문 ID 목록.
    pub fn failed_borrow_orders(&self) -> Vec<&str> {
        match self {
            ExecutionError::Repay { failures } => failures
                .iter()
                .map(|f| f.borrow_order_id.as_str())
                .collect(),
            ExecutionError::Validation(_) | ExecutionError::Exchange { .. } => Vec::new(),
        }
    }
}

/// 실행 작업용 Result 타입.
pub type ExecutionResult<T> = Result<T, ExecutionError>;
