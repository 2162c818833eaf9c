//! 포지션 실행 엔진.
//!
//! 이 crate는 다음을 제공합니다:
//! - 잔고 구분 계산 (`Carry`)
//! - 포지션 상태 분류 (Empty / Full / Indeterminate)
//! - 수수료와 주문 한도를 반영한 수량 계획
//! - 대출 가능 금액을 빌리는 레버리지 컨트롤러
//! - 취소 → 대출 → 주문 → 상환 순서를 실행하는 오케스트레이터
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_execution::Orchestrator;
//!
//! let orchestrator = Orchestrator::new(exchange, notifier, config.execution.clone());
//! let spec = exchange.get_symbol_spec(&symbol).await?;
//!
//! let report = orchestrator.execute(Signal::Bull, &spec).await?;
//! ```

pub mod carry;
pub mod error;
pub mod executor;
pub mod leverage;
pub mod planner;
pub mod position;

// 주요 타입 재내보내기
pub use carry::{Carry, CarryError};
pub use error::{ExecutionError, ExecutionResult, ExecutionStep, RepayFailure};
pub use executor::{
    AccountSnapshot, ExecutionReport, Orchestrator, RepayRecord, SkipReason, TradeRecord,
};
pub use leverage::{BorrowRecord, LeverageController, LeverageOutcome};
pub use planner::{ExposurePlanner, PlanOutcome};
pub use position::{classify, PositionStatus};
