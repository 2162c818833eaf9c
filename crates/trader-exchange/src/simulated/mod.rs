//! 모의투자 및 테스트를 위한 시뮬레이션 마진 거래소.
//!
//! - 통화별 잔고 구분(거래 가능, 대출 가능, 대출, 이자) 추적
//! - 고정 시세 또는 실제 거래소 시세로 시장가 주문 즉시 체결
//! - 대출/상환과 대출 주문 상태 관리
//! - 모든 호출 기록 및 실패 주입
//!
//! # 예제
//!
//! ```ignore
//! use trader_exchange::simulated::{SimulatedConfig, SimulatedMarginExchange, SimOp};
//!
//! let exchange = SimulatedMarginExchange::new(
//!     SimulatedConfig::default()
//!         .with_balance("btc", dec!(0.02))
//!         .with_ticker(ticker)
//!         .with_failure(SimOp::Borrow),
//! );
//! ```

mod exchange;

pub use exchange::{SimBalance, SimCall, SimOp, SimulatedConfig, SimulatedMarginExchange};
