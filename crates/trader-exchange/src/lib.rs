//! 마진 거래소 연결.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `MarginExchange` trait: 실행 엔진이 사용하는 거래소 인터페이스
//! - Huobi 마진 커넥터 (REST, HMAC 서명, 응답 스키마 검증)
//! - 시뮬레이션 마진 거래소 (모의투자 및 테스트용)

pub mod connector;
pub mod error;
pub mod simulated;
pub mod traits;

pub use connector::{HuobiClient, HuobiConfig};
pub use error::*;
pub use simulated::{SimBalance, SimCall, SimOp, SimulatedConfig, SimulatedMarginExchange};
pub use traits::*;
