//! # Trader Core
//!
//! 마진 트레이딩 에이전트의 핵심 도메인 모델 및 타입을 제공합니다:
//! - 시그널과 주문 명령
//! - 거래쌍 심볼과 거래소 메타데이터
//! - 마진 계좌 잔고 구분과 대출 주문
//! - 시세 데이터
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
