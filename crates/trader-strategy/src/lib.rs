//! 트레이딩 시그널 소스.
//!
//! 이 크레이트가 제공하는 기능:
//! - 시그널 계산을 위한 `SignalSource` trait
//! - 내장 전략 (`ripdog`: 기준 심볼 변동률 임계값)
//! - 이름 기반 전략 레지스트리
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_strategy::registry;
//!
//! let strategy = registry::create("ripdog", &config.strategy)?;
//! let signal = strategy.signal(exchange.as_ref()).await?;
//! ```

pub mod error;
pub mod registry;
pub mod strategies;
pub mod traits;

// 주요 타입 재내보내기
pub use error::{StrategyError, StrategyResult};
pub use strategies::{PercentChangeConfig, PercentChangeStrategy};
pub use traits::SignalSource;
