//! 전략 레지스트리.
//!
//! 이름으로 내장 전략을 조회하고 생성합니다.

use std::sync::Arc;
use trader_core::StrategyConfig;

use crate::error::{StrategyError, StrategyResult};
use crate::strategies::{PercentChangeConfig, PercentChangeStrategy};
use crate::traits::SignalSource;

/// 전략 생성 함수.
type Factory = fn(&StrategyConfig) -> StrategyResult<Arc<dyn SignalSource>>;

/// 등록된 전략 (이름, 설명, 팩토리).
const STRATEGIES: &[(&str, &str, Factory)] = &[(
    PercentChangeStrategy::NAME,
    "기준 심볼 변동률이 모두 임계값을 넘으면 진입/청산",
    percent_change,
)];

fn percent_change(config: &StrategyConfig) -> StrategyResult<Arc<dyn SignalSource>> {
    let config = PercentChangeConfig::from_settings(config)?;
    Ok(Arc::new(PercentChangeStrategy::new(config)))
}

/// 사용 가능한 전략 이름 목록.
pub fn available() -> Vec<&'static str> {
    STRATEGIES.iter().map(|(name, _, _)| *name).collect()
}

/// 전략 이름과 설명 목록.
pub fn describe() -> Vec<(&'static str, &'static str)> {
    STRATEGIES
        .iter()
        .map(|(name, description, _)| (*name, *description))
        .collect()
}

/// 이름으로 전략을 생성합니다.
///
/// # Errors
/// 등록되지 않은 이름이면 `StrategyError::UnknownStrategy`,
/// 설정이 잘못되었으면 `StrategyError::InvalidConfig`를 반환합니다.
pub fn create(name: &str, config: &StrategyConfig) -> StrategyResult<Arc<dyn SignalSource>> {
    let query = name.trim().to_lowercase();
    STRATEGIES
        .iter()
        .find(|(registered, _, _)| *registered == query)
        .map(|(_, _, factory)| factory(config))
        .unwrap_or_else(|| {
            Err(StrategyError::UnknownStrategy(
                name.to_string(),
                available().join(", "),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available() {
        assert_eq!(available(), vec!["ripdog"]);
    }

    #[test]
    fn test_create_known_strategy() {
        let strategy = create("RipDog", &StrategyConfig::default()).unwrap();
        assert_eq!(strategy.name(), "ripdog");
    }

    #[test]
    fn test_create_unknown_strategy() {
        let err = create("moon", &StrategyConfig::default()).err().unwrap();
        assert!(matches!(err, StrategyError::UnknownStrategy(ref name, _) if name == "moon"));
        assert!(err.to_string().contains("ripdog"));
    }
}
