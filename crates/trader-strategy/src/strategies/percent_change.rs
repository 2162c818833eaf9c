//! 변동률 임계값 전략 (`ripdog`).
//!
//! 기준 심볼(기본값 DOGE, XRP)의 24시간 변동률이 모두 같은 방향으로
//! 임계값을 넘으면 시그널을 냅니다.
//!
//! | 조건                                   | 시그널 |
//! |----------------------------------------|--------|
//! | 모든 변동률 > +bull_threshold_pct       | Bull   |
//! | 모든 변동률 > +rise_threshold_pct       | Rise   |
//! | 모든 변동률 < -bull_threshold_pct       | Bear   |
//! | 모든 변동률 < -rise_threshold_pct       | Fall   |
//! | 그 외                                  | None   |

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;
use trader_core::{Signal, StrategyConfig, Symbol};
use trader_exchange::MarginExchange;

use crate::error::{StrategyError, StrategyResult};
use crate::traits::SignalSource;

/// 변동률 전략 설정.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentChangeConfig {
    /// 관찰할 기준 심볼
    pub references: Vec<Symbol>,
    /// Rise/Fall 임계값 (%)
    pub rise_threshold_pct: Decimal,
    /// Bull/Bear 임계값 (%)
    pub bull_threshold_pct: Option<Decimal>,
}

impl PercentChangeConfig {
    /// 애플리케이션 설정의 `strategy` 섹션에서 생성합니다.
    pub fn from_settings(settings: &StrategyConfig) -> StrategyResult<Self> {
        let references = settings
            .reference_symbols
            .iter()
            .map(|s| Symbol::parse(s).map_err(|e| StrategyError::InvalidConfig(e.to_string())))
            .collect::<StrategyResult<Vec<_>>>()?;

        let config = Self {
            references,
            rise_threshold_pct: settings.rise_threshold_pct,
            bull_threshold_pct: settings.bull_threshold_pct,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> StrategyResult<()> {
        if self.references.is_empty() {
            return Err(StrategyError::InvalidConfig(
                "기준 심볼이 최소 하나 필요합니다".to_string(),
            ));
        }
        if self.rise_threshold_pct.is_sign_negative() {
            return Err(StrategyError::InvalidConfig(
                "rise_threshold_pct는 0 이상이어야 합니다".to_string(),
            ));
        }
        if let Some(bull) = self.bull_threshold_pct {
            if bull < self.rise_threshold_pct {
                return Err(StrategyError::InvalidConfig(
                    "bull_threshold_pct는 rise_threshold_pct 이상이어야 합니다".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// 관찰된 변동률 목록으로 시그널을 결정합니다.
    pub fn classify(&self, changes: &[Decimal]) -> Signal {
        if changes.is_empty() {
            return Signal::None;
        }

        let all_above = |threshold: Decimal| changes.iter().all(|c| *c > threshold);
        let all_below = |threshold: Decimal| changes.iter().all(|c| *c < -threshold);

        if let Some(bull) = self.bull_threshold_pct {
            if all_above(bull) {
                return Signal::Bull;
            }
            if all_below(bull) {
                return Signal::Bear;
            }
        }

        if all_above(self.rise_threshold_pct) {
            Signal::Rise
        } else if all_below(self.rise_threshold_pct) {
            Signal::Fall
        } else {
            Signal::None
        }
    }
}

/// 기준 심볼 변동률 전략.
#[derive(Debug, Clone)]
pub struct PercentChangeStrategy {
    config: PercentChangeConfig,
}

impl PercentChangeStrategy {
    /// 등록 이름.
    pub const NAME: &'static str = "ripdog";

    /// 새 전략을 생성합니다.
    pub fn new(config: PercentChangeConfig) -> Self {
        Self { config }
    }

    /// 전략 설정을 반환합니다.
    pub fn config(&self) -> &PercentChangeConfig {
        &self.config
    }
}

#[async_trait]
impl SignalSource for PercentChangeStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn signal(&self, exchange: &dyn MarginExchange) -> StrategyResult<Signal> {
        let mut changes = Vec::with_capacity(self.config.references.len());

        for symbol in &self.config.references {
            let ticker = exchange
                .get_ticker(symbol)
                .await
                .map_err(|source| StrategyError::MarketData {
                    symbol: symbol.to_string(),
                    source,
                })?;
            debug!(symbol = %symbol, change = %ticker.change_24h_percent, "기준 심볼 변동률");
            changes.push(ticker.change_24h_percent);
        }

        Ok(self.config.classify(&changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use trader_core::Ticker;
    use trader_exchange::{SimOp, SimulatedConfig, SimulatedMarginExchange};

    fn config(bull: Option<Decimal>) -> PercentChangeConfig {
        PercentChangeConfig {
            references: vec![Symbol::new("doge", "usdt"), Symbol::new("xrp", "usdt")],
            rise_threshold_pct: dec!(5),
            bull_threshold_pct: bull,
        }
    }

    /// 시가 100 기준으로 `last`를 맞춰 변동률을 만듭니다.
    fn ticker(base: &str, change_pct: Decimal) -> Ticker {
        let last = dec!(100) + change_pct;
        Ticker::new(
            Symbol::new(base, "usdt"),
            last,
            last,
            last,
            dec!(100),
            Utc::now(),
        )
    }

    #[test]
    fn test_classify_rise_and_fall() {
        let cfg = config(None);
        assert_eq!(cfg.classify(&[dec!(6), dec!(5.1)]), Signal::Rise);
        assert_eq!(cfg.classify(&[dec!(-6), dec!(-7)]), Signal::Fall);
        assert_eq!(cfg.classify(&[dec!(6), dec!(4)]), Signal::None);
        assert_eq!(cfg.classify(&[dec!(5), dec!(5)]), Signal::None);
        assert_eq!(cfg.classify(&[dec!(6), dec!(-6)]), Signal::None);
    }

    #[test]
    fn test_classify_bull_and_bear() {
        let cfg = config(Some(dec!(10)));
        assert_eq!(cfg.classify(&[dec!(12), dec!(11)]), Signal::Bull);
        assert_eq!(cfg.classify(&[dec!(12), dec!(6)]), Signal::Rise);
        assert_eq!(cfg.classify(&[dec!(-12), dec!(-11)]), Signal::Bear);
    }

    #[test]
    fn test_from_settings_rejects_bad_config() {
        let mut settings = StrategyConfig::default();
        settings.reference_symbols = vec!["dogeusdt".to_string()];
        assert!(PercentChangeConfig::from_settings(&settings).is_err());

        let mut settings = StrategyConfig::default();
        settings.reference_symbols.clear();
        assert!(PercentChangeConfig::from_settings(&settings).is_err());

        let mut settings = StrategyConfig::default();
        settings.bull_threshold_pct = Some(dec!(1));
        assert!(PercentChangeConfig::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_signal_reads_every_reference_ticker() {
        let exchange = SimulatedMarginExchange::new(
            SimulatedConfig::default()
                .with_ticker(ticker("doge", dec!(8)))
                .with_ticker(ticker("xrp", dec!(6))),
        );
        let strategy = PercentChangeStrategy::new(config(None));

        let signal = strategy.signal(&exchange).await.unwrap();

        assert_eq!(signal, Signal::Rise);
        assert_eq!(exchange.calls_of(SimOp::GetTicker).await.len(), 2);
    }

    #[tokio::test]
    async fn test_signal_surfaces_ticker_failure() {
        let exchange = SimulatedMarginExchange::new(
            SimulatedConfig::default()
                .with_ticker(ticker("doge", dec!(8)))
                .with_ticker(ticker("xrp", dec!(6)))
                .with_failure(SimOp::GetTicker),
        );
        let strategy = PercentChangeStrategy::new(config(None));

        let err = strategy.signal(&exchange).await.unwrap_err();
        assert!(matches!(err, StrategyError::MarketData { ref symbol, .. } if symbol == "doge_usdt"));
    }
}
