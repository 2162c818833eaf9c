//! 설정 관리.
//!
//! 설정은 선택적 TOML 파일과 `TRADER__` 접두사 환경 변수에서 로드됩니다.
//! 예: `TRADER__TRADING__SYMBOL=eth_usdt`, `TRADER__EXECUTION__TAKER_FEE_RATE=0.001`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{TraderError, TraderResult};
use crate::types::Symbol;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 거래소 설정
    pub exchange: ExchangeConfig,
    /// 거래 대상 및 폴링 설정
    pub trading: TradingConfig,
    /// 실행 엔진 파라미터
    pub execution: ExecutionConfig,
    /// 시그널 전략 설정
    pub strategy: StrategyConfig,
    /// 알림 설정
    pub notifications: NotificationConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 거래소 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// 거래소 이름 (`huobi` 또는 `simulated`)
    pub name: String,
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: String,
    /// REST API 기본 URL
    pub rest_base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: "huobi".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            rest_base_url: "https://api.huobi.pro".to_string(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("name", &self.name)
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &"[REDACTED]")
            .field("rest_base_url", &self.rest_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 앞 4자리만 남기고 가립니다.
fn mask(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}****")
}

/// 거래 대상 및 폴링 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TradingConfig {
    /// 거래쌍 (예: `btc_usdt`)
    pub symbol: String,
    /// 시그널 전략 이름
    pub strategy: String,
    /// 폴링 간격 (초)
    pub poll_interval_secs: u64,
    /// 상태 보고 간격 (초, 0이면 비활성화)
    pub health_report_interval_secs: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            strategy: "ripdog".to_string(),
            poll_interval_secs: 1,
            health_report_interval_secs: 3600,
        }
    }
}

/// 실행 엔진 파라미터.
///
/// 운영자의 리스크 성향에 따른 경험적 상수입니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// 먼지 잔고 기준 (호가 통화 단위)
    pub dust_threshold: Decimal,
    /// 테이커 수수료율
    pub taker_fee_rate: Decimal,
    /// 주문 후 체결 조회까지 대기 시간 (밀리초)
    pub settle_wait_ms: u64,
    /// 대출 수량 소수점 자릿수 (절사)
    pub borrow_precision: u32,
    /// 상환 수량 소수점 자릿수 (절사)
    pub repay_precision: u32,
    /// 현물 시그널에서도 상환을 수행할지 여부
    pub repay_on_spot: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dust_threshold: dec!(10),
            taker_fee_rate: dec!(0.002),
            settle_wait_ms: 3000,
            borrow_precision: 3,
            repay_precision: 8,
            repay_on_spot: false,
        }
    }
}

/// 시그널 전략 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// 변동률을 관찰할 기준 심볼 목록
    pub reference_symbols: Vec<String>,
    /// Rise/Fall 임계값 (%)
    pub rise_threshold_pct: Decimal,
    /// Bull/Bear 임계값 (%, 미설정 시 레버리지 시그널 없음)
    pub bull_threshold_pct: Option<Decimal>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            reference_symbols: vec!["doge_usdt".to_string(), "xrp_usdt".to_string()],
            rise_threshold_pct: dec!(5),
            bull_threshold_pct: None,
        }
    }
}

/// 알림 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// DingTalk 로봇 설정
    pub dingtalk: DingTalkConfig,
    /// 텔레그램 설정
    pub telegram: TelegramConfig,
}

/// DingTalk 로봇 알림 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DingTalkConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 로봇 액세스 토큰
    pub access_token: String,
    /// API 기본 URL
    pub base_url: String,
    /// 전체 멘션 여부
    pub at_all: bool,
}

impl Default for DingTalkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            access_token: String::new(),
            base_url: "https://oapi.dingtalk.com".to_string(),
            at_all: false,
        }
    }
}

impl fmt::Debug for DingTalkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DingTalkConfig")
            .field("enabled", &self.enabled)
            .field("access_token", &mask(&self.access_token))
            .field("base_url", &self.base_url)
            .field("at_all", &self.at_all)
            .finish()
    }
}

/// 텔레그램 알림 설정.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 봇 토큰
    pub bot_token: String,
    /// 채팅 ID
    pub chat_id: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("enabled", &self.enabled)
            .field("bot_token", &mask(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 지정되면 반드시 존재해야 합니다.
    pub fn load(path: Option<&Path>) -> TraderResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("TRADER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("strategy.reference_symbols")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 설정 값을 검증합니다.
    ///
    /// # Errors
    /// 심볼이 비어 있거나 형식이 잘못된 경우, 수수료율이나 먼지 기준이 음수인 경우,
    /// 활성화된 알림 채널에 자격증명이 없는 경우 에러를 반환합니다.
    pub fn validate(&self) -> TraderResult<()> {
        if self.trading.symbol.trim().is_empty() {
            return Err(TraderError::InvalidInput(
                "trading.symbol is required".to_string(),
            ));
        }
        Symbol::parse(&self.trading.symbol)?;

        for reference in &self.strategy.reference_symbols {
            Symbol::parse(reference)?;
        }

        if self.execution.taker_fee_rate.is_sign_negative() {
            return Err(TraderError::Config(format!(
                "execution.taker_fee_rate must not be negative: {}",
                self.execution.taker_fee_rate
            )));
        }
        if self.execution.dust_threshold.is_sign_negative() {
            return Err(TraderError::Config(format!(
                "execution.dust_threshold must not be negative: {}",
                self.execution.dust_threshold
            )));
        }

        let dingtalk = &self.notifications.dingtalk;
        if dingtalk.enabled && dingtalk.access_token.is_empty() {
            return Err(TraderError::Config(
                "notifications.dingtalk.access_token is required when enabled".to_string(),
            ));
        }
        let telegram = &self.notifications.telegram;
        if telegram.enabled && (telegram.bot_token.is_empty() || telegram.chat_id.is_empty()) {
            return Err(TraderError::Config(
                "notifications.telegram.bot_token and chat_id are required when enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// 실제 거래소 대신 모의 거래소를 사용하는지 확인합니다.
    pub fn is_paper(&self) -> bool {
        self.exchange.name.eq_ignore_ascii_case("simulated")
    }
}
