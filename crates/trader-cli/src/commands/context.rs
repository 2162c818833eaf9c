//! 설정 로드와 거래소 구성.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use trader_core::AppConfig;
use trader_exchange::{HuobiClient, HuobiConfig, MarginExchange, SimulatedConfig, SimulatedMarginExchange};

/// 모든 명령에 공통인 옵션.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// 설정 파일 경로
    pub config: Option<PathBuf>,
    /// API 키 (설정 파일보다 우선)
    pub key: Option<String>,
    /// API 시크릿 (설정 파일보다 우선)
    pub secret: Option<String>,
    /// 모의투자 모드
    pub paper: bool,
    /// 모의투자 초기 잔고 (`통화=수량`)
    pub paper_balances: Vec<String>,
}

/// 설정 파일, 환경 변수, 명령행 순서로 설정을 합칩니다.
pub fn load_config(options: &GlobalOptions) -> Result<AppConfig> {
    let mut config = AppConfig::load(options.config.as_deref()).with_context(|| match &options.config {
        Some(path) => format!("설정 로드 실패: {}", path.display()),
        None => "환경 변수 설정 로드 실패".to_string(),
    })?;

    if let Some(key) = &options.key {
        config.exchange.api_key = key.clone();
    }
    if let Some(secret) = &options.secret {
        config.exchange.api_secret = secret.clone();
    }
    if options.paper {
        config.exchange.name = "simulated".to_string();
    }

    Ok(config)
}

/// `통화=수량` 형식의 초기 잔고를 파싱합니다.
pub fn parse_balance(s: &str) -> Result<(String, Decimal)> {
    let Some((currency, amount)) = s.split_once('=') else {
        bail!("잘못된 잔고 형식: {s:?} (예: usdt=1000)");
    };
    let currency = currency.trim().to_lowercase();
    if currency.is_empty() {
        bail!("잘못된 잔고 형식: {s:?} (통화가 비어 있음)");
    }
    let amount: Decimal = amount
        .trim()
        .parse()
        .with_context(|| format!("잘못된 잔고 수량: {s:?}"))?;
    if amount.is_sign_negative() {
        bail!("잔고는 음수일 수 없습니다: {s:?}");
    }
    Ok((currency, amount))
}

/// 설정에 맞는 거래소를 생성합니다.
///
/// 모의투자 모드는 Huobi 공개 시세를 사용하고 주문/대출은 메모리에서 처리합니다.
pub fn build_exchange(config: &AppConfig, options: &GlobalOptions) -> Result<Arc<dyn MarginExchange>> {
    let market_data = HuobiClient::new(HuobiConfig::from_app_config(&config.exchange))
        .context("Huobi 클라이언트 생성 실패")?;

    if config.is_paper() {
        let mut sim = SimulatedConfig::default().with_fee_rate(config.execution.taker_fee_rate);
        for raw in &options.paper_balances {
            let (currency, amount) = parse_balance(raw)?;
            sim = sim.with_balance(&currency, amount);
        }
        info!(balances = ?options.paper_balances, "모의투자 모드");
        let exchange = SimulatedMarginExchange::new(sim).with_market_data(Arc::new(market_data));
        return Ok(Arc::new(exchange));
    }

    if !config.exchange.name.eq_ignore_ascii_case("huobi") {
        bail!("지원하지 않는 거래소: {}", config.exchange.name);
    }
    if config.exchange.api_key.is_empty() || config.exchange.api_secret.is_empty() {
        bail!("API 키와 시크릿이 필요합니다 (--key/--secret 또는 HUOBI_API_KEY/HUOBI_API_SECRET)");
    }

    Ok(Arc::new(market_data))
}
