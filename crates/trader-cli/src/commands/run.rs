//! 폴링 루프.
//!
//! 주기마다 시그널을 계산하고 오케스트레이터로 실행합니다. 실행 에러는 로그로
//! 남기고 다음 주기로 넘어가며, 프로세스를 종료시키지 않습니다.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use trader_core::{AppConfig, Signal, Symbol, SymbolSpec};
use trader_exchange::MarginExchange;
use trader_execution::{ExecutionReport, Orchestrator};
use trader_notification::{CurrencySummary, Notifier};
use trader_strategy::{registry, SignalSource};

/// 폴링 루프 설정.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 폴링 간격
    pub poll_interval: Duration,
    /// 상태 보고 간격 (None이면 보고하지 않음)
    pub health_interval: Option<Duration>,
}

impl RunConfig {
    /// 애플리케이션 설정에서 생성합니다.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let symbol = Symbol::parse(&config.trading.symbol)?;
        let health = config.trading.health_report_interval_secs;

        Ok(Self {
            symbol,
            poll_interval: Duration::from_secs(config.trading.poll_interval_secs.max(1)),
            health_interval: (health > 0).then(|| Duration::from_secs(health)),
        })
    }
}

/// Ctrl-C까지 폴링 루프를 실행합니다.
pub async fn run(config: AppConfig, exchange: Arc<dyn MarginExchange>) -> Result<()> {
    config.validate().context("설정 검증 실패")?;
    let run_config = RunConfig::from_app_config(&config)?;
    let strategy = registry::create(&config.trading.strategy, &config.strategy)?;

    let spec = exchange
        .get_symbol_spec(&run_config.symbol)
        .await
        .with_context(|| format!("심볼 정보 조회 실패: {}", run_config.symbol))?;

    let notifier = Notifier::from_config(&config.notifications);
    let orchestrator = Orchestrator::new(exchange.clone(), notifier, config.execution.clone());

    info!(
        exchange = exchange.name(),
        symbol = %spec.symbol,
        strategy = strategy.name(),
        poll_secs = run_config.poll_interval.as_secs(),
        channels = ?orchestrator.notifier().channels(),
        "트레이딩 루프 시작"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_signal = Signal::None;
    let mut last_health = Instant::now();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("종료 신호 수신, 루프 종료");
                break;
            }
            _ = tokio::time::sleep(run_config.poll_interval) => {}
        }

        match strategy.signal(exchange.as_ref()).await {
            Ok(signal) => {
                last_signal = signal;
                run_cycle(&orchestrator, signal, &spec).await;
            }
            Err(e) => warn!(error = %e, "시그널 계산 실패"),
        }

        if let Some(interval) = run_config.health_interval {
            if last_health.elapsed() >= interval {
                send_health_report(&orchestrator, &spec, last_signal).await;
                last_health = Instant::now();
            }
        }
    }

    Ok(())
}

async fn run_cycle(orchestrator: &Orchestrator, signal: Signal, spec: &SymbolSpec) {
    match orchestrator.execute(signal, spec).await {
        Ok(report) => log_report(&report),
        Err(e) => error!(
            step = %e.step(),
            venue_code = e.venue_code().unwrap_or("-"),
            fatal = e.is_fatal(),
            error = %e,
            "실행 실패"
        ),
    }
}

fn log_report(report: &ExecutionReport) {
    if report.signal == Signal::None {
        return;
    }
    match &report.trade {
        Some(trade) => info!(
            signal = %report.signal,
            side = %trade.side,
            amount = %trade.amount,
            order_id = %trade.order_id,
            borrowed = report.borrowed.is_some(),
            repaid = report.repaid.len(),
            "실행 완료"
        ),
        None => info!(signal = %report.signal, skipped = ?report.skipped, "주문 없음"),
    }
}

async fn send_health_report(orchestrator: &Orchestrator, spec: &SymbolSpec, last_signal: Signal) {
    let snapshot = match orchestrator.snapshot(&spec.symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "상태 보고용 잔고 조회 실패");
            return;
        }
    };

    let balances = [&snapshot.base, &snapshot.quote]
        .into_iter()
        .map(|c| CurrencySummary {
            currency: c.currency.clone(),
            trade: c.trade,
            loan: c.loan,
            interest: c.interest,
        })
        .collect();

    orchestrator
        .notifier()
        .notify_health(
            &spec.symbol.to_string(),
            snapshot.position.as_str(),
            &last_signal.to_string(),
            balances,
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_from_app_config() {
        let mut config = AppConfig::default();
        config.trading.symbol = "btc_usdt".to_string();
        config.trading.poll_interval_secs = 0;
        config.trading.health_report_interval_secs = 0;

        let run = RunConfig::from_app_config(&config).unwrap();
        assert_eq!(run.symbol, Symbol::new("btc", "usdt"));
        assert_eq!(run.poll_interval, Duration::from_secs(1));
        assert!(run.health_interval.is_none());
    }

    #[test]
    fn test_run_config_rejects_bad_symbol() {
        let mut config = AppConfig::default();
        config.trading.symbol = "btcusdt".to_string();
        assert!(RunConfig::from_app_config(&config).is_err());
    }
}
