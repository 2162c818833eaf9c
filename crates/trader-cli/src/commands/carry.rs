//! 잔고 구분과 포지션 상태 출력.

use anyhow::{Context, Result};
use std::sync::Arc;
use trader_core::{AppConfig, Symbol};
use trader_exchange::MarginExchange;
use trader_execution::{Carry, Orchestrator};
use trader_notification::Notifier;

pub async fn print_carry(config: &AppConfig, exchange: Arc<dyn MarginExchange>) -> Result<()> {
    let symbol = Symbol::parse(&config.trading.symbol)?;
    let orchestrator = Orchestrator::new(exchange, Notifier::new(), config.execution.clone());

    let snapshot = orchestrator
        .snapshot(&symbol)
        .await
        .with_context(|| format!("잔고 조회 실패: {symbol}"))?;

    println!(
        "{}  bid {}  ask {}  ({:.2}%)",
        symbol.to_standard_string(),
        snapshot.ticker.bid,
        snapshot.ticker.ask,
        snapshot.ticker.change_24h_percent
    );
    println!(
        "{:<8} {:>18} {:>18} {:>18} {:>18} {:>18}",
        "통화", "거래 가능", "동결", "대출 가능", "대출", "이자"
    );
    print_row(&snapshot.base);
    print_row(&snapshot.quote);
    println!("포지션: {}", snapshot.position);

    Ok(())
}

fn print_row(carry: &Carry) {
    println!(
        "{:<8} {:>18} {:>18} {:>18} {:>18} {:>18}",
        carry.currency.to_uppercase(),
        carry.trade,
        carry.frozen,
        carry.loan_available,
        carry.loan,
        carry.interest
    );
}
