//! 현재 시그널 한 번 출력.

use anyhow::Result;
use trader_core::AppConfig;
use trader_exchange::MarginExchange;
use trader_strategy::registry;

pub async fn print_signal(config: &AppConfig, exchange: &dyn MarginExchange) -> Result<()> {
    let strategy = registry::create(&config.trading.strategy, &config.strategy)?;
    let signal = strategy.signal(exchange).await?;

    println!("{}: {}", strategy.name(), signal);
    Ok(())
}
