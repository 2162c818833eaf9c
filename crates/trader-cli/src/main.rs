//! 마진 트레이딩 에이전트 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # btc_usdt를 ripdog 전략으로 실행
//! trader run --symbol btc_usdt --strategy ripdog --key $KEY --secret $SECRET
//!
//! # 모의투자 (실제 시세, 메모리 잔고)
//! trader --paper --paper-balance usdt=1000 run --symbol btc_usdt
//!
//! # 현재 시그널과 잔고 확인
//! trader signal
//! trader carry --symbol btc_usdt
//!
//! # 전략 목록
//! trader strategies
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use trader_cli::commands::carry::print_carry;
use trader_cli::commands::context::{build_exchange, load_config, GlobalOptions};
use trader_cli::commands::run::run;
use trader_cli::commands::signal::print_signal;
use trader_cli::commands::strategies::print_strategies;
use trader_core::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Huobi 마진 계좌 자동 매매 에이전트", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API 키
    #[arg(long, global = true, env = "HUOBI_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// API 시크릿
    #[arg(long, global = true, env = "HUOBI_API_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// 모의투자 모드 (주문/대출을 메모리에서 처리)
    #[arg(long, global = true)]
    paper: bool,

    /// 모의투자 초기 잔고 (예: usdt=1000, 반복 가능)
    #[arg(long = "paper-balance", global = true)]
    paper_balance: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 폴링 루프 실행 (Ctrl-C로 종료)
    Run {
        /// 거래 심볼 (예: btc_usdt)
        #[arg(short, long)]
        symbol: Option<String>,

        /// 전략 이름
        #[arg(long)]
        strategy: Option<String>,
    },

    /// 현재 시그널 한 번 출력
    Signal {
        /// 전략 이름
        #[arg(long)]
        strategy: Option<String>,
    },

    /// 잔고 구분과 포지션 상태 출력
    Carry {
        /// 거래 심볼 (예: btc_usdt)
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// 사용 가능한 전략 목록
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        key: cli.key,
        secret: cli.secret,
        paper: cli.paper,
        paper_balances: cli.paper_balance,
    };

    if let Commands::Strategies = cli.command {
        print_strategies();
        return Ok(());
    }

    let mut config = load_config(&options)?;
    init_logging(LogConfig::from_settings(&config.logging))?;

    match cli.command {
        Commands::Run { symbol, strategy } => {
            if let Some(symbol) = symbol {
                config.trading.symbol = symbol;
            }
            if let Some(strategy) = strategy {
                config.trading.strategy = strategy;
            }
            let exchange = build_exchange(&config, &options)?;
            if let Err(e) = run(config, exchange).await {
                error!(error = %e, "트레이딩 루프 중단");
                return Err(e);
            }
        }

        Commands::Signal { strategy } => {
            if let Some(strategy) = strategy {
                config.trading.strategy = strategy;
            }
            let exchange = build_exchange(&config, &options)?;
            print_signal(&config, exchange.as_ref()).await?;
        }

        Commands::Carry { symbol } => {
            if let Some(symbol) = symbol {
                config.trading.symbol = symbol;
            }
            let exchange = build_exchange(&config, &options)?;
            print_carry(&config, exchange).await?;
        }

        Commands::Strategies => print_strategies(),
    }

    Ok(())
}
