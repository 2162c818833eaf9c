//! 실행 오케스트레이터.
//!
//! 시그널 하나를 거래소 계좌 변경 순서로 변환합니다:
//!
//! ```text
//! Idle → CancelOpenOrders → AssessPosition → (Borrow) → SizeAndTrade → (Repay) → Done
//! ```
//!
//! 어느 단계든 실패하면 남은 단계를 건너뛰고 단계 이름과 함께 에러를 반환합니다.
//! 이미 실행된 작업은 되돌리지 않으며, 다음 주기에 새 상태로 다시 판단합니다.
//! 상환 단계만 부분 실패를 허용합니다 (대출 주문별로 시도 후 실패를 모아서 보고).

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};
use trader_core::{
    trading_span, BorrowState, DecimalExt, ExecutionConfig, OrderDetail, OrderState, Side,
    Signal, Symbol, SymbolSpec, Ticker,
};
use trader_exchange::{ExchangeResult, MarginExchange};
use trader_notification::{Notifier, TradeFill};

use crate::carry::Carry;
use crate::error::{ExecutionError, ExecutionResult, ExecutionStep, RepayFailure};
use crate::leverage::{BorrowRecord, LeverageController};
use crate::planner::{ExposurePlanner, PlanOutcome};
use crate::position::{classify, PositionStatus};

/// 거래 없이 끝난 이유.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 시그널이 None
    NoSignal,
    /// 이미 원하는 포지션 (매수 시 Full, 매도 시 Empty)
    AlreadyPositioned(PositionStatus),
    /// 주문 수량이 최소 한도 미만
    BelowMinimum { amount: Decimal, minimum: Decimal },
}

/// 실행된 시장가 주문.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    /// 주문 ID
    pub order_id: String,
    /// 주문 방향
    pub side: Side,
    /// 주문 수량 (매수는 호가 통화 금액, 매도는 기준 통화 수량)
    pub amount: Decimal,
    /// 정산 대기 후 조회한 체결 상세
    pub detail: Option<OrderDetail>,
}

/// 실행된 상환.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepayRecord {
    /// 대출 주문 ID
    pub borrow_order_id: String,
    /// 통화
    pub currency: String,
    /// 상환 수량
    pub amount: Decimal,
}

/// 한 번의 실행 결과.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// 입력 시그널
    pub signal: Signal,
    /// 취소한 미체결 주문 수
    pub cancelled_orders: usize,
    /// 판정한 포지션 상태
    pub position: Option<PositionStatus>,
    /// 대출
    pub borrowed: Option<BorrowRecord>,
    /// 시장가 주문
    pub trade: Option<TradeRecord>,
    /// 상환
    pub repaid: Vec<RepayRecord>,
    /// 거래 없이 끝난 이유
    pub skipped: Option<SkipReason>,
}

impl ExecutionReport {
    fn new(signal: Signal) -> Self {
        Self {
            signal,
            cancelled_orders: 0,
            position: None,
            borrowed: None,
            trade: None,
            repaid: Vec::new(),
            skipped: None,
        }
    }

    fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }
}

/// 심볼 하나의 계좌 스냅샷 (상태 보고, 조회 명령용).
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// 기준 통화 Carry
    pub base: Carry,
    /// 호가 통화 Carry
    pub quote: Carry,
    /// 현재 시세
    pub ticker: Ticker,
    /// 포지션 상태
    pub position: PositionStatus,
}

/// 시그널을 계좌 변경으로 실행하는 오케스트레이터.
///
/// 같은 심볼에 대해 동시에 호출되지 않는다고 가정합니다. 잔고와 포지션은
/// 호출마다 거래소에서 새로 조회하며 호출 사이에 보관하지 않습니다.
pub struct Orchestrator {
    exchange: Arc<dyn MarginExchange>,
    notifier: Notifier,
    config: ExecutionConfig,
    planner: ExposurePlanner,
}

impl Orchestrator {
    pub fn new(exchange: Arc<dyn MarginExchange>, notifier: Notifier, config: ExecutionConfig) -> Self {
        let planner = ExposurePlanner::new(config.taker_fee_rate);
        Self {
            exchange,
            notifier,
            config,
            planner,
        }
    }

    /// 실행 설정.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// 알림 전송기.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// 시그널 하나를 실행합니다.
    ///
    /// `Signal::None`이면 거래소 호출 없이 바로 성공합니다.
    /// 심볼이 비어 있으면 거래소를 호출하기 전에 `ExecutionError::Validation`을 반환합니다.
    pub async fn execute(&self, signal: Signal, spec: &SymbolSpec) -> ExecutionResult<ExecutionReport> {
        let span = trading_span!("execute", spec.symbol, signal);
        self.run(signal, spec).instrument(span).await
    }

    async fn run(&self, signal: Signal, spec: &SymbolSpec) -> ExecutionResult<ExecutionReport> {
        let mut report = ExecutionReport::new(signal);
        let Some(command) = signal.command() else {
            debug!("시그널 없음");
            return Ok(report.skip(SkipReason::NoSignal));
        };
        spec.symbol.validate()?;
        let symbol = &spec.symbol;
        let side = command.side;

        report.cancelled_orders = self
            .cancel_open_orders(symbol)
            .await
            .map_err(ExecutionError::at(ExecutionStep::CancelOpenOrders))?;

        let snapshot = self
            .snapshot(symbol)
            .await
            .map_err(ExecutionError::at(ExecutionStep::AssessPosition))?;
        report.position = Some(snapshot.position);

        let already_positioned = matches!(
            (side, snapshot.position),
            (Side::Buy, PositionStatus::Full) | (Side::Sell, PositionStatus::Empty)
        );
        if already_positioned && !command.margin {
            info!(%side, position = %snapshot.position, "이미 포지션 상태, 주문 생략");
            return Ok(report.skip(SkipReason::AlreadyPositioned(snapshot.position)));
        }

        let spend = symbol.spend_currency(side);
        let carry = if command.margin {
            let outcome = LeverageController::new(
                self.exchange.as_ref(),
                &self.notifier,
                self.config.borrow_precision,
            )
            .maximize(symbol, spend)
            .await
            .map_err(ExecutionError::at(ExecutionStep::Borrow))?;
            report.borrowed = outcome.borrowed;
            outcome.carry
        } else if spend == symbol.base {
            snapshot.base
        } else {
            snapshot.quote
        };

        let amount = match self.planner.plan(side, &carry, &spec.limits, spec.order_precision(side)) {
            PlanOutcome::Trade(amount) => amount,
            PlanOutcome::Skip { amount, minimum } => {
                info!(%side, amount = %amount, minimum = %minimum, "최소 주문 한도 미만, 주문 생략");
                return Ok(report.skip(SkipReason::BelowMinimum { amount, minimum }));
            }
        };

        let trade = self
            .size_and_trade(symbol, side, amount)
            .await
            .map_err(ExecutionError::at(ExecutionStep::SizeAndTrade))?;
        report.trade = Some(trade);

        if command.margin || self.config.repay_on_spot {
            report.repaid = self.repay(symbol, symbol.receive_currency(side)).await?;
        }

        Ok(report)
    }

    /// 기준/호가 통화 Carry, 시세, 포지션 상태를 조회합니다.
    ///
    /// 포지션은 최우선 매도호가로 평가합니다.
    pub async fn snapshot(&self, symbol: &Symbol) -> ExchangeResult<AccountSnapshot> {
        let ticker = self.exchange.get_ticker(symbol).await?;
        let entries = self.exchange.get_account_carry(symbol).await?;

        let carry_of = |currency: &str| {
            Carry::from_entries(&entries, currency).unwrap_or_else(|e| {
                warn!(error = %e, "잔고 데이터 이상, 잔고 없음으로 처리");
                Carry::zero(currency)
            })
        };
        let base = carry_of(&symbol.base);
        let quote = carry_of(&symbol.quote);
        let position = classify(&quote, &base, ticker.ask, self.config.dust_threshold);

        debug!(
            base_trade = %base.trade,
            quote_trade = %quote.trade,
            ask = %ticker.ask,
            %position,
            "포지션 판정"
        );

        Ok(AccountSnapshot {
            base,
            quote,
            ticker,
            position,
        })
    }

    async fn cancel_open_orders(&self, symbol: &Symbol) -> ExchangeResult<usize> {
        let open = self.exchange.get_open_orders(symbol, &OrderState::OPEN).await?;
        if open.is_empty() {
            return Ok(0);
        }

        info!(count = open.len(), "미체결 주문 취소");
        self.exchange.cancel_all_orders(symbol, &open).await?;
        Ok(open.len())
    }

    async fn size_and_trade(
        &self,
        symbol: &Symbol,
        side: Side,
        amount: Decimal,
    ) -> ExchangeResult<TradeRecord> {
        let order_id = self.exchange.place_market_order(symbol, side, amount).await?;
        info!(%side, amount = %amount, order_id = %order_id, "시장가 주문 제출");

        if self.config.settle_wait_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_wait_ms)).await;
        }

        // 주문은 이미 제출되었으므로 체결 조회 실패로 주기를 중단하지 않습니다.
        let detail = match self.exchange.get_order_detail(&order_id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "체결 상세 조회 실패");
                None
            }
        };

        let spend = symbol.spend_currency(side);
        let (reported, fill) = match &detail {
            Some(d) => {
                let spent = match side {
                    Side::Buy => d.filled_cash_amount,
                    Side::Sell => d.filled_amount,
                };
                let fill = TradeFill {
                    amount: d.filled_amount,
                    cash_amount: d.filled_cash_amount,
                    fees: d.filled_fees,
                };
                (if spent.is_positive() { spent } else { amount }, Some(fill))
            }
            None => (amount, None),
        };

        self.notifier
            .notify_trade(
                &symbol.to_string(),
                &side.to_string(),
                spend,
                reported,
                &order_id,
                fill,
            )
            .await;

        Ok(TradeRecord {
            order_id,
            side,
            amount,
            detail,
        })
    }

    /// 통화의 이자 발생 중인 대출 주문을 모두 상환합니다.
    ///
    /// 주문마다 독립적으로 상환하고, 실패는 모아서 하나의 에러로 반환합니다.
    async fn repay(&self, symbol: &Symbol, currency: &str) -> ExecutionResult<Vec<RepayRecord>> {
        let orders = self
            .exchange
            .get_borrow_orders(symbol, Some(BorrowState::Accrual))
            .await
            .map_err(ExecutionError::at(ExecutionStep::Repay))?;

        let mut repaid = Vec::new();
        let mut failures = Vec::new();

        for order in orders
            .iter()
            .filter(|o| o.currency == currency && o.state.is_accruing())
        {
            let amount = order.outstanding().floor_dp(self.config.repay_precision);
            if !amount.is_positive() {
                continue;
            }

            match self.exchange.repay(&order.id, amount).await {
                Ok(()) => {
                    info!(borrow_order_id = %order.id, currency, amount = %amount, "상환 완료");
                    self.notifier
                        .notify_repay(&symbol.to_string(), currency, amount, &order.id)
                        .await;
                    repaid.push(RepayRecord {
                        borrow_order_id: order.id.clone(),
                        currency: currency.to_string(),
                        amount,
                    });
                }
                Err(error) => {
                    warn!(borrow_order_id = %order.id, error = %error, "상환 실패");
                    failures.push(RepayFailure {
                        borrow_order_id: order.id.clone(),
                        error,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(repaid)
        } else {
            Err(ExecutionError::Repay { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use trader_core::SymbolLimits;
    use trader_exchange::{SimOp, SimulatedConfig, SimulatedMarginExchange};

    fn spec() -> SymbolSpec {
        SymbolSpec {
            symbol: Symbol::new("btc", "usdt"),
            price_precision: 2,
            amount_precision: 4,
            value_precision: 8,
            limits: SymbolLimits {
                buy_min: dec!(1),
                buy_max: dec!(100000),
                sell_min: dec!(0.0001),
                sell_max: dec!(100),
            },
        }
    }

    fn orchestrator(exchange: Arc<SimulatedMarginExchange>) -> Orchestrator {
        let config = ExecutionConfig {
            settle_wait_ms: 0,
            ..ExecutionConfig::default()
        };
        Orchestrator::new(exchange, Notifier::new(), config)
    }

    fn exchange(config: SimulatedConfig) -> Arc<SimulatedMarginExchange> {
        let ticker = Ticker::new(
            Symbol::new("btc", "usdt"),
            dec!(29990),
            dec!(30000),
            dec!(29995),
            dec!(29000),
            Utc::now(),
        );
        Arc::new(SimulatedMarginExchange::new(config.with_ticker(ticker)))
    }

    #[tokio::test]
    async fn test_spot_buy_on_full_position_is_skipped() {
        let exchange = exchange(
            SimulatedConfig::default()
                .with_balance("usdt", dec!(5))
                .with_balance("btc", dec!(1)),
        );

        let report = orchestrator(exchange.clone())
            .execute(Signal::Rise, &spec())
            .await
            .unwrap();

        assert_eq!(
            report.skipped,
            Some(SkipReason::AlreadyPositioned(PositionStatus::Full))
        );
        assert!(exchange.calls_of(SimOp::PlaceMarketOrder).await.is_empty());
    }

    #[tokio::test]
    async fn test_spot_buy_spends_quote() {
        let exchange = exchange(SimulatedConfig::default().with_balance("usdt", dec!(1002)));

        let report = orchestrator(exchange.clone())
            .execute(Signal::Rise, &spec())
            .await
            .unwrap();

        let trade = report.trade.unwrap();
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.amount, dec!(1000));
        assert_eq!(report.position, Some(PositionStatus::Empty));
        assert!(report.repaid.is_empty());
        assert!(exchange.calls_of(SimOp::GetBorrowOrders).await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_values_target_at_ask() {
        let exchange = exchange(
            SimulatedConfig::default()
                .with_balance("usdt", dec!(1000))
                .with_balance("btc", dec!(0.002)),
        );

        let snapshot = orchestrator(exchange).snapshot(&spec().symbol).await.unwrap();

        // 0.002 × 30000 = 60 USDT
        assert_eq!(snapshot.position, PositionStatus::Indeterminate);
        assert_eq!(snapshot.base.trade, dec!(0.002));
        assert_eq!(snapshot.quote.trade, dec!(1000));
    }
}
