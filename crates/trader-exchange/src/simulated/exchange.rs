//! 시뮬레이션 마진 거래소 구현.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use trader_core::{
    BalanceBucket, BalanceEntry, BorrowOrder, BorrowState, OpenOrder, OrderDetail, OrderState,
    Side, Symbol, SymbolSpec, Ticker,
};

use crate::traits::{ExchangeResult, MarginExchange};
use crate::ExchangeError;

/// 시뮬레이션 거래소가 받은 호출 기록.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    GetTicker(Symbol),
    GetSymbolSpec(Symbol),
    GetAccountCarry(Symbol),
    GetOpenOrders(Symbol),
    CancelAllOrders {
        symbol: Symbol,
        order_ids: Vec<String>,
    },
    PlaceMarketOrder {
        symbol: Symbol,
        side: Side,
        amount: Decimal,
    },
    GetOrderDetail(String),
    GetBorrowOrders(Symbol, Option<BorrowState>),
    Borrow {
        symbol: Symbol,
        currency: String,
        amount: Decimal,
    },
    Repay {
        borrow_order_id: String,
        amount: Decimal,
    },
}

impl SimCall {
    /// 호출 종류.
    pub fn op(&self) -> SimOp {
        match self {
            SimCall::GetTicker(_) => SimOp::GetTicker,
            SimCall::GetSymbolSpec(_) => SimOp::GetSymbolSpec,
            SimCall::GetAccountCarry(_) => SimOp::GetAccountCarry,
            SimCall::GetOpenOrders(_) => SimOp::GetOpenOrders,
            SimCall::CancelAllOrders { .. } => SimOp::CancelAllOrders,
            SimCall::PlaceMarketOrder { .. } => SimOp::PlaceMarketOrder,
            SimCall::GetOrderDetail(_) => SimOp::GetOrderDetail,
            SimCall::GetBorrowOrders(..) => SimOp::GetBorrowOrders,
            SimCall::Borrow { .. } => SimOp::Borrow,
            SimCall::Repay { .. } => SimOp::Repay,
        }
    }
}

/// 실패 주입 대상 작업.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    GetTicker,
    GetSymbolSpec,
    GetAccountCarry,
    GetOpenOrders,
    CancelAllOrders,
    PlaceMarketOrder,
    GetOrderDetail,
    GetBorrowOrders,
    Borrow,
    Repay,
}

/// 통화 하나의 마진 계좌 잔고.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimBalance {
    /// 거래 가능
    pub trade: Decimal,
    /// 동결
    pub frozen: Decimal,
    /// 대출 가능
    pub loan_available: Decimal,
    /// 미상환 원금
    pub loan: Decimal,
    /// 미상환 이자
    pub interest: Decimal,
}

/// 시뮬레이션 거래소 설정.
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// 체결 수수료율 (받는 통화에서 차감)
    pub fee_rate: Decimal,
    /// 통화별 초기 잔고
    pub balances: HashMap<String, SimBalance>,
    /// 고정 시세
    pub tickers: HashMap<Symbol, Ticker>,
    /// 심볼 메타데이터
    pub specs: HashMap<Symbol, SymbolSpec>,
    /// 초기 미체결 주문
    pub open_orders: Vec<OpenOrder>,
    /// 초기 대출 주문
    pub borrow_orders: Vec<BorrowOrder>,
    /// 항상 실패하는 작업
    pub failing_ops: HashSet<SimOp>,
    /// 상환이 실패하는 대출 주문 ID
    pub failing_repays: HashSet<String>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.002),
            balances: HashMap::new(),
            tickers: HashMap::new(),
            specs: HashMap::new(),
            open_orders: Vec::new(),
            borrow_orders: Vec::new(),
            failing_ops: HashSet::new(),
            failing_repays: HashSet::new(),
        }
    }
}

impl SimulatedConfig {
    /// 수수료율을 설정합니다.
    pub fn with_fee_rate(mut self, rate: Decimal) -> Self {
        self.fee_rate = rate;
        self
    }

    /// 통화의 거래 가능 잔고를 설정합니다.
    pub fn with_balance(mut self, currency: &str, trade: Decimal) -> Self {
        self.balances
            .entry(currency.to_lowercase())
            .or_default()
            .trade = trade;
        self
    }

    /// 통화의 대출 가능 금액을 설정합니다.
    pub fn with_loan_available(mut self, currency: &str, amount: Decimal) -> Self {
        self.balances
            .entry(currency.to_lowercase())
            .or_default()
            .loan_available = amount;
        self
    }

    /// 심볼 시세를 설정합니다.
    pub fn with_ticker(mut self, ticker: Ticker) -> Self {
        self.tickers.insert(ticker.symbol.clone(), ticker);
        self
    }

    /// 심볼 메타데이터를 설정합니다.
    pub fn with_spec(mut self, spec: SymbolSpec) -> Self {
        self.specs.insert(spec.symbol.clone(), spec);
        self
    }

    /// 미체결 주문을 추가합니다.
    pub fn with_open_order(mut self, id: &str) -> Self {
        self.open_orders.push(OpenOrder {
            id: id.to_string(),
            state: OrderState::Submitted,
        });
        self
    }

    /// 기존 대출 주문을 추가합니다. 원금과 이자는 계좌 잔고에도 반영됩니다.
    pub fn with_borrow_order(mut self, order: BorrowOrder) -> Self {
        if order.state.is_accruing() {
            let balance = self.balances.entry(order.currency.clone()).or_default();
            balance.loan += order.loan_amount;
            balance.interest += order.interest_amount;
        }
        self.borrow_orders.push(order);
        self
    }

    /// 작업이 항상 실패하도록 설정합니다.
    pub fn with_failure(mut self, op: SimOp) -> Self {
        self.failing_ops.insert(op);
        self
    }

    /// 특정 대출 주문의 상환이 실패하도록 설정합니다.
    pub fn with_repay_failure(mut self, borrow_order_id: &str) -> Self {
        self.failing_repays.insert(borrow_order_id.to_string());
        self
    }
}

/// 내부 상태.
#[derive(Debug)]
struct SimState {
    balances: HashMap<String, SimBalance>,
    tickers: HashMap<Symbol, Ticker>,
    specs: HashMap<Symbol, SymbolSpec>,
    open_orders: Vec<OpenOrder>,
    borrow_orders: Vec<BorrowOrder>,
    orders: HashMap<String, OrderDetail>,
    calls: Vec<SimCall>,
    next_id: u64,
}

impl SimState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn balance_mut(&mut self, currency: &str) -> &mut SimBalance {
        self.balances.entry(currency.to_string()).or_default()
    }
}

/// 메모리 상의 마진 거래소.
///
/// 모의투자(`--paper`)와 테스트에 사용합니다. 모든 호출을 기록하며,
/// 작업별/대출 주문별 실패를 주입할 수 있습니다. 시장 데이터 소스를 지정하면
/// 시세와 심볼 메타데이터는 그 소스에서 가져옵니다.
pub struct SimulatedMarginExchange {
    fee_rate: Decimal,
    failing_ops: HashSet<SimOp>,
    failing_repays: HashSet<String>,
    market_data: Option<Arc<dyn MarginExchange>>,
    state: RwLock<SimState>,
}

impl SimulatedMarginExchange {
    /// 새 시뮬레이션 거래소를 생성합니다.
    pub fn new(config: SimulatedConfig) -> Self {
        let state = SimState {
            balances: config.balances,
            tickers: config.tickers,
            specs: config.specs,
            open_orders: config.open_orders,
            borrow_orders: config.borrow_orders,
            orders: HashMap::new(),
            calls: Vec::new(),
            next_id: 1000,
        };

        Self {
            fee_rate: config.fee_rate,
            failing_ops: config.failing_ops,
            failing_repays: config.failing_repays,
            market_data: None,
            state: RwLock::new(state),
        }
    }

    /// 시세와 심볼 메타데이터를 가져올 실제 거래소를 지정합니다.
    pub fn with_market_data(mut self, source: Arc<dyn MarginExchange>) -> Self {
        self.market_data = Some(source);
        self
    }

    /// 지금까지 받은 모든 호출.
    pub async fn calls(&self) -> Vec<SimCall> {
        self.state.read().await.calls.clone()
    }

    /// 특정 종류의 호출만 반환합니다.
    pub async fn calls_of(&self, op: SimOp) -> Vec<SimCall> {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// 통화의 현재 잔고.
    pub async fn balance(&self, currency: &str) -> SimBalance {
        self.state
            .read()
            .await
            .balances
            .get(currency)
            .copied()
            .unwrap_or_default()
    }

    /// 현재 미체결 주문 수.
    pub async fn open_order_count(&self) -> usize {
        self.state.read().await.open_orders.len()
    }

    /// 시세를 교체합니다.
    pub async fn set_ticker(&self, ticker: Ticker) {
        self.state
            .write()
            .await
            .tickers
            .insert(ticker.symbol.clone(), ticker);
    }

    /// 호출을 기록하고 주입된 실패를 확인합니다.
    async fn record(&self, call: SimCall) -> ExchangeResult<()> {
        let op = call.op();
        self.state.write().await.calls.push(call);

        if self.failing_ops.contains(&op) {
            return Err(ExchangeError::Api {
                code: "simulated-failure".to_string(),
                message: format!("{:?} failed", op),
            });
        }
        Ok(())
    }

    async fn current_ticker(&self, symbol: &Symbol) -> ExchangeResult<Ticker> {
        if let Some(source) = &self.market_data {
            return source.get_ticker(symbol).await;
        }
        self.state
            .read()
            .await
            .tickers
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl MarginExchange for SimulatedMarginExchange {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn get_ticker(&self, symbol: &Symbol) -> ExchangeResult<Ticker> {
        self.record(SimCall::GetTicker(symbol.clone())).await?;
        self.current_ticker(symbol).await
    }

    async fn get_symbol_spec(&self, symbol: &Symbol) -> ExchangeResult<SymbolSpec> {
        self.record(SimCall::GetSymbolSpec(symbol.clone())).await?;

        if let Some(source) = &self.market_data {
            return source.get_symbol_spec(symbol).await;
        }
        self.state
            .read()
            .await
            .specs
            .get(symbol)
            .cloned()
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))
    }

    async fn get_account_carry(&self, symbol: &Symbol) -> ExchangeResult<Vec<BalanceEntry>> {
        self.record(SimCall::GetAccountCarry(symbol.clone())).await?;

        let state = self.state.read().await;
        let mut entries = Vec::new();
        for currency in [&symbol.base, &symbol.quote] {
            let b = state.balances.get(currency.as_str()).copied().unwrap_or_default();
            // 거래소와 같이 대출과 이자는 음수로 보고합니다.
            entries.extend([
                BalanceEntry::new(currency.as_str(), BalanceBucket::Trade, b.trade),
                BalanceEntry::new(currency.as_str(), BalanceBucket::Frozen, b.frozen),
                BalanceEntry::new(currency.as_str(), BalanceBucket::TransferOutAvailable, b.trade),
                BalanceEntry::new(currency.as_str(), BalanceBucket::LoanAvailable, b.loan_available),
                BalanceEntry::new(currency.as_str(), BalanceBucket::Loan, -b.loan),
                BalanceEntry::new(currency.as_str(), BalanceBucket::Interest, -b.interest),
            ]);
        }
        Ok(entries)
    }

    async fn get_open_orders(
        &self,
        symbol: &Symbol,
        states: &[OrderState],
    ) -> ExchangeResult<Vec<OpenOrder>> {
        self.record(SimCall::GetOpenOrders(symbol.clone())).await?;

        Ok(self
            .state
            .read()
            .await
            .open_orders
            .iter()
            .filter(|o| states.contains(&o.state))
            .cloned()
            .collect())
    }

    async fn cancel_all_orders(
        &self,
        symbol: &Symbol,
        open_orders: &[OpenOrder],
    ) -> ExchangeResult<()> {
        let order_ids: Vec<String> = open_orders.iter().map(|o| o.id.clone()).collect();
        self.record(SimCall::CancelAllOrders {
            symbol: symbol.clone(),
            order_ids: order_ids.clone(),
        })
        .await?;
        self.state
            .write()
            .await
            .open_orders
            .retain(|o| !order_ids.contains(&o.id));
        Ok(())
    }

    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: Side,
        amount: Decimal,
    ) -> ExchangeResult<String> {
        self.record(SimCall::PlaceMarketOrder {
            symbol: symbol.clone(),
            side,
            amount,
        })
        .await?;

        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidQuantity(amount.to_string()));
        }

        let ticker = self.current_ticker(symbol).await?;
        let mut state = self.state.write().await;

        let spend = symbol.spend_currency(side).to_string();
        let receive = symbol.receive_currency(side).to_string();

        let available = state.balance_mut(&spend).trade;
        if available < amount {
            return Err(ExchangeError::InsufficientBalance(format!(
                "{} {} requested, {} available",
                amount, spend, available
            )));
        }

        let (filled_amount, filled_cash_amount, received) = match side {
            Side::Buy => {
                let base = amount / ticker.ask;
                (base, amount, base)
            }
            Side::Sell => {
                let cash = amount * ticker.bid;
                (amount, cash, cash)
            }
        };
        let fees = received * self.fee_rate;

        state.balance_mut(&spend).trade -= amount;
        state.balance_mut(&receive).trade += received - fees;

        let order_id = state.next_id();
        state.orders.insert(
            order_id.clone(),
            OrderDetail {
                order_id: order_id.clone(),
                state: OrderState::Filled,
                filled_amount,
                filled_cash_amount,
                filled_fees: fees,
            },
        );

        debug!(%symbol, %side, %amount, order_id = %order_id, "시뮬레이션 체결");
        Ok(order_id)
    }

    async fn get_order_detail(&self, order_id: &str) -> ExchangeResult<OrderDetail> {
        self.record(SimCall::GetOrderDetail(order_id.to_string()))
            .await?;

        self.state
            .read()
            .await
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| ExchangeError::OrderNotFound(order_id.to_string()))
    }

    async fn get_borrow_orders(
        &self,
        symbol: &Symbol,
        state: Option<BorrowState>,
    ) -> ExchangeResult<Vec<BorrowOrder>> {
        self.record(SimCall::GetBorrowOrders(symbol.clone(), state))
            .await?;

        Ok(self
            .state
            .read()
            .await
            .borrow_orders
            .iter()
            .filter(|o| o.currency == symbol.base || o.currency == symbol.quote)
            .filter(|o| state.map_or(true, |s| o.state == s))
            .cloned()
            .collect())
    }

    async fn borrow(
        &self,
        symbol: &Symbol,
        currency: &str,
        amount: Decimal,
    ) -> ExchangeResult<String> {
        self.record(SimCall::Borrow {
            symbol: symbol.clone(),
            currency: currency.to_string(),
            amount,
        })
        .await?;

        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidQuantity(amount.to_string()));
        }

        let mut state = self.state.write().await;
        let balance = state.balance_mut(currency);
        if amount > balance.loan_available {
            return Err(ExchangeError::InsufficientBalance(format!(
                "borrow {} {} exceeds loan-available {}",
                amount, currency, balance.loan_available
            )));
        }
        balance.loan_available -= amount;
        balance.loan += amount;
        balance.trade += amount;

        let id = state.next_id();
        state.borrow_orders.push(BorrowOrder {
            id: id.clone(),
            currency: currency.to_string(),
            loan_amount: amount,
            interest_amount: Decimal::ZERO,
            state: BorrowState::Accrual,
        });

        Ok(id)
    }

    async fn repay(&self, borrow_order_id: &str, amount: Decimal) -> ExchangeResult<()> {
        self.record(SimCall::Repay {
            borrow_order_id: borrow_order_id.to_string(),
            amount,
        })
        .await?;

        if self.failing_repays.contains(borrow_order_id) {
            return Err(ExchangeError::Api {
                code: "simulated-repay-failure".to_string(),
                message: format!("repay of {} rejected", borrow_order_id),
            });
        }

        let mut state = self.state.write().await;
        let index = state
            .borrow_orders
            .iter()
            .position(|o| o.id == borrow_order_id && o.state.is_accruing())
            .ok_or_else(|| ExchangeError::OrderNotFound(borrow_order_id.to_string()))?;
        let mut order = state.borrow_orders[index].clone();

        let available = state.balance_mut(&order.currency).trade;
        if available < amount {
            return Err(ExchangeError::InsufficientBalance(format!(
                "repay {} {} with {} available",
                amount, order.currency, available
            )));
        }

        // 이자를 먼저 갚고 남은 금액으로 원금을 갚습니다.
        let interest_paid = amount.min(order.interest_amount);
        let principal_paid = (amount - interest_paid).min(order.loan_amount);
        order.interest_amount -= interest_paid;
        order.loan_amount -= principal_paid;
        if order.outstanding().is_zero() {
            order.state = BorrowState::Cleared;
        }

        let balance = state.balance_mut(&order.currency);
        balance.trade -= interest_paid + principal_paid;
        balance.interest = (balance.interest - interest_paid).max(Decimal::ZERO);
        balance.loan = (balance.loan - principal_paid).max(Decimal::ZERO);
        balance.loan_available += principal_paid;

        state.borrow_orders[index] = order;
        Ok(())
    }
}
