//! 레버리지 컨트롤러.
//!
//! 주문 전에 내어줄 통화를 대출 가능한 최대치까지 빌립니다.
//! 통화마다 한 번의 호출에서 성공한 대출은 최대 한 건입니다.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use trader_core::{BorrowState, DecimalExt, Symbol};
use trader_exchange::{ExchangeResult, MarginExchange};
use trader_notification::Notifier;

use crate::carry::Carry;

/// 실행된 대출 기록.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowRecord {
    /// 대출 주문 ID
    pub borrow_order_id: String,
    /// 통화
    pub currency: String,
    /// 대출 수량
    pub amount: Decimal,
}

/// 대출 단계 결과.
#[derive(Debug, Clone)]
pub struct LeverageOutcome {
    /// 마지막으로 조회한 Carry (대출 반영 후)
    pub carry: Carry,
    /// 이번 호출에서 실행한 대출
    pub borrowed: Option<BorrowRecord>,
}

/// 대출 가능 금액을 모두 빌리는 컨트롤러.
pub struct LeverageController<'a> {
    exchange: &'a dyn MarginExchange,
    notifier: &'a Notifier,
    borrow_precision: u32,
}

impl<'a> LeverageController<'a> {
    pub fn new(
        exchange: &'a dyn MarginExchange,
        notifier: &'a Notifier,
        borrow_precision: u32,
    ) -> Self {
        Self {
            exchange,
            notifier,
            borrow_precision,
        }
    }

    /// 통화의 대출 가능 금액을 빌리고 최신 Carry를 반환합니다.
    ///
    /// 다음 중 하나가 될 때까지 Carry를 조회하고 대출합니다:
    /// - 대출 가능 금액이 없음
    /// - 해당 통화의 이자 발생 중 대출 주문이 이미 있음
    /// - 이번 호출에서 이미 한 번 대출함
    ///
    /// 대출 실패는 즉시 반환되며 이전 대출을 되돌리지 않습니다.
    pub async fn maximize(&self, symbol: &Symbol, currency: &str) -> ExchangeResult<LeverageOutcome> {
        let mut borrowed: Option<BorrowRecord> = None;

        loop {
            let carry = self.query_carry(symbol, currency).await?;
            let amount = carry.loan_available.floor_dp(self.borrow_precision);

            if borrowed.is_some() || !amount.is_positive() {
                debug!(currency, loan_available = %carry.loan_available, "추가 대출 없음");
                return Ok(LeverageOutcome { carry, borrowed });
            }

            if self.has_accruing_order(symbol, currency).await? {
                info!(currency, "이자 발생 중인 대출이 있어 대출하지 않음");
                return Ok(LeverageOutcome { carry, borrowed });
            }

            let borrow_order_id = self.exchange.borrow(symbol, currency, amount).await?;
            info!(
                symbol = %symbol,
                currency,
                amount = %amount,
                borrow_order_id = %borrow_order_id,
                "대출 완료"
            );
            self.notifier
                .notify_borrow(&symbol.to_string(), currency, amount, &borrow_order_id)
                .await;

            borrowed = Some(BorrowRecord {
                borrow_order_id,
                currency: currency.to_string(),
                amount,
            });
        }
    }

    async fn query_carry(&self, symbol: &Symbol, currency: &str) -> ExchangeResult<Carry> {
        let entries = self.exchange.get_account_carry(symbol).await?;
        Ok(Carry::from_entries(&entries, currency).unwrap_or_else(|e| {
            warn!(error = %e, "잔고 데이터 이상, 잔고 없음으로 처리");
            Carry::zero(currency)
        }))
    }

    async fn has_accruing_order(&self, symbol: &Symbol, currency: &str) -> ExchangeResult<bool> {
        let orders = self
            .exchange
            .get_borrow_orders(symbol, Some(BorrowState::Accrual))
            .await?;
        Ok(orders
            .iter()
            .any(|o| o.currency == currency && o.state.is_accruing()))
    }
}
