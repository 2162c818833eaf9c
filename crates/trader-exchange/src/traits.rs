//! 마진 거래소 trait 정의.

use async_trait::async_trait;
use rust_decimal::Decimal;
use trader_core::{
    BalanceEntry, BorrowOrder, BorrowState, OpenOrder, OrderDetail, OrderState, Side, Symbol,
    SymbolLimits, SymbolSpec, Ticker,
};

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 심볼 단위 마진 계좌를 다루는 거래소 인터페이스.
///
/// 모든 호출은 순차적으로 이루어지며, 전송 계층 재시도는 구현체의 책임입니다.
#[async_trait]
pub trait MarginExchange: Send + Sync {
    /// 거래소 이름 반환.
    fn name(&self) -> &str;

    // === 시장 데이터 ===

    /// 24시간 통합 시세 조회.
    async fn get_ticker(&self, symbol: &Symbol) -> ExchangeResult<Ticker>;

    /// 심볼 메타데이터(정밀도, 주문 한도) 조회.
    ///
    /// 거래소가 지원하지 않는 심볼이면 `ExchangeError::SymbolNotFound`.
    async fn get_symbol_spec(&self, symbol: &Symbol) -> ExchangeResult<SymbolSpec>;

    /// 방향별 주문 한도 조회.
    async fn get_symbol_limits(&self, symbol: &Symbol) -> ExchangeResult<SymbolLimits> {
        Ok(self.get_symbol_spec(symbol).await?.limits)
    }

    // === 계좌 ===

    /// 심볼 마진 계좌의 통화별 잔고 구분 목록 조회.
    async fn get_account_carry(&self, symbol: &Symbol) -> ExchangeResult<Vec<BalanceEntry>>;

    // === 주문 ===

    /// 주어진 상태의 미체결 주문 조회.
    async fn get_open_orders(
        &self,
        symbol: &Symbol,
        states: &[OrderState],
    ) -> ExchangeResult<Vec<OpenOrder>>;

    /// `get_open_orders`로 조회한 미체결 주문을 모두 취소.
    ///
    /// 목록을 다시 조회하지 않습니다. 주문별로 취소하며,
    /// 일부 실패는 `ExchangeError::Aggregate`로 모아 반환합니다.
    async fn cancel_all_orders(
        &self,
        symbol: &Symbol,
        open_orders: &[OpenOrder],
    ) -> ExchangeResult<()>;

    /// 시장가 주문.
    ///
    /// 매수 수량은 호가 통화 금액, 매도 수량은 기준 통화 수량입니다.
    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: Side,
        amount: Decimal,
    ) -> ExchangeResult<String>;

    /// 주문 체결 상세 조회.
    async fn get_order_detail(&self, order_id: &str) -> ExchangeResult<OrderDetail>;

    // === 대출 ===

    /// 대출 주문 조회 (상태 필터 선택).
    async fn get_borrow_orders(
        &self,
        symbol: &Symbol,
        state: Option<BorrowState>,
    ) -> ExchangeResult<Vec<BorrowOrder>>;

    /// 대출 신청. 대출 주문 ID를 반환합니다.
    async fn borrow(&self, symbol: &Symbol, currency: &str, amount: Decimal)
        -> ExchangeResult<String>;

    /// 대출 주문 상환.
    async fn repay(&self, borrow_order_id: &str, amount: Decimal) -> ExchangeResult<()>;
}
