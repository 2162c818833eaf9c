//! SignalSource trait 정의.

use async_trait::async_trait;
use trader_core::Signal;
use trader_exchange::MarginExchange;

use crate::error::StrategyResult;

/// 시장 데이터로부터 이산 시그널을 계산하는 전략.
///
/// 폴링 주기마다 한 번 호출되며, 호출 사이에 상태를 유지하지 않습니다.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// 전략 이름 반환.
    fn name(&self) -> &str;

    /// 현재 시그널을 계산합니다.
    async fn signal(&self, exchange: &dyn MarginExchange) -> StrategyResult<Signal>;
}
