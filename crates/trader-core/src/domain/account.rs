//! 마진 계좌 타입.
//!
//! 이 모듈은 마진 계좌 스냅샷 관련 타입을 정의합니다:
//! - `BalanceBucket` - 통화별 잔고 구분 (거래 가능, 동결, 대출 가능 등)
//! - `BalanceEntry` - 거래소가 반환하는 원시 잔고 항목
//! - `BorrowState` - 대출 주문 상태
//! - `BorrowOrder` - 미상환 대출 주문

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 마진 계좌 잔고 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalanceBucket {
    /// 거래 가능
    Trade,
    /// 동결 (미체결 주문 등)
    Frozen,
    /// 출금 가능
    TransferOutAvailable,
    /// 대출 가능
    LoanAvailable,
    /// 미상환 대출 원금
    Loan,
    /// 누적 이자
    Interest,
}

impl BalanceBucket {
    /// 거래소 API 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceBucket::Trade => "trade",
            BalanceBucket::Frozen => "frozen",
            BalanceBucket::TransferOutAvailable => "transfer-out-available",
            BalanceBucket::LoanAvailable => "loan-available",
            BalanceBucket::Loan => "loan",
            BalanceBucket::Interest => "interest",
        }
    }
}

impl fmt::Display for BalanceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trade" => Ok(BalanceBucket::Trade),
            "frozen" => Ok(BalanceBucket::Frozen),
            "transfer-out-available" => Ok(BalanceBucket::TransferOutAvailable),
            "loan-available" => Ok(BalanceBucket::LoanAvailable),
            "loan" => Ok(BalanceBucket::Loan),
            "interest" => Ok(BalanceBucket::Interest),
            other => Err(format!("unknown balance bucket: {other}")),
        }
    }
}

/// 통화 하나의 잔고 구분 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// 통화 (소문자)
    pub currency: String,
    /// 잔고 구분
    pub bucket: BalanceBucket,
    /// 금액 (대출/이자는 거래소에 따라 음수로 표기될 수 있음)
    pub amount: Decimal,
}

impl BalanceEntry {
    /// 새 잔고 항목을 생성합니다.
    pub fn new(currency: impl Into<String>, bucket: BalanceBucket, amount: Decimal) -> Self {
        Self {
            currency: currency.into().to_lowercase(),
            bucket,
            amount,
        }
    }
}

/// 대출 주문 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowState {
    /// 생성됨 (아직 이자 발생 전)
    Created,
    /// 이자 발생 중
    Accrual,
    /// 상환 완료
    Cleared,
    /// 무효
    Invalid,
}

impl BorrowState {
    /// 상환 대상(이자 발생 중)인지 확인합니다.
    pub fn is_accruing(&self) -> bool {
        matches!(self, BorrowState::Accrual)
    }

    /// 거래소 API 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowState::Created => "created",
            BorrowState::Accrual => "accrual",
            BorrowState::Cleared => "cleared",
            BorrowState::Invalid => "invalid",
        }
    }
}

impl FromStr for BorrowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(BorrowState::Created),
            "accrual" => Ok(BorrowState::Accrual),
            "cleared" => Ok(BorrowState::Cleared),
            "invalid" => Ok(BorrowState::Invalid),
            other => Err(format!("unknown borrow state: {other}")),
        }
    }
}

/// 미상환 대출 주문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowOrder {
    /// 거래소 대출 주문 ID
    pub id: String,
    /// 대출 통화 (소문자)
    pub currency: String,
    /// 미상환 원금
    pub loan_amount: Decimal,
    /// 미상환 이자
    pub interest_amount: Decimal,
    /// 상태
    pub state: BorrowState,
}

impl BorrowOrder {
    /// 상환해야 할 총액 (원금 + 이자).
    pub fn outstanding(&self) -> Decimal {
        self.loan_amount + self.interest_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bucket_parse_is_strict() {
        assert_eq!(
            "loan-available".parse::<BalanceBucket>().unwrap(),
            BalanceBucket::LoanAvailable
        );
        assert_eq!(
            BalanceBucket::TransferOutAvailable.to_string(),
            "transfer-out-available"
        );
        assert!("Trade".parse::<BalanceBucket>().is_err());
    }

    #[test]
    fn test_borrow_order_outstanding() {
        let order = BorrowOrder {
            id: "42".to_string(),
            currency: "usdt".to_string(),
            loan_amount: dec!(100),
            interest_amount: dec!(0.0125),
            state: BorrowState::Accrual,
        };
        assert_eq!(order.outstanding(), dec!(100.0125));
        assert!(order.state.is_accruing());
        assert!(!BorrowState::Cleared.is_accruing());
    }
}
