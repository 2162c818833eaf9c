//! 통화별 잔고 구분 계산.
//!
//! 거래소가 반환하는 `(통화, 구분, 수량)` 목록에서 한 통화의 `Carry`를 추출합니다.
//! 네트워크 호출이 없는 순수 변환입니다.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use trader_core::{BalanceBucket, BalanceEntry};

/// 잘못된 잔고 데이터.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarryError {
    /// 음수가 될 수 없는 구분에 음수 수량
    #[error("{currency} {bucket} 잔고가 음수입니다: {amount}")]
    Negative {
        currency: String,
        bucket: BalanceBucket,
        amount: Decimal,
    },
}

/// 마진 계좌에서 한 통화의 잔고 구분 스냅샷.
///
/// 결정마다 새로 계산하며 주기 사이에 캐시하지 않습니다.
/// `loan`과 `interest`는 거래소 표기(음수)와 무관하게 절대값으로 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Carry {
    /// 통화 (소문자)
    pub currency: String,
    /// 거래 가능
    pub trade: Decimal,
    /// 동결
    pub frozen: Decimal,
    /// 출금 가능
    pub transfer_out_available: Decimal,
    /// 대출 가능
    pub loan_available: Decimal,
    /// 미상환 원금
    pub loan: Decimal,
    /// 누적 이자
    pub interest: Decimal,
}

impl Carry {
    /// 모든 구분이 0인 Carry.
    pub fn zero(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into().to_lowercase(),
            trade: Decimal::ZERO,
            frozen: Decimal::ZERO,
            transfer_out_available: Decimal::ZERO,
            loan_available: Decimal::ZERO,
            loan: Decimal::ZERO,
            interest: Decimal::ZERO,
        }
    }

    /// 원시 잔고 목록에서 한 통화의 Carry를 추출합니다.
    ///
    /// 없는 구분은 0입니다. 같은 구분이 여러 번 나오면 합산합니다.
    ///
    /// # Errors
    /// 거래 가능, 동결, 출금 가능, 대출 가능 구분이 음수이면 `CarryError::Negative`.
    pub fn from_entries(entries: &[BalanceEntry], currency: &str) -> Result<Self, CarryError> {
        let mut carry = Self::zero(currency);

        for entry in entries.iter().filter(|e| e.currency == carry.currency) {
            let slot = match entry.bucket {
                BalanceBucket::Trade => &mut carry.trade,
                BalanceBucket::Frozen => &mut carry.frozen,
                BalanceBucket::TransferOutAvailable => &mut carry.transfer_out_available,
                BalanceBucket::LoanAvailable => &mut carry.loan_available,
                BalanceBucket::Loan => {
                    carry.loan += entry.amount.abs();
                    continue;
                }
                BalanceBucket::Interest => {
                    carry.interest += entry.amount.abs();
                    continue;
                }
            };

            if entry.amount.is_sign_negative() && !entry.amount.is_zero() {
                return Err(CarryError::Negative {
                    currency: carry.currency.clone(),
                    bucket: entry.bucket,
                    amount: entry.amount,
                });
            }
            *slot += entry.amount;
        }

        Ok(carry)
    }

    /// 미상환 원금과 이자의 합.
    pub fn outstanding(&self) -> Decimal {
        self.loan + self.interest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(currency: &str, bucket: BalanceBucket, amount: Decimal) -> BalanceEntry {
        BalanceEntry::new(currency, bucket, amount)
    }

    #[test]
    fn test_missing_buckets_default_to_zero() {
        let entries = vec![entry("btc", BalanceBucket::Trade, dec!(0.02))];

        let btc = Carry::from_entries(&entries, "btc").unwrap();
        assert_eq!(btc.trade, dec!(0.02));
        assert_eq!(btc.frozen, Decimal::ZERO);
        assert_eq!(btc.loan_available, Decimal::ZERO);
        assert_eq!(btc.outstanding(), Decimal::ZERO);

        let usdt = Carry::from_entries(&entries, "USDT").unwrap();
        assert_eq!(usdt, Carry::zero("usdt"));
    }

    #[test]
    fn test_loans_are_absolute() {
        let entries = vec![
            entry("usdt", BalanceBucket::Trade, dec!(1000)),
            entry("usdt", BalanceBucket::LoanAvailable, dec!(50)),
            entry("usdt", BalanceBucket::Loan, dec!(-200)),
            entry("usdt", BalanceBucket::Interest, dec!(-0.5)),
            entry("btc", BalanceBucket::Trade, dec!(1)),
        ];

        let usdt = Carry::from_entries(&entries, "usdt").unwrap();
        assert_eq!(usdt.trade, dec!(1000));
        assert_eq!(usdt.loan_available, dec!(50));
        assert_eq!(usdt.loan, dec!(200));
        assert_eq!(usdt.interest, dec!(0.5));
        assert_eq!(usdt.outstanding(), dec!(200.5));
    }

    #[test]
    fn test_negative_trade_is_malformed() {
        let entries = vec![entry("btc", BalanceBucket::Trade, dec!(-1))];

        let err = Carry::from_entries(&entries, "btc").unwrap_err();
        assert!(matches!(
            err,
            CarryError::Negative { bucket: BalanceBucket::Trade, .. }
        ));
    }
}
