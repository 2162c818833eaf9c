//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// 알림 우선순위 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// 낮은 우선순위 (정보성)
    Low,
    /// 일반 우선순위 (계좌 변경)
    #[default]
    Normal,
    /// 높은 우선순위 (실패 등 확인 필요)
    High,
}

/// 체결 결과.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFill {
    /// 체결 수량 (기준 통화)
    pub amount: Decimal,
    /// 체결 금액 (호가 통화)
    pub cash_amount: Decimal,
    /// 수수료
    pub fees: Decimal,
}

/// 통화 하나의 잔고 요약 (상태 보고용).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySummary {
    /// 통화
    pub currency: String,
    /// 거래 가능
    pub trade: Decimal,
    /// 미상환 대출
    pub loan: Decimal,
    /// 미상환 이자
    pub interest: Decimal,
}

/// 알림 이벤트 타입.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 대출 실행
    Borrow {
        symbol: String,
        currency: String,
        amount: Decimal,
        borrow_order_id: String,
    },
    /// 시장가 주문 실행 (수량은 주문에 사용한 통화 기준)
    Trade {
        symbol: String,
        side: String,
        currency: String,
        amount: Decimal,
        order_id: String,
        fill: Option<TradeFill>,
    },
    /// 대출 상환
    Repay {
        symbol: String,
        currency: String,
        amount: Decimal,
        borrow_order_id: String,
    },
    /// 주기적 상태 보고
    HealthReport {
        symbol: String,
        position: String,
        last_signal: String,
        balances: Vec<CurrencySummary>,
    },
    /// 사용자 정의 알림
    Custom { title: String, message: String },
}

impl NotificationEvent {
    /// 이벤트 유형 이름.
    pub fn kind(&self) -> &str {
        match self {
            NotificationEvent::Borrow { .. } => "borrow",
            NotificationEvent::Trade { side, .. } => side,
            NotificationEvent::Repay { .. } => "repay",
            NotificationEvent::HealthReport { .. } => "health",
            NotificationEvent::Custom { .. } => "custom",
        }
    }
}

/// 알림 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// 고유 알림 ID
    pub id: String,
    /// 알림 이벤트
    pub event: NotificationEvent,
    /// 우선순위 레벨
    pub priority: NotificationPriority,
    /// 타임스탬프
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// 새 알림을 생성합니다.
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            priority: NotificationPriority::Normal,
            timestamp: Utc::now(),
        }
    }

    /// 우선순위 레벨을 설정합니다.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// 운영자 채널용 일반 텍스트.
    ///
    /// 첫 줄은 현지 시각, 이어서 유형/심볼/수량 줄이 옵니다.
    pub fn render_text(&self) -> String {
        let timestamp = self
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let mut text = format!("{timestamp}\n유형: {}", self.event.kind());

        match &self.event {
            NotificationEvent::Borrow {
                symbol,
                currency,
                amount,
                ..
            }
            | NotificationEvent::Repay {
                symbol,
                currency,
                amount,
                ..
            } => {
                let _ = write!(
                    text,
                    "\n심볼: {symbol}\n수량: {amount:.4} {}",
                    currency.to_uppercase()
                );
            }
            NotificationEvent::Trade {
                symbol,
                currency,
                amount,
                fill,
                ..
            } => {
                let _ = write!(
                    text,
                    "\n심볼: {symbol}\n수량: {amount:.4} {}",
                    currency.to_uppercase()
                );
                if let Some(fill) = fill {
                    let _ = write!(
                        text,
                        "\n체결: {:.8} / {:.4} (수수료 {:.8})",
                        fill.amount, fill.cash_amount, fill.fees
                    );
                }
            }
            NotificationEvent::HealthReport {
                symbol,
                position,
                last_signal,
                balances,
            } => {
                let _ = write!(
                    text,
                    "\n심볼: {symbol}\n포지션: {position}\n최근 시그널: {last_signal}"
                );
                for b in balances {
                    let _ = write!(
                        text,
                        "\n{}: 거래 가능 {:.4}, 대출 {:.4}, 이자 {:.8}",
                        b.currency.to_uppercase(),
                        b.trade,
                        b.loan,
                        b.interest
                    );
                }
            }
            NotificationEvent::Custom { title, message } => {
                let _ = write!(text, "\n{title}\n{message}");
            }
        }

        text
    }
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_borrow() {
        let notification = Notification::new(NotificationEvent::Borrow {
            symbol: "btc_usdt".to_string(),
            currency: "usdt".to_string(),
            amount: dec!(10),
            borrow_order_id: "1001".to_string(),
        });

        let text = notification.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "유형: borrow");
        assert_eq!(lines[2], "심볼: btc_usdt");
        assert_eq!(lines[3], "수량: 10.0000 USDT");
    }

    #[test]
    fn test_render_trade_with_fill() {
        let notification = Notification::new(NotificationEvent::Trade {
            symbol: "btc_usdt".to_string(),
            side: "sell".to_string(),
            currency: "btc".to_string(),
            amount: dec!(0.0199),
            order_id: "59378".to_string(),
            fill: Some(TradeFill {
                amount: dec!(0.0199),
                cash_amount: dec!(597),
                fees: dec!(1.194),
            }),
        });

        let text = notification.render_text();
        assert!(text.contains("유형: sell"));
        assert!(text.contains("수량: 0.0199 BTC"));
        assert!(text.contains("체결: 0.01990000 / 597.0000"));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = NotificationEvent::Repay {
            symbol: "btc_usdt".to_string(),
            currency: "btc".to_string(),
            amount: dec!(0.5),
            borrow_order_id: "7".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "repay");
    }
}
