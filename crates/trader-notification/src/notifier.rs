//! 여러 전송기로 알림을 내보내는 Notifier.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};
use trader_core::NotificationConfig;

use crate::dingtalk::{DingTalkConfig, DingTalkSender};
use crate::telegram::{TelegramConfig, TelegramSender};
use crate::types::{
    CurrencySummary, Notification, NotificationEvent, NotificationPriority, NotificationSender,
    TradeFill,
};

/// 활성화된 모든 전송기로 알림을 보냅니다.
///
/// 전송 실패는 로그로만 남기고 호출자에게 전달하지 않습니다.
#[derive(Clone, Default)]
pub struct Notifier {
    senders: Vec<Arc<dyn NotificationSender>>,
}

impl Notifier {
    /// 전송기가 없는 Notifier를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 애플리케이션 설정에서 활성화된 채널로 Notifier를 구성합니다.
    pub fn from_config(config: &NotificationConfig) -> Self {
        let mut notifier = Self::new();
        if config.dingtalk.enabled {
            notifier.add_sender(DingTalkSender::new(DingTalkConfig::from_settings(
                &config.dingtalk,
            )));
        }
        if config.telegram.enabled {
            notifier.add_sender(TelegramSender::new(TelegramConfig::from_settings(
                &config.telegram,
            )));
        }
        notifier
    }

    /// 알림 전송기를 추가합니다.
    pub fn add_sender<S: NotificationSender + 'static>(&mut self, sender: S) {
        self.senders.push(Arc::new(sender));
    }

    /// 공유 전송기를 추가합니다.
    pub fn with_sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.senders.push(sender);
        self
    }

    /// 활성화된 전송기 이름 목록.
    pub fn channels(&self) -> Vec<&str> {
        self.senders
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name())
            .collect()
    }

    /// 활성화된 모든 전송기를 통해 알림을 전송합니다.
    pub async fn notify(&self, notification: &Notification) {
        for sender in self.senders.iter().filter(|s| s.is_enabled()) {
            match sender.send(notification).await {
                Ok(()) => debug!(channel = sender.name(), kind = notification.event.kind(), "알림 전송"),
                Err(e) => warn!(channel = sender.name(), error = %e, "알림 전송 실패"),
            }
        }
    }

    /// 대출 알림.
    pub async fn notify_borrow(
        &self,
        symbol: &str,
        currency: &str,
        amount: Decimal,
        borrow_order_id: &str,
    ) {
        self.notify(&Notification::new(NotificationEvent::Borrow {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            amount,
            borrow_order_id: borrow_order_id.to_string(),
        }))
        .await
    }

    /// 시장가 주문 알림.
    pub async fn notify_trade(
        &self,
        symbol: &str,
        side: &str,
        currency: &str,
        amount: Decimal,
        order_id: &str,
        fill: Option<TradeFill>,
    ) {
        self.notify(&Notification::new(NotificationEvent::Trade {
            symbol: symbol.to_string(),
            side: side.to_lowercase(),
            currency: currency.to_string(),
            amount,
            order_id: order_id.to_string(),
            fill,
        }))
        .await
    }

    /// 상환 알림.
    pub async fn notify_repay(
        &self,
        symbol: &str,
        currency: &str,
        amount: Decimal,
        borrow_order_id: &str,
    ) {
        self.notify(&Notification::new(NotificationEvent::Repay {
            symbol: symbol.to_string(),
            currency: currency.to_string(),
            amount,
            borrow_order_id: borrow_order_id.to_string(),
        }))
        .await
    }

    /// 주기적 상태 보고.
    pub async fn notify_health(
        &self,
        symbol: &str,
        position: &str,
        last_signal: &str,
        balances: Vec<CurrencySummary>,
    ) {
        self.notify(
            &Notification::new(NotificationEvent::HealthReport {
                symbol: symbol.to_string(),
                position: position.to_string(),
                last_signal: last_signal.to_string(),
                balances,
            })
            .with_priority(NotificationPriority::Low),
        )
        .await
    }
}
