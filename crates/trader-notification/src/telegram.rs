//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API `sendMessage`로 계좌 변경 알림과 상태 보고를 전송합니다.

use crate::types::{
    Notification, NotificationError, NotificationEvent, NotificationPriority, NotificationResult,
    NotificationSender,
};
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, error, info, warn};

/// 기본 API URL.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// 텔레그램 알림 전송 설정.
#[derive(Clone)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: String,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// API 기본 URL
    pub base_url: String,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"***REDACTED***")
            .field("chat_id", &self.chat_id)
            .field("enabled", &self.enabled)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
            base_url: TELEGRAM_API_URL.to_string(),
        }
    }

    /// API 기본 URL을 변경합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 애플리케이션 설정의 `notifications.telegram` 섹션에서 생성합니다.
    pub fn from_settings(settings: &trader_core::TelegramConfig) -> Self {
        let mut config = Self::new(settings.bot_token.clone(), settings.chat_id.clone());
        config.enabled = settings.enabled;
        config
    }

    /// 환경 변수에서 설정을 생성합니다.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            enabled,
            ..Self::new(bot_token, chat_id)
        })
    }
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        TelegramConfig::from_env().map(Self::new)
    }

    /// 알림을 텔레그램 메시지(HTML)로 포맷합니다.
    fn format_message(&self, notification: &Notification) -> String {
        let emoji = match (&notification.event, notification.priority) {
            (_, NotificationPriority::High) => "⚠️",
            (NotificationEvent::Borrow { .. }, _) => "🏦",
            (NotificationEvent::Repay { .. }, _) => "💸",
            (NotificationEvent::Trade { side, .. }, _) if side == "buy" => "🟢",
            (NotificationEvent::Trade { .. }, _) => "🔴",
            (NotificationEvent::HealthReport { .. }, _) => "📊",
            (NotificationEvent::Custom { .. }, _) => "ℹ️",
        };

        let body = escape_html(&notification.render_text());
        format!("{emoji} <b>{}</b>\n<pre>{body}</pre>", notification.event.kind())
    }

    /// 텔레그램에 원시 메시지를 전송합니다.
    async fn send_message(&self, text: &str) -> NotificationResult<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.base_url, self.config.bot_token
        );

        let params = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        debug!(chat_id = %self.config.chat_id, "Sending Telegram message");

        let response = self.client.post(&url).json(&params).send().await?;

        if response.status().is_success() {
            info!("Telegram notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Telegram rate limited");
                return Err(NotificationError::RateLimited(60));
            }

            error!("Failed to send Telegram message: {} - {}", status, body);
            Err(NotificationError::SendFailed(format!(
                "HTTP {}: {}",
                status, body
            )))
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("Telegram notifications are disabled, skipping");
            return Ok(());
        }

        let message = self.format_message(notification);
        self.send_message(&message).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty() && !self.config.chat_id.is_empty()
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rust_decimal_macros::dec;

    fn trade() -> Notification {
        Notification::new(NotificationEvent::Trade {
            symbol: "btc_usdt".to_string(),
            side: "buy".to_string(),
            currency: "usdt".to_string(),
            amount: dec!(49.9),
            order_id: "1".to_string(),
            fill: None,
        })
    }

    #[test]
    fn test_format_trade() {
        let sender = TelegramSender::new(TelegramConfig::new(
            "test_token".to_string(),
            "123456".to_string(),
        ));

        let message = sender.format_message(&trade());
        assert!(message.starts_with("🟢 <b>buy</b>"));
        assert!(message.contains("수량: 49.9000 USDT"));
    }

    #[tokio::test]
    async fn test_send_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/bottest_token/sendMessage")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "chat_id": "123456",
                "parse_mode": "HTML"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{}}"#)
            .create_async()
            .await;

        let sender = TelegramSender::new(
            TelegramConfig::new("test_token".to_string(), "123456".to_string())
                .with_base_url(server.url()),
        );
        sender.send(&trade()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/bottest_token/sendMessage")
            .with_status(429)
            .with_body(r#"{"ok":false}"#)
            .create_async()
            .await;

        let sender = TelegramSender::new(
            TelegramConfig::new("test_token".to_string(), "123456".to_string())
                .with_base_url(server.url()),
        );
        let err = sender.send(&trade()).await.unwrap_err();
        assert!(matches!(err, NotificationError::RateLimited(60)));
    }
}
