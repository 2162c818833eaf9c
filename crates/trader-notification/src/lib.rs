//! # Trader Notification
//!
//! 계좌 변경(대출, 주문, 상환)과 상태 보고를 운영자 채널로 전송합니다.
//!
//! 지원 채널:
//! - DingTalk (그룹 로봇)
//! - Telegram

pub mod dingtalk;
pub mod notifier;
pub mod telegram;
pub mod types;

pub use dingtalk::{DingTalkConfig, DingTalkSender, DINGTALK_API_URL};
pub use notifier::Notifier;
pub use telegram::{TelegramConfig, TelegramSender, TELEGRAM_API_URL};
pub use types::*;
