//! DingTalk 로봇 알림 서비스.
//!
//! 그룹 로봇 웹훅(`/robot/send?access_token=…`)으로 텍스트 메시지를 전송합니다.

use crate::types::{Notification, NotificationError, NotificationResult, NotificationSender};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 기본 API URL.
pub const DINGTALK_API_URL: &str = "https://oapi.dingtalk.com";

/// DingTalk 알림 전송 설정.
#[derive(Clone)]
pub struct DingTalkConfig {
    /// 로봇 액세스 토큰
    pub access_token: String,
    /// API 기본 URL
    pub base_url: String,
    /// 멘션할 휴대폰 번호
    pub at_mobiles: Vec<String>,
    /// 전체 멘션 여부
    pub at_all: bool,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// 타임아웃/연결 실패 시 최대 시도 횟수
    pub max_attempts: u32,
}

impl fmt::Debug for DingTalkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DingTalkConfig")
            .field("access_token", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("at_mobiles", &self.at_mobiles)
            .field("at_all", &self.at_all)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl DingTalkConfig {
    /// 새 DingTalk 설정을 생성합니다.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DINGTALK_API_URL.to_string(),
            at_mobiles: Vec::new(),
            at_all: false,
            enabled: true,
            max_attempts: 3,
        }
    }

    /// API 기본 URL을 변경합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 전체 멘션 여부를 설정합니다.
    pub fn with_at_all(mut self, at_all: bool) -> Self {
        self.at_all = at_all;
        self
    }

    /// 애플리케이션 설정의 `notifications.dingtalk` 섹션에서 생성합니다.
    pub fn from_settings(settings: &trader_core::DingTalkConfig) -> Self {
        let mut config = Self::new(settings.access_token.clone())
            .with_base_url(settings.base_url.clone())
            .with_at_all(settings.at_all);
        config.enabled = settings.enabled;
        config
    }

    /// 환경 변수(`DINGTALK_ACCESS_TOKEN`)에서 설정을 생성합니다.
    pub fn from_env() -> Option<Self> {
        let access_token = std::env::var("DINGTALK_ACCESS_TOKEN").ok()?;
        Some(Self::new(access_token))
    }
}

#[derive(Debug, Deserialize)]
struct DingTalkResponse {
    errcode: i64,
    errmsg: String,
}

/// DingTalk 로봇 알림 전송기.
pub struct DingTalkSender {
    config: DingTalkConfig,
    client: reqwest::Client,
}

impl DingTalkSender {
    /// 새 DingTalk 전송기를 생성합니다.
    pub fn new(config: DingTalkConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// 환경 변수에서 전송기를 생성합니다.
    pub fn from_env() -> Option<Self> {
        DingTalkConfig::from_env().map(Self::new)
    }

    /// 텍스트 메시지를 전송합니다.
    ///
    /// 타임아웃 또는 연결 실패는 `max_attempts`까지 재시도합니다.
    pub async fn push(&self, content: &str) -> NotificationResult<()> {
        let url = format!("{}/robot/send", self.config.base_url);
        let body = serde_json::json!({
            "msgtype": "text",
            "text": { "content": content },
            "at": {
                "atMobiles": self.config.at_mobiles,
                "isAtAll": self.config.at_all,
            },
        });

        let mut attempt = 1;
        let response = loop {
            let result = self
                .client
                .post(&url)
                .query(&[("access_token", self.config.access_token.as_str())])
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) => break response,
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.config.max_attempts => {
                    warn!(attempt, error = %e, "DingTalk 전송 실패, 재시도");
                    attempt += 1;
                }
                Err(e) => return Err(NotificationError::NetworkError(e)),
            }
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(NotificationError::RateLimited(60));
        }

        let text = response.text().await?;
        let parsed: DingTalkResponse = serde_json::from_str(&text).map_err(|_| {
            NotificationError::SendFailed(format!("HTTP {}: {}", status, text))
        })?;

        if parsed.errcode != 0 {
            return Err(NotificationError::SendFailed(format!(
                "{}: {}",
                parsed.errcode, parsed.errmsg
            )));
        }

        debug!(errmsg = %parsed.errmsg, "DingTalk 응답");
        info!("DingTalk notification sent successfully");
        Ok(())
    }
}

#[async_trait]
impl NotificationSender for DingTalkSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        if !self.is_enabled() {
            debug!("DingTalk notifications are disabled, skipping");
            return Ok(());
        }

        self.push(&notification.render_text()).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.access_token.is_empty()
    }

    fn name(&self) -> &str {
        "dingtalk"
    }
}
