//! Huobi 마진 거래소 커넥터.
//!
//! 격리 마진 계좌용 REST API 구현.
//! 서명 방식: HMAC-SHA256(Base64), `METHOD\nhost\npath\n정렬된 쿼리`.

use crate::traits::{ExchangeResult, MarginExchange};
use crate::ExchangeError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use trader_core::{
    BalanceBucket, BalanceEntry, BorrowOrder, BorrowState, ExchangeConfig, OpenOrder, OrderDetail,
    OrderState, Side, Symbol, SymbolLimits, SymbolSpec, Ticker,
};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// 기본 REST API URL.
pub const HUOBI_REST_URL: &str = "https://api.huobi.pro";

/// 전송 계층 최대 시도 횟수.
const MAX_ATTEMPTS: u32 = 3;

// ============================================================================
// 설정
// ============================================================================

/// Huobi 클라이언트 설정.
///
/// `Debug` 구현은 API 키를 마스킹하고 시크릿을 출력하지 않습니다.
#[derive(Clone)]
pub struct HuobiConfig {
    /// API 키 (AccessKeyId)
    pub api_key: String,
    /// API 시크릿
    pub api_secret: SecretString,
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 전송 실패 시 최대 시도 횟수
    pub max_attempts: u32,
}

impl fmt::Debug for HuobiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = if self.api_key.chars().count() > 8 {
            let head: String = self.api_key.chars().take(4).collect();
            let mut tail: Vec<char> = self.api_key.chars().rev().take(4).collect();
            tail.reverse();
            format!("{}...{}", head, tail.into_iter().collect::<String>())
        } else {
            "***REDACTED***".to_string()
        };

        f.debug_struct("HuobiConfig")
            .field("api_key", &masked_key)
            .field("api_secret", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl HuobiConfig {
    /// 새 설정 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::new(api_secret.into().into()),
            base_url: HUOBI_REST_URL.to_string(),
            timeout_secs: 10,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// REST API 기본 URL 변경 (테스트 서버 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 요청 타임아웃 변경.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 애플리케이션 설정의 `exchange` 섹션에서 생성.
    pub fn from_app_config(config: &ExchangeConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_secret.clone())
            .with_base_url(config.rest_base_url.clone())
            .with_timeout_secs(config.timeout_secs)
    }

    /// 환경 변수(`HUOBI_API_KEY`, `HUOBI_API_SECRET`)에서 생성.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("HUOBI_API_KEY").ok()?;
        let api_secret = std::env::var("HUOBI_API_SECRET").ok()?;
        Some(Self::new(api_key, api_secret))
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// 모든 응답에 공통인 상태 필드.
#[derive(Debug, Deserialize)]
struct HuobiStatus {
    status: String,
    #[serde(rename = "err-code")]
    err_code: Option<String>,
    #[serde(rename = "err-msg")]
    err_msg: Option<String>,
}

/// 응답 본문. 시장 데이터 API는 `data` 대신 `tick`을 사용합니다.
#[derive(Debug, Deserialize)]
struct HuobiEnvelope<T> {
    #[serde(alias = "tick")]
    data: T,
}

/// 숫자 또는 문자열로 오는 ID.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HuobiId {
    Number(u64),
    Text(String),
}

impl HuobiId {
    fn into_string(self) -> String {
        match self {
            HuobiId::Number(n) => n.to_string(),
            HuobiId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HuobiMergedTicker {
    open: Decimal,
    close: Decimal,
    bid: (Decimal, Decimal),
    ask: (Decimal, Decimal),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HuobiSymbol {
    base_currency: String,
    quote_currency: String,
    price_precision: u32,
    amount_precision: u32,
    value_precision: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HuobiExchangeLimits {
    buy_market_must_greater_than: Decimal,
    buy_market_must_less_than: Decimal,
    sell_market_must_greater_than: Decimal,
    sell_market_must_less_than: Decimal,
}

#[derive(Debug, Deserialize)]
struct HuobiMarginAccount {
    id: u64,
    list: Vec<HuobiBalance>,
}

#[derive(Debug, Deserialize)]
struct HuobiBalance {
    currency: String,
    #[serde(rename = "type")]
    bucket: String,
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct HuobiOpenOrder {
    id: u64,
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HuobiLoanOrder {
    id: u64,
    currency: String,
    state: String,
    loan_balance: Decimal,
    interest_balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct HuobiOrderDetail {
    id: u64,
    state: String,
    #[serde(rename = "field-amount", alias = "filled-amount")]
    filled_amount: Decimal,
    #[serde(rename = "field-cash-amount", alias = "filled-cash-amount")]
    filled_cash_amount: Decimal,
    #[serde(rename = "field-fees", alias = "filled-fees")]
    filled_fees: Decimal,
}

// ============================================================================
// Huobi 클라이언트
// ============================================================================

/// Huobi 마진 거래소 클라이언트.
pub struct HuobiClient {
    config: HuobiConfig,
    client: Client,
    host: String,
}

impl HuobiClient {
    /// 새 Huobi 클라이언트 생성.
    ///
    /// # Errors
    /// 기본 URL이 잘못되었거나 HTTP 클라이언트 생성에 실패하면 에러를 반환합니다.
    pub fn new(config: HuobiConfig) -> ExchangeResult<Self> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| ExchangeError::Unknown(format!("잘못된 기본 URL {}: {}", config.base_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| ExchangeError::Unknown(format!("기본 URL에 호스트가 없음: {}", config.base_url)))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            host,
        })
    }

    /// 환경 변수에서 생성.
    pub fn from_env() -> Option<Self> {
        HuobiConfig::from_env().and_then(|config| Self::new(config).ok())
    }

    /// HMAC-SHA256 서명 후 Base64 인코딩.
    fn sign(&self, payload: &str) -> ExchangeResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::Unauthorized(format!("잘못된 API 시크릿: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// 인증 파라미터를 더해 정렬·인코딩한 뒤 서명을 붙인 쿼리 문자열을 만듭니다.
    fn signed_query(
        &self,
        method: &Method,
        path: &str,
        params: &[(&str, String)],
        timestamp: &str,
    ) -> ExchangeResult<String> {
        let mut all_params: Vec<(&str, String)> = vec![
            ("AccessKeyId", self.config.api_key.clone()),
            ("SignatureMethod", "HmacSHA256".to_string()),
            ("SignatureVersion", "2".to_string()),
            ("Timestamp", timestamp.to_string()),
        ];
        all_params.extend(params.iter().cloned());
        all_params.sort_by(|a, b| a.0.cmp(b.0));

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(all_params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();

        let payload = format!("{}\n{}\n{}\n{}", method.as_str(), self.host, path, query);
        let signature = self.sign(&payload)?;

        let signature_param = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("Signature", &signature)
            .finish();

        Ok(format!("{}&{}", query, signature_param))
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        let url = if query.is_empty() {
            format!("{}{}", self.config.base_url, path)
        } else {
            format!("{}{}?{}", self.config.base_url, path, query)
        };

        self.send(Method::GET, path, &url, None).await
    }

    /// 서명된 GET 요청. 파라미터는 쿼리 문자열로 전달됩니다.
    async fn signed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let timestamp = Self::timestamp();
        let query = self.signed_query(&Method::GET, path, params, &timestamp)?;
        let url = format!("{}{}?{}", self.config.base_url, path, query);

        self.send(Method::GET, path, &url, None).await
    }

    /// 서명된 POST 요청. 파라미터는 JSON 본문으로 전달됩니다.
    async fn signed_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let timestamp = Self::timestamp();
        let query = self.signed_query(&Method::POST, path, &[], &timestamp)?;
        let url = format!("{}{}?{}", self.config.base_url, path, query);

        let body: serde_json::Map<String, serde_json::Value> = body
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
            .collect();

        self.send(Method::POST, path, &url, Some(serde_json::Value::Object(body)))
            .await
    }

    /// 요청을 보내고 전송 실패 시 재시도합니다.
    ///
    /// GET은 타임아웃/연결 실패 시, POST는 요청이 전송되지 않은 연결 실패 시에만 재시도합니다.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> ExchangeResult<T> {
        let mut attempt = 1;
        loop {
            debug!(method = %method, path, attempt, "Huobi 요청");

            let mut request = self.client.request(method.clone(), url);
            request = match &body {
                Some(json) => request.json(json),
                None => request.header("Content-Type", "application/x-www-form-urlencoded"),
            };

            match request.send().await {
                Ok(response) => return self.handle_response(response).await,
                Err(err) => {
                    // 주문 POST는 요청이 도달하지 않은 연결 실패만 재시도
                    let resendable = method == Method::GET || err.is_connect();
                    let err = ExchangeError::from(err);
                    let retry = resendable && err.is_retryable();
                    if !retry || attempt >= self.config.max_attempts {
                        return Err(err);
                    }
                    warn!(path, attempt, error = %err, "Huobi 전송 실패, 재시도");
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }

    /// API 응답 처리.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let http_status = response.status();
        let body = response.text().await?;

        let status: HuobiStatus = match serde_json::from_str(&body) {
            Ok(status) => status,
            Err(e) if http_status.is_success() => {
                return Err(ExchangeError::ParseError(format!("{}: {}", e, body)))
            }
            Err(_) => {
                return Err(ExchangeError::Api {
                    code: http_status.as_u16().to_string(),
                    message: body,
                })
            }
        };

        if status.status != "ok" {
            return Err(ExchangeError::from_venue(
                status.err_code.as_deref().unwrap_or("unknown"),
                status.err_msg.as_deref().unwrap_or(""),
            ));
        }

        let envelope: HuobiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %body, "Huobi 응답 파싱 실패");
            ExchangeError::ParseError(e.to_string())
        })?;

        Ok(envelope.data)
    }

    /// `2006-01-02T15:04:05` 형식의 UTC 타임스탬프.
    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    /// 심볼의 마진 계좌 (계좌 ID와 잔고 목록).
    async fn margin_account(&self, symbol: &Symbol) -> ExchangeResult<HuobiMarginAccount> {
        let accounts: Vec<HuobiMarginAccount> = self
            .signed_get(
                "/v1/margin/accounts/balance",
                &[("symbol", symbol.venue_symbol())],
            )
            .await?;

        accounts
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Api {
                code: "no-margin-account".to_string(),
                message: format!("margin account for {} not found", symbol),
            })
    }

    /// 수량을 거래소 문자열 형식으로 변환.
    fn format_amount(amount: Decimal) -> String {
        amount.normalize().to_string()
    }
}

fn parse_state<T: std::str::FromStr<Err = String>>(value: &str) -> ExchangeResult<T> {
    value.parse().map_err(ExchangeError::ParseError)
}

#[async_trait]
impl MarginExchange for HuobiClient {
    fn name(&self) -> &str {
        "huobi"
    }

    async fn get_ticker(&self, symbol: &Symbol) -> ExchangeResult<Ticker> {
        let tick: HuobiMergedTicker = self
            .public_get("/market/detail/merged", &[("symbol", symbol.venue_symbol())])
            .await?;

        Ok(Ticker::new(
            symbol.clone(),
            tick.bid.0,
            tick.ask.0,
            tick.close,
            tick.open,
            Utc::now(),
        ))
    }

    async fn get_symbol_spec(&self, symbol: &Symbol) -> ExchangeResult<SymbolSpec> {
        let symbols: Vec<HuobiSymbol> = self.public_get("/v1/common/symbols", &[]).await?;

        let found = symbols
            .into_iter()
            .find(|s| s.base_currency == symbol.base && s.quote_currency == symbol.quote)
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;

        let limits: HuobiExchangeLimits = self
            .public_get("/v1/common/exchange", &[("symbol", symbol.venue_symbol())])
            .await?;

        Ok(SymbolSpec {
            symbol: symbol.clone(),
            price_precision: found.price_precision,
            amount_precision: found.amount_precision,
            value_precision: found.value_precision,
            limits: SymbolLimits {
                buy_min: limits.buy_market_must_greater_than,
                buy_max: limits.buy_market_must_less_than,
                sell_min: limits.sell_market_must_greater_than,
                sell_max: limits.sell_market_must_less_than,
            },
        })
    }

    async fn get_account_carry(&self, symbol: &Symbol) -> ExchangeResult<Vec<BalanceEntry>> {
        let account = self.margin_account(symbol).await?;

        account
            .list
            .into_iter()
            .map(|b| {
                let bucket: BalanceBucket = parse_state(&b.bucket)?;
                Ok(BalanceEntry::new(b.currency, bucket, b.balance))
            })
            .collect()
    }

    async fn get_open_orders(
        &self,
        symbol: &Symbol,
        states: &[OrderState],
    ) -> ExchangeResult<Vec<OpenOrder>> {
        let states = states
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let orders: Vec<HuobiOpenOrder> = self
            .signed_get(
                "/v1/order/orders",
                &[("states", states), ("symbol", symbol.venue_symbol())],
            )
            .await?;

        orders
            .into_iter()
            .map(|o| {
                Ok(OpenOrder {
                    id: o.id.to_string(),
                    state: parse_state(&o.state)?,
                })
            })
            .collect()
    }

    async fn cancel_all_orders(
        &self,
        symbol: &Symbol,
        open_orders: &[OpenOrder],
    ) -> ExchangeResult<()> {
        let mut failures = Vec::new();
        for order in open_orders {
            let path = format!("/v1/order/orders/{}/submitcancel", order.id);
            let result: ExchangeResult<HuobiId> = self.signed_post(&path, &[]).await;
            if let Err(err) = result {
                warn!(symbol = %symbol, order_id = %order.id, error = %err, "주문 취소 실패");
                failures.push((order.id.clone(), err));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExchangeError::Aggregate(failures))
        }
    }

    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: Side,
        amount: Decimal,
    ) -> ExchangeResult<String> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidQuantity(amount.to_string()));
        }

        let account = self.margin_account(symbol).await?;
        let order_type = match side {
            Side::Buy => "buy-market",
            Side::Sell => "sell-market",
        };

        let id: HuobiId = self
            .signed_post(
                "/v1/order/orders/place",
                &[
                    ("account-id", account.id.to_string()),
                    ("amount", Self::format_amount(amount)),
                    ("source", "margin-api".to_string()),
                    ("symbol", symbol.venue_symbol()),
                    ("type", order_type.to_string()),
                ],
            )
            .await?;

        Ok(id.into_string())
    }

    async fn get_order_detail(&self, order_id: &str) -> ExchangeResult<OrderDetail> {
        let path = format!("/v1/order/orders/{}", order_id);
        let detail: HuobiOrderDetail = self.signed_get(&path, &[]).await?;

        Ok(OrderDetail {
            order_id: detail.id.to_string(),
            state: parse_state(&detail.state)?,
            filled_amount: detail.filled_amount,
            filled_cash_amount: detail.filled_cash_amount,
            filled_fees: detail.filled_fees,
        })
    }

    async fn get_borrow_orders(
        &self,
        symbol: &Symbol,
        state: Option<BorrowState>,
    ) -> ExchangeResult<Vec<BorrowOrder>> {
        let mut params = vec![("symbol", symbol.venue_symbol())];
        if let Some(state) = state {
            params.push(("states", state.as_str().to_string()));
        }

        let orders: Vec<HuobiLoanOrder> = self.signed_get("/v1/margin/loan-orders", &params).await?;

        orders
            .into_iter()
            .map(|o| {
                Ok(BorrowOrder {
                    id: o.id.to_string(),
                    currency: o.currency.to_lowercase(),
                    loan_amount: o.loan_balance,
                    interest_amount: o.interest_balance,
                    state: parse_state(&o.state)?,
                })
            })
            .collect()
    }

    async fn borrow(
        &self,
        symbol: &Symbol,
        currency: &str,
        amount: Decimal,
    ) -> ExchangeResult<String> {
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidQuantity(amount.to_string()));
        }

        let id: HuobiId = self
            .signed_post(
                "/v1/margin/orders",
                &[
                    ("amount", Self::format_amount(amount)),
                    ("currency", currency.to_lowercase()),
                    ("symbol", symbol.venue_symbol()),
                ],
            )
            .await?;

        Ok(id.into_string())
    }

    async fn repay(&self, borrow_order_id: &str, amount: Decimal) -> ExchangeResult<()> {
        let path = format!("/v1/margin/orders/{}/repay", borrow_order_id);
        let _: HuobiId = self
            .signed_post(&path, &[("amount", Self::format_amount(amount))])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_query() {
        let config = HuobiConfig::new(
            "e2xxxxxx-99xxxxxx-84xxxxxx-7xxxx",
            "b0xxxxxx-c6xxxxxx-94xxxxxx-dxxxx",
        );
        let client = HuobiClient::new(config).unwrap();

        let query = client
            .signed_query(
                &Method::GET,
                "/v1/margin/accounts/balance",
                &[("symbol", "btcusdt".to_string())],
                "2019-01-02T03:04:05",
            )
            .unwrap();

        assert_eq!(
            query,
            "AccessKeyId=e2xxxxxx-99xxxxxx-84xxxxxx-7xxxx&SignatureMethod=HmacSHA256\
             &SignatureVersion=2&Timestamp=2019-01-02T03%3A04%3A05&symbol=btcusdt\
             &Signature=Z2YhPhE70Xls1sgliaX2mxofsYVwfv3QBwsibDMDGNo%3D"
        );
    }

    #[test]
    fn test_config_debug_masks_secret() {
        let config = HuobiConfig::new("abcd1234efgh5678", "top-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("abcd...5678"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_config_debug_masks_multibyte_key() {
        let config = HuobiConfig::new("키키키키-중간값-끝끝끝끝", "top-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("키키키키...끝끝끝끝"));
        assert!(!debug.contains("중간값"));
    }

    #[test]
    fn test_format_amount() {
        use rust_decimal_macros::dec;
        assert_eq!(HuobiClient::format_amount(dec!(0.01996000)), "0.01996");
        assert_eq!(HuobiClient::format_amount(dec!(50)), "50");
    }
}
