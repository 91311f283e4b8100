//! Bybit 거래소 커넥터.
//!
//! Bybit v5 통합 REST API 중 체결 내역, 펀딩비, 현재가, 코인 잔고 조회만 구현합니다.
//! 메인넷과 테스트넷 모두 지원하며, 테스트를 위해 기본 URL을 재정의할 수 있습니다.
//!
//! 모든 응답은 `{retCode, retMsg, result}` 봉투로 감싸져 있으며,
//! `result`는 타입이 지정된 구조체로 엄격하게 디코딩합니다.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use histrade_core::{CoinBalance, ExchangeSettings, Execution, FundingRate, Side, TimestampMs};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

use crate::traits::{AccountGateway, ExchangeResult, ExecutionSource};
use crate::ExchangeError;

type HmacSha256 = Hmac<Sha256>;

/// 메인넷 REST URL.
pub const MAINNET_URL: &str = "https://api.bybit.com";
/// 테스트넷 REST URL.
pub const TESTNET_URL: &str = "https://api-testnet.bybit.com";

// ============================================================================
// 설정
// ============================================================================

/// Bybit 클라이언트 설정.
///
/// # 보안
/// - `api_secret`은 `SecretString`으로 보관합니다.
/// - `Debug` 구현은 API 키를 마스킹합니다.
pub struct BybitConfig {
    /// API 키 (공개 엔드포인트만 사용할 경우 없음)
    pub api_key: Option<String>,
    /// API 시크릿
    pub api_secret: Option<SecretString>,
    /// 테스트넷 사용
    pub testnet: bool,
    /// REST 기본 URL 재정의
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 수신 윈도우 (밀리초)
    pub recv_window: u64,
    /// 체결 조회 카테고리
    pub category: String,
}

impl fmt::Debug for BybitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = match &self.api_key {
            Some(key) if key.len() > 8 => format!("{}...{}", &key[..4], &key[key.len() - 4..]),
            Some(_) => "***REDACTED***".to_string(),
            None => "<none>".to_string(),
        };

        f.debug_struct("BybitConfig")
            .field("api_key", &masked_key)
            .field("api_secret", &"***REDACTED***")
            .field("testnet", &self.testnet)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("recv_window", &self.recv_window)
            .field("category", &self.category)
            .finish()
    }
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            testnet: false,
            base_url: None,
            timeout_secs: 30,
            recv_window: 5000,
            category: "spot".to_string(),
        }
    }
}

impl BybitConfig {
    /// 새 설정 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_secret: Some(SecretString::from(api_secret.into())),
            ..Default::default()
        }
    }

    /// 테스트넷 사용.
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// REST 기본 URL 재정의.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// 환경 변수에서 생성.
    ///
    /// `BYBIT_TESTNET=true`이면 `BYBIT_TESTNET_API_KEY`/`BYBIT_TESTNET_API_SECRET`을,
    /// 아니면 `BYBIT_API_KEY`/`BYBIT_API_SECRET`을 읽습니다. 키가 없어도 공개
    /// 엔드포인트용 설정은 생성됩니다.
    pub fn from_env() -> Self {
        let testnet = std::env::var("BYBIT_TESTNET")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let (key_var, secret_var) = if testnet {
            ("BYBIT_TESTNET_API_KEY", "BYBIT_TESTNET_API_SECRET")
        } else {
            ("BYBIT_API_KEY", "BYBIT_API_SECRET")
        };

        Self {
            api_key: std::env::var(key_var).ok().filter(|v| !v.is_empty()),
            api_secret: std::env::var(secret_var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            testnet,
            ..Default::default()
        }
    }

    /// 애플리케이션 설정과 환경 변수 자격증명을 결합합니다.
    pub fn from_settings(settings: &ExchangeSettings) -> Self {
        let env = Self::from_env();
        Self {
            testnet: settings.testnet || env.testnet,
            base_url: settings.base_url.clone(),
            timeout_secs: settings.timeout_secs,
            recv_window: settings.recv_window_ms,
            category: settings.category.clone(),
            ..env
        }
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/'),
            None if self.testnet => TESTNET_URL,
            None => MAINNET_URL,
        }
    }

    /// 서명 요청에 필요한 자격증명이 있는지 확인.
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }
}

// ============================================================================
// Bybit API 응답 타입
// ============================================================================

/// 공통 응답 봉투. `result`는 성공 여부 확인 후 별도로 디코딩합니다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitEnvelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BybitList<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitExecution {
    symbol: String,
    side: String,
    exec_price: String,
    exec_qty: String,
    exec_time: String,
    order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitFundingRate {
    symbol: String,
    funding_rate: String,
    funding_rate_timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    last_price: String,
}

#[derive(Debug, Deserialize)]
struct BybitCoinsBalance {
    #[serde(default = "Vec::new")]
    balance: Vec<BybitCoinBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitCoinBalance {
    coin: String,
    wallet_balance: String,
    transfer_balance: String,
    #[serde(default)]
    locked: Option<String>,
}

// ============================================================================
// Bybit 클라이언트
// ============================================================================

/// Bybit 거래소 클라이언트.
///
/// 한 번 생성하여 수집기와 facade에 공유합니다. 내부 상태가 없으므로
/// 동시 호출에 안전합니다.
pub struct BybitClient {
    config: BybitConfig,
    client: Client,
}

impl BybitClient {
    /// 새 Bybit 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::TransientNetwork`를 반환합니다.
    pub fn new(config: BybitConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::TransientNetwork(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// 환경 변수에서 생성.
    pub fn from_env() -> Result<Self, ExchangeError> {
        Self::new(BybitConfig::from_env())
    }

    /// 클라이언트 설정.
    pub fn config(&self) -> &BybitConfig {
        &self.config
    }

    /// 서명 문자열 `timestamp + api_key + recv_window + query`의 HMAC-SHA256 hex.
    fn sign(&self, timestamp: i64, query: &str) -> ExchangeResult<String> {
        let (api_key, secret) = match (&self.config.api_key, &self.config.api_secret) {
            (Some(key), Some(secret)) => (key, secret),
            _ => return Err(ExchangeError::MissingCredentials),
        };

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| ExchangeError::MissingCredentials)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(api_key.as_bytes());
        mac.update(self.config.recv_window.to_string().as_bytes());
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 엔드포인트 URL 생성. 파라미터 값은 퍼센트 인코딩됩니다.
    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> ExchangeResult<Url> {
        let base = format!("{}{}", self.config.rest_base_url(), endpoint);
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params.iter().map(|(k, v)| (*k, v.as_str())))
        };
        url.map_err(|e| ExchangeError::InvalidRequest(format!("{}: {}", base, e)))
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = self.endpoint_url(endpoint, params)?;

        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// 서명된 API 요청 (인증 필요).
    async fn signed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = self.endpoint_url(endpoint, params)?;
        let timestamp = Utc::now().timestamp_millis();
        // 서명 대상은 실제로 전송되는 인코딩된 쿼리 문자열
        let signature = self.sign(timestamp, url.query().unwrap_or(""))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ExchangeError::MissingCredentials)?;

        debug!("GET (signed) {}", endpoint);

        let response = self
            .client
            .get(url)
            .header("X-BAPI-API-KEY", api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.config.recv_window.to_string())
            .header("X-BAPI-SIGN", signature)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    ///
    /// HTTP 실패와 `retCode != 0`은 `Upstream`, 디코딩 실패는 `MalformedResponse`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::TransientNetwork(e.to_string()))?;

        let envelope = match serde_json::from_str::<BybitEnvelope>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ExchangeError::Upstream {
                    code: i64::from(status.as_u16()),
                    message: body,
                });
            }
            Err(e) => {
                error!("Failed to parse response: {} - Body: {}", e, body);
                return Err(ExchangeError::MalformedResponse(e.to_string()));
            }
        };

        if envelope.ret_code != 0 {
            return Err(ExchangeError::Upstream {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }
        if !status.is_success() {
            return Err(ExchangeError::Upstream {
                code: i64::from(status.as_u16()),
                message: envelope.ret_msg,
            });
        }

        serde_json::from_value(envelope.result).map_err(|e| {
            error!("Failed to decode result: {} - Body: {}", e, body);
            ExchangeError::MalformedResponse(e.to_string())
        })
    }

    fn parse_decimal(field: &str, s: &str) -> ExchangeResult<Decimal> {
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map_err(|_| ExchangeError::MalformedResponse(format!("{}: '{}'", field, s)))
    }

    fn parse_timestamp(field: &str, s: &str) -> ExchangeResult<TimestampMs> {
        s.parse::<TimestampMs>()
            .map_err(|_| ExchangeError::MalformedResponse(format!("{}: '{}'", field, s)))
    }

    /// 응답 행을 도메인 체결로 변환. 가격 < 0 또는 수량 <= 0이면 거부합니다.
    fn to_execution(row: BybitExecution) -> ExchangeResult<Execution> {
        let side = Side::from_str(&row.side).map_err(ExchangeError::MalformedResponse)?;
        let price = Self::parse_decimal("execPrice", &row.exec_price)?;
        let quantity = Self::parse_decimal("execQty", &row.exec_qty)?;
        let execution_time_ms = Self::parse_timestamp("execTime", &row.exec_time)?;

        if price < Decimal::ZERO {
            return Err(ExchangeError::MalformedResponse(format!(
                "negative execPrice {} for order {}",
                price, row.order_id
            )));
        }
        if quantity <= Decimal::ZERO {
            return Err(ExchangeError::MalformedResponse(format!(
                "non-positive execQty {} for order {}",
                quantity, row.order_id
            )));
        }
        if row.order_id.is_empty() {
            return Err(ExchangeError::MalformedResponse("empty orderId".to_string()));
        }

        Ok(Execution::new(
            row.symbol,
            side,
            price,
            quantity,
            execution_time_ms,
            row.order_id,
        ))
    }

    async fn executions(&self, params: &[(&str, String)]) -> ExchangeResult<Vec<Execution>> {
        let result: BybitList<BybitExecution> =
            self.signed_get("/v5/execution/list", params).await?;

        result.list.into_iter().map(Self::to_execution).collect()
    }
}

#[async_trait]
impl ExecutionSource for BybitClient {
    async fn fetch_executions(
        &self,
        symbol: &str,
        window_start: TimestampMs,
        window_end: TimestampMs,
        page_limit: u32,
    ) -> ExchangeResult<Vec<Execution>> {
        // endTime은 포함 경계이므로 마지막 밀리초까지만 요청
        let params = [
            ("category", self.config.category.clone()),
            ("symbol", symbol.to_string()),
            ("startTime", window_start.to_string()),
            ("endTime", (window_end - 1).to_string()),
            ("limit", page_limit.to_string()),
        ];

        let executions = self.executions(&params).await?;
        debug!(
            symbol,
            window_start,
            window_end,
            returned = executions.len(),
            "Fetched executions"
        );
        Ok(executions)
    }
}

#[async_trait]
impl AccountGateway for BybitClient {
    async fn latest_funding_rate(&self, symbol: &str) -> ExchangeResult<Option<FundingRate>> {
        let params = [
            ("category", "linear".to_string()),
            ("symbol", symbol.to_string()),
            ("limit", "1".to_string()),
        ];

        let result: BybitList<BybitFundingRate> = self
            .public_get("/v5/market/funding/history", &params)
            .await?;

        let Some(latest) = result.list.into_iter().next() else {
            return Ok(None);
        };

        let rate = Self::parse_decimal("fundingRate", &latest.funding_rate)?;
        Ok(Some(FundingRate {
            symbol: latest.symbol,
            funding_rate_pct: rate * Decimal::ONE_HUNDRED,
            timestamp: Self::parse_timestamp(
                "fundingRateTimestamp",
                &latest.funding_rate_timestamp,
            )?,
        }))
    }

    async fn recent_executions(&self, symbol: &str, limit: u32) -> ExchangeResult<Vec<Execution>> {
        let params = [
            ("category", self.config.category.clone()),
            ("symbol", symbol.to_string()),
            ("limit", limit.to_string()),
        ];

        self.executions(&params).await
    }

    async fn last_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
        let params = [
            ("category", "spot".to_string()),
            ("symbol", symbol.to_string()),
        ];

        let result: BybitList<BybitTicker> =
            self.public_get("/v5/market/tickers", &params).await?;

        let ticker = result.list.into_iter().next().ok_or_else(|| {
            ExchangeError::MalformedResponse(format!("no ticker for {}", symbol))
        })?;
        Self::parse_decimal("lastPrice", &ticker.last_price)
    }

    async fn coin_balances(&self, coins: &[String]) -> ExchangeResult<Vec<CoinBalance>> {
        let params = [
            ("accountType", "UNIFIED".to_string()),
            ("coin", coins.join(",")),
        ];

        let result: BybitCoinsBalance = self
            .signed_get("/v5/asset/transfer/query-account-coins-balance", &params)
            .await?;

        result
            .balance
            .into_iter()
            .map(|row| {
                let locked = match row.locked.as_deref() {
                    Some(s) if !s.is_empty() => Self::parse_decimal("locked", s)?,
                    _ => Decimal::ZERO,
                };
                Ok(CoinBalance {
                    wallet_balance: Self::parse_decimal("walletBalance", &row.wallet_balance)?,
                    transfer_balance: Self::parse_decimal(
                        "transferBalance",
                        &row.transfer_balance,
                    )?,
                    locked,
                    coin: row.coin,
                })
            })
            .collect()
    }
}
