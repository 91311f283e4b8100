//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//!
//! # 상태 코드 매핑
//!
//! - 잘못된 날짜/범위/파일 이름 → 400
//! - 존재하지 않는 데이터 파일 → 404
//! - 수집 실패 (네트워크, 거래소 거부, 응답 형식, 저장, 취소) → 500

use axum::http::StatusCode;
use axum::Json;
use histrade_collector::CollectorError;
use histrade_exchange::ExchangeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "UPSTREAM_ERROR",
///   "message": "Upstream error 10001: params error",
///   "details": {"upstream_code": 10001},
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_DATE", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러 (상태 코드 + JSON 본문).
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// 상태 코드와 에러 코드로 핸들러 에러를 만듭니다.
pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiErrorResponse::new(code, message)))
}

/// 거래소 에러를 500 응답으로 변환합니다.
pub fn exchange_error(err: &ExchangeError) -> ApiError {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let message = err.to_string();
    match err {
        ExchangeError::TransientNetwork(_) => api_error(status, "NETWORK_ERROR", message),
        ExchangeError::Upstream { code, .. } => (
            status,
            Json(ApiErrorResponse::with_details(
                "UPSTREAM_ERROR",
                message,
                serde_json::json!({ "upstream_code": code }),
            )),
        ),
        ExchangeError::MalformedResponse(_) => api_error(status, "MALFORMED_RESPONSE", message),
        ExchangeError::MissingCredentials => api_error(status, "MISSING_CREDENTIALS", message),
        ExchangeError::InvalidRequest(_) => api_error(status, "INVALID_REQUEST", message),
    }
}

/// 수집기 에러를 응답으로 변환합니다.
pub fn collector_error(err: &CollectorError) -> ApiError {
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    match err {
        CollectorError::InvalidRange(_) => {
            api_error(StatusCode::BAD_REQUEST, "INVALID_RANGE", err.to_string())
        }
        CollectorError::Exchange(e) => exchange_error(e),
        CollectorError::Persistence(_) => api_error(status, "PERSISTENCE_ERROR", err.to_string()),
        CollectorError::Cancelled { .. } => api_error(status, "CANCELLED", err.to_string()),
    }
}
