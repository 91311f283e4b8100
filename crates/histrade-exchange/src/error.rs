//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 연결 실패, 타임아웃 등 일시적 네트워크 에러 (재실행으로 복구 가능)
    #[error("Network error: {0}")]
    TransientNetwork(String),

    /// 거래소가 요청을 거부함 (HTTP 실패 또는 retCode != 0)
    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    /// 응답을 기대한 형태로 디코딩할 수 없음
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// 서명 요청에 필요한 API 키가 없음
    #[error("Missing API credentials")]
    MissingCredentials,

    /// 요청 URL을 만들 수 없음 (잘못된 기본 URL 설정 등)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ExchangeError {
    /// 일시적 에러인지 확인.
    ///
    /// 일시적 에러만 동일 인자로 재실행하면 복구될 수 있습니다.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::TransientNetwork(_))
    }

    /// 메트릭/로그용 에러 종류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::TransientNetwork(_) => "network",
            ExchangeError::Upstream { .. } => "upstream",
            ExchangeError::MalformedResponse(_) => "malformed",
            ExchangeError::MissingCredentials => "credentials",
            ExchangeError::InvalidRequest(_) => "request",
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExchangeError::MalformedResponse(err.to_string())
        } else {
            ExchangeError::TransientNetwork(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::MalformedResponse(err.to_string())
    }
}
