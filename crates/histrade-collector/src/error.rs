//! 에러 타입 정의.

use histrade_core::{CoreError, RangeId};
use histrade_exchange::ExchangeError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 잘못된 수집 범위 또는 윈도우 크기 (재시도 불가)
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// 윈도우 조회 실패
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// 체크포인트 읽기/쓰기 실패
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// 윈도우 사이에서 취소됨 (이전 윈도우는 저장되어 있음)
    #[error("Collection cancelled: {range_id}")]
    Cancelled { range_id: RangeId },
}

impl CollectorError {
    /// 동일 인자로 재실행하면 복구될 수 있는 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Exchange(e) => e.is_transient(),
            Self::Cancelled { .. } => true,
            _ => false,
        }
    }

    /// 메트릭 레이블용 에러 종류.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRange(_) => "invalid_range",
            Self::Exchange(e) => e.kind(),
            Self::Persistence(_) => "persistence",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidRange(msg) | CoreError::InvalidInput(msg) => Self::InvalidRange(msg),
            CoreError::Config(msg) => Self::InvalidRange(format!("config: {}", msg)),
        }
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Result 타입 별칭
pub type CollectorResult<T> = std::result::Result<T, CollectorError>;
