//! 핵심 도메인 에러 타입.

use thiserror::Error;

/// 도메인 계층 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 잘못된 수집 범위 (start >= end, step <= 0 등)
    #[error("잘못된 범위: {0}")]
    InvalidRange(String),

    /// 잘못된 입력 (날짜 형식, 심볼 등)
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
