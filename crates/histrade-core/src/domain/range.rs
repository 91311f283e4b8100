//! 수집 범위 및 범위 식별자.
//!
//! `CollectionRange`는 하나의 수집 작업을 나타내며, 동일한 심볼과
//! 동일한 `[start, end)` 경계를 가진 범위는 같은 체크포인트를 가리킵니다.
//!
//! `RangeId`는 `{symbol}_{start:YYYYMMDD}_{end:YYYYMMDD}` 형식의 문자열로,
//! 체크포인트 저장 키이자 동시 실행 방지를 위한 잠금 키입니다.
//! 같은 날짜 안에서 시각만 다른 두 범위는 동일한 `RangeId`를 공유합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{format_compact_date, TimestampMs};

/// 체크포인트 파일 확장자.
pub const CHECKPOINT_EXTENSION: &str = "json";

/// 하나의 수집 작업 범위 (start 포함, end 미포함).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRange {
    /// 거래소 상품 식별자
    pub symbol: String,
    /// 시작 시각 (포함, epoch 밀리초)
    pub start_ms: TimestampMs,
    /// 종료 시각 (미포함, epoch 밀리초)
    pub end_ms: TimestampMs,
}

impl CollectionRange {
    /// 새 수집 범위를 생성합니다.
    ///
    /// 경계 검증은 [`CollectionRange::validate`]에서 수행합니다.
    pub fn new(symbol: impl Into<String>, start_ms: TimestampMs, end_ms: TimestampMs) -> Self {
        Self {
            symbol: symbol.into(),
            start_ms,
            end_ms,
        }
    }

    /// UTC 시각으로부터 수집 범위를 생성합니다.
    pub fn from_datetimes(
        symbol: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self::new(symbol, start.timestamp_millis(), end.timestamp_millis())
    }

    /// 범위가 유효한지 확인합니다.
    ///
    /// # Errors
    /// 심볼이 비어 있거나 ASCII 영숫자가 아닌 문자를 포함하거나 `start >= end`이면
    /// `CoreError::InvalidRange`를 반환합니다. 심볼은 체크포인트 파일 이름에 그대로 쓰입니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.symbol.is_empty() {
            return Err(CoreError::InvalidRange("심볼이 비어 있습니다".to_string()));
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidRange(format!(
                "허용되지 않는 심볼: {:?}",
                self.symbol
            )));
        }
        if self.start_ms >= self.end_ms {
            return Err(CoreError::InvalidRange(format!(
                "start({}) >= end({})",
                self.start_ms, self.end_ms
            )));
        }
        Ok(())
    }

    /// 범위 길이 (밀리초).
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// 이 범위의 식별자.
    pub fn range_id(&self) -> RangeId {
        RangeId::for_range(self)
    }
}

/// 수집 범위 식별자 (체크포인트 키).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(String);

impl RangeId {
    /// 수집 범위로부터 식별자를 만듭니다.
    pub fn for_range(range: &CollectionRange) -> Self {
        Self(format!(
            "{}_{}_{}",
            range.symbol,
            format_compact_date(range.start_ms),
            format_compact_date(range.end_ms)
        ))
    }

    /// 저장소 항목 이름(`{id}.json`)에서 식별자를 복원합니다.
    ///
    /// 경로 구분자나 상위 경로가 포함된 이름은 거부합니다.
    pub fn from_entry_name(name: &str) -> Option<Self> {
        if !is_safe_entry_name(name) {
            return None;
        }
        name.strip_suffix(&format!(".{}", CHECKPOINT_EXTENSION))
            .filter(|stem| !stem.is_empty())
            .map(|stem| Self(stem.to_string()))
    }

    /// 문자열 표현.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 저장소 항목 이름 (`{id}.json`).
    pub fn entry_name(&self) -> String {
        format!("{}.{}", self.0, CHECKPOINT_EXTENSION)
    }

    /// 식별자에 포함된 심볼 (첫 번째 `_` 앞부분).
    pub fn symbol(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 저장소 항목 이름으로 안전한지 확인합니다.
pub fn is_safe_entry_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}
