//! 타임스탬프 및 날짜 변환.
//!
//! 거래소와 체크포인트는 모두 epoch 밀리초를 사용하고,
//! 외부 입력(쿼리 파라미터, CLI 인자)은 ISO 8601 문자열로 들어옵니다.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{CoreError, CoreResult};

/// Epoch 밀리초 타임스탬프.
pub type TimestampMs = i64;

/// 시간대 정보 없는 입력에 허용되는 형식.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// ISO 8601 문자열을 UTC 시각으로 파싱합니다.
///
/// 허용 형식:
/// - RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T09:00:00+09:00`)
/// - 시간대 없는 날짜시간 (`2024-01-01T00:00:00`, UTC로 간주)
/// - 날짜만 (`2024-01-01`, 해당 일 00:00 UTC)
pub fn parse_datetime(input: &str) -> CoreResult<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::default()).and_utc());
    }

    Err(CoreError::InvalidInput(format!(
        "ISO 8601 날짜 형식이 아닙니다: {}",
        input
    )))
}

/// 밀리초 타임스탬프를 `YYYYMMDD` 형식으로 변환합니다.
///
/// 표현 불가능한 값은 숫자 그대로 반환합니다.
pub fn format_compact_date(ms: TimestampMs) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y%m%d").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// 밀리초 타임스탬프를 RFC 3339 문자열로 변환합니다 (로그 출력용).
pub fn format_rfc3339(ms: TimestampMs) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}
