//! 수집 윈도우 계획.
//!
//! `[start, end)` 범위를 `step` 크기의 연속된 반열린 구간으로 나눕니다.
//! 마지막 윈도우는 `end`에서 잘립니다. 같은 입력은 항상 같은 순서의
//! 같은 윈도우를 만들며, 윈도우는 필요할 때 하나씩 생성됩니다.

use histrade_core::TimestampMs;
use std::iter::FusedIterator;

use crate::error::{CollectorError, CollectorResult};

/// 기본 윈도우 크기 (일).
pub const DEFAULT_STEP_DAYS: i64 = 7;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 하나의 조회 구간 (start 포함, end 미포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
}

impl Window {
    /// 윈도우 길이 (밀리초).
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// 고정 크기 윈도우 계획기.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    step_ms: i64,
}

impl Default for WindowPlanner {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_STEP_DAYS * MS_PER_DAY,
        }
    }
}

impl WindowPlanner {
    /// 윈도우 크기(밀리초)로 생성합니다.
    ///
    /// # Errors
    /// `step_ms <= 0`이면 `CollectorError::InvalidRange`.
    pub fn new(step_ms: i64) -> CollectorResult<Self> {
        if step_ms <= 0 {
            return Err(CollectorError::InvalidRange(format!(
                "window step must be positive, got {}ms",
                step_ms
            )));
        }
        Ok(Self { step_ms })
    }

    /// 윈도우 크기(일)로 생성합니다.
    pub fn from_days(days: i64) -> CollectorResult<Self> {
        Self::new(days.saturating_mul(MS_PER_DAY))
    }

    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    /// `[start_ms, end_ms)`를 덮는 윈도우 시퀀스.
    ///
    /// # Errors
    /// `start_ms >= end_ms`이면 `CollectorError::InvalidRange`.
    pub fn plan(&self, start_ms: TimestampMs, end_ms: TimestampMs) -> CollectorResult<Windows> {
        if start_ms >= end_ms {
            return Err(CollectorError::InvalidRange(format!(
                "start({}) >= end({})",
                start_ms, end_ms
            )));
        }
        Ok(Windows {
            next_start: start_ms,
            end_ms,
            step_ms: self.step_ms,
        })
    }
}

/// 지연 생성되는 윈도우 시퀀스.
#[derive(Debug, Clone)]
pub struct Windows {
    next_start: TimestampMs,
    end_ms: TimestampMs,
    step_ms: i64,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.next_start >= self.end_ms {
            return None;
        }
        let start_ms = self.next_start;
        let end_ms = start_ms.saturating_add(self.step_ms).min(self.end_ms);
        self.next_start = end_ms;
        Some(Window { start_ms, end_ms })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next_start >= self.end_ms {
            0
        } else {
            let span = self.end_ms.saturating_sub(self.next_start);
            let count = span / self.step_ms + i64::from(span % self.step_ms != 0);
            usize::try_from(count).unwrap_or(usize::MAX)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows {}

impl FusedIterator for Windows {}
