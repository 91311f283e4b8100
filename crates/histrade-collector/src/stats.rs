//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 작업 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 계획된 윈도우 수
    pub windows_total: usize,
    /// 조회 및 병합에 성공한 윈도우 수
    pub windows_fetched: usize,
    /// 빈 윈도우 (조회 성공, 데이터 없음)
    pub windows_empty: usize,
    /// 페이지 한도에 도달해 잘렸을 수 있는 윈도우 수
    pub windows_truncated: usize,
    /// 거래소에서 받은 체결 수 (중복 포함)
    pub fetched_executions: usize,
    /// 체크포인트에 새로 추가된 체결 수
    pub added_executions: usize,
    /// 재개 시 기존 체크포인트의 체결 수
    pub resumed_from: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 진행률 계산 (%)
    pub fn progress(&self) -> f64 {
        if self.windows_total == 0 {
            0.0
        } else {
            (self.windows_fetched as f64 / self.windows_total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            windows_total = self.windows_total,
            windows_fetched = self.windows_fetched,
            windows_empty = self.windows_empty,
            windows_truncated = self.windows_truncated,
            fetched = self.fetched_executions,
            added = self.added_executions,
            resumed_from = self.resumed_from,
            progress = format!("{:.1}%", self.progress()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
