//! 수집 범위의 누적 체결 스냅샷.
//!
//! 불변 조건:
//! - 같은 `order_id`를 가진 항목은 하나뿐입니다 (먼저 들어온 항목 유지).
//! - 항목은 항상 `execution_time_ms` 내림차순(최신 우선)으로 정렬되어 있으며,
//!   같은 시각의 항목은 삽입 순서를 유지합니다.

use std::collections::HashSet;

use crate::domain::Execution;
use crate::types::TimestampMs;

/// 중복 제거 및 정렬된 체결 누적본.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    executions: Vec<Execution>,
    order_ids: HashSet<String>,
}

impl Checkpoint {
    /// 빈 체크포인트.
    pub fn new() -> Self {
        Self::default()
    }

    /// 체결 목록으로부터 체크포인트를 만듭니다.
    ///
    /// 중복 주문 ID가 섞인 이전 형식의 데이터도 불변 조건을 만족하도록 정규화합니다.
    pub fn from_executions(executions: Vec<Execution>) -> Self {
        let mut checkpoint = Self::new();
        checkpoint.merge(executions);
        checkpoint
    }

    /// 새 페이지를 병합하고 추가된 항목 수를 반환합니다.
    ///
    /// 이미 존재하는 주문 ID는 무시되므로 같은 페이지를 여러 번 병합해도
    /// 결과는 한 번 병합한 것과 같습니다.
    pub fn merge(&mut self, page: impl IntoIterator<Item = Execution>) -> usize {
        let mut added = 0;
        for execution in page {
            if self.order_ids.insert(execution.order_id.clone()) {
                self.executions.push(execution);
                added += 1;
            }
        }

        if added > 0 {
            // 안정 정렬: 같은 시각은 삽입 순서 유지
            self.executions
                .sort_by(|a, b| b.execution_time_ms.cmp(&a.execution_time_ms));
        }
        added
    }

    /// 주문 ID 포함 여부.
    pub fn contains(&self, order_id: &str) -> bool {
        self.order_ids.contains(order_id)
    }

    /// 정렬된 체결 목록.
    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// 체결 목록을 소유권과 함께 반환합니다.
    pub fn into_executions(self) -> Vec<Execution> {
        self.executions
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    /// 가장 최근 체결 시각.
    pub fn latest_time(&self) -> Option<TimestampMs> {
        self.executions.first().map(|e| e.execution_time_ms)
    }

    /// 가장 오래된 체결 시각.
    pub fn earliest_time(&self) -> Option<TimestampMs> {
        self.executions.last().map(|e| e.execution_time_ms)
    }
}
