//! 과거 체결 수집 상태 머신.
//!
//! 한 번의 `run`은 다음 순서로 진행됩니다:
//!
//! ```text
//! Idle → Planning → (FetchingWindow → Merging → Pacing)* → Done | Failed
//! ```
//!
//! - 윈도우 조회, 병합/저장, 대기는 엄격히 순차 실행됩니다.
//! - 윈도우마다 결과를 즉시 저장하므로 N번째 윈도우 이후 중단되어도
//!   1..N 윈도우는 남아 있습니다.
//! - 어떤 윈도우든 실패하면 전체 실행을 중단합니다. 복구는 같은 인자로
//!   다시 실행하는 것이며, 모든 윈도우를 다시 조회하지만 orderId 기준
//!   중복 제거 덕분에 새 체결만 추가됩니다.
//! - 같은 범위의 실행은 `RangeLocks`로 직렬화됩니다.

use histrade_core::{
    collect_span, format_rfc3339, Checkpoint, CollectionRange, CollectorSettings, Execution,
    RangeId,
};
use histrade_exchange::{ExchangeError, ExecutionSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{CollectorError, CollectorResult};
use crate::modules::checkpoint::CheckpointStore;
use crate::modules::lock::RangeLocks;
use crate::modules::window::{Window, WindowPlanner, Windows};
use crate::stats::CollectionStats;

/// 수집기 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Planning,
    FetchingWindow,
    Merging,
    Pacing,
    Done,
    Failed,
}

impl CollectorState {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::FetchingWindow => "fetching_window",
            Self::Merging => "merging",
            Self::Pacing => "pacing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// 수집기 동작 옵션.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    /// 윈도우 크기 (밀리초)
    pub step_ms: i64,
    /// 윈도우당 최대 조회 건수
    pub page_limit: u32,
    /// 윈도우 간 대기 시간
    pub pacing: Duration,
    /// 단일 조회 타임아웃
    pub fetch_timeout: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self::from_settings(&CollectorSettings::default())
    }
}

impl CollectorOptions {
    /// 설정에서 생성. 대기 시간은 최소 100ms로 보정됩니다.
    pub fn from_settings(settings: &CollectorSettings) -> Self {
        Self {
            step_ms: settings.step_ms(),
            page_limit: settings.page_limit,
            pacing: settings.pacing(),
            fetch_timeout: settings.fetch_timeout(),
        }
    }
}

/// 완료된 수집 결과.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub range_id: RangeId,
    /// 중복 제거 및 시각 내림차순 정렬된 전체 체결
    pub executions: Vec<Execution>,
    pub stats: CollectionStats,
}

/// 과거 체결 수집기.
///
/// 거래소 클라이언트와 저장소를 한 번 주입받아 여러 실행에서 공유합니다.
pub struct Collector {
    source: Arc<dyn ExecutionSource>,
    store: Arc<dyn CheckpointStore>,
    locks: RangeLocks,
    options: CollectorOptions,
}

impl Collector {
    pub fn new(
        source: Arc<dyn ExecutionSource>,
        store: Arc<dyn CheckpointStore>,
        options: CollectorOptions,
    ) -> Self {
        Self {
            source,
            store,
            locks: RangeLocks::new(),
            options,
        }
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    pub fn locks(&self) -> &RangeLocks {
        &self.locks
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// 범위 전체를 수집합니다.
    ///
    /// # Errors
    /// - 범위/윈도우 크기가 잘못되면 네트워크 호출 없이 `InvalidRange`
    /// - 윈도우 조회 실패 시 `Exchange` (이전 윈도우는 저장됨)
    /// - 저장 실패 시 `Persistence`
    /// - 취소 시 `Cancelled` (이전 윈도우는 저장됨)
    pub async fn run(
        &self,
        range: &CollectionRange,
        cancel: &CancellationToken,
    ) -> CollectorResult<CollectionReport> {
        let range_id = range.range_id();
        let span = collect_span!("collect", range_id, range.symbol);

        async {
            let mut state = CollectorState::Idle;
            let started = Instant::now();

            transition(&mut state, CollectorState::Planning);
            let windows = match self.plan(range) {
                Ok(windows) => windows,
                Err(e) => return Err(self.fail(&mut state, e)),
            };

            let _guard = self.locks.acquire(&range_id).await;

            let mut stats = CollectionStats::new();
            match self
                .run_windows(range, &range_id, windows, cancel, &mut state, &mut stats)
                .await
            {
                Ok(checkpoint) => {
                    transition(&mut state, CollectorState::Done);
                    stats.elapsed = started.elapsed();
                    stats.log_summary("과거 체결 수집");
                    Ok(CollectionReport {
                        range_id: range_id.clone(),
                        executions: checkpoint.into_executions(),
                        stats,
                    })
                }
                Err(e) => {
                    stats.elapsed = started.elapsed();
                    tracing::warn!(
                        windows_fetched = stats.windows_fetched,
                        windows_total = stats.windows_total,
                        retryable = e.is_retryable(),
                        "수집 중단, 완료된 윈도우는 저장됨"
                    );
                    Err(self.fail(&mut state, e))
                }
            }
        }
        .instrument(span)
        .await
    }

    fn plan(&self, range: &CollectionRange) -> CollectorResult<Windows> {
        range.validate()?;
        WindowPlanner::new(self.options.step_ms)?.plan(range.start_ms, range.end_ms)
    }

    async fn run_windows(
        &self,
        range: &CollectionRange,
        range_id: &RangeId,
        windows: Windows,
        cancel: &CancellationToken,
        state: &mut CollectorState,
        stats: &mut CollectionStats,
    ) -> CollectorResult<Checkpoint> {
        let total = windows.len();
        stats.windows_total = total;

        let mut checkpoint = match self.store.load(range_id).await? {
            Some(existing) => {
                tracing::info!(
                    existing = existing.len(),
                    earliest = ?existing.earliest_time().map(format_rfc3339),
                    latest = ?existing.latest_time().map(format_rfc3339),
                    "기존 체크포인트에서 재개"
                );
                stats.resumed_from = existing.len();
                existing
            }
            None => Checkpoint::new(),
        };

        tracing::info!(
            windows = total,
            start = %format_rfc3339(range.start_ms),
            end = %format_rfc3339(range.end_ms),
            "수집 시작"
        );

        for (idx, window) in windows.enumerate() {
            if cancel.is_cancelled() {
                return Err(CollectorError::Cancelled {
                    range_id: range_id.clone(),
                });
            }

            transition(state, CollectorState::FetchingWindow);
            tracing::debug!(
                window = format!("{}/{}", idx + 1, total),
                start = %format_rfc3339(window.start_ms),
                end = %format_rfc3339(window.end_ms),
                "윈도우 조회"
            );

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(CollectorError::Cancelled { range_id: range_id.clone() });
                }
                page = self.fetch_window(&range.symbol, window) => page?,
            };

            let returned = page.len();
            stats.windows_fetched += 1;
            stats.fetched_executions += returned;
            if returned == 0 {
                stats.windows_empty += 1;
            }
            if returned >= self.options.page_limit as usize {
                stats.windows_truncated += 1;
                tracing::warn!(
                    window = format!("{}/{}", idx + 1, total),
                    returned,
                    page_limit = self.options.page_limit,
                    "페이지 한도 도달, 윈도우 결과가 잘렸을 수 있음"
                );
            }
            metrics::counter!("histrade_windows_fetched_total", "symbol" => range.symbol.clone())
                .increment(1);

            transition(state, CollectorState::Merging);
            let outcome = self.store.merge(range_id, page).await?;
            stats.added_executions += outcome.added;
            checkpoint = outcome.checkpoint;
            metrics::counter!("histrade_executions_added_total", "symbol" => range.symbol.clone())
                .increment(outcome.added as u64);

            tracing::info!(
                window = format!("{}/{}", idx + 1, total),
                returned,
                added = outcome.added,
                total = checkpoint.len(),
                "윈도우 병합 완료"
            );

            if idx + 1 < total {
                transition(state, CollectorState::Pacing);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(CollectorError::Cancelled { range_id: range_id.clone() });
                    }
                    _ = tokio::time::sleep(self.options.pacing) => {}
                }
            }
        }

        Ok(checkpoint)
    }

    async fn fetch_window(&self, symbol: &str, window: Window) -> CollectorResult<Vec<Execution>> {
        let fetch = self.source.fetch_executions(
            symbol,
            window.start_ms,
            window.end_ms,
            self.options.page_limit,
        );

        match tokio::time::timeout(self.options.fetch_timeout, fetch).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ExchangeError::TransientNetwork(format!(
                "fetch timed out after {}s",
                self.options.fetch_timeout.as_secs_f64()
            ))
            .into()),
        }
    }

    fn fail(&self, state: &mut CollectorState, error: CollectorError) -> CollectorError {
        transition(state, CollectorState::Failed);
        metrics::counter!("histrade_collection_failures_total", "kind" => error.kind())
            .increment(1);
        tracing::error!(error = %error, kind = error.kind(), "수집 실패");
        error
    }
}

fn transition(state: &mut CollectorState, next: CollectorState) {
    tracing::trace!(from = state.as_str(), to = next.as_str(), "상태 전이");
    *state = next;
}
