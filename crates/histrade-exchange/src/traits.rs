//! 거래소 조회 인터페이스.
//!
//! 수집기는 `ExecutionSource`만 의존하며, facade의 패스스루 엔드포인트는
//! `AccountGateway`를 사용합니다. 두 trait 모두 재시도나 윈도우 분할을 하지 않습니다.

use async_trait::async_trait;
use histrade_core::{CoinBalance, Execution, FundingRate, TimestampMs};
use rust_decimal::Decimal;

use crate::error::ExchangeError;

/// 거래소 작업 결과 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 시간 윈도우 단위 체결 조회.
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    /// `[window_start, window_end)` 구간의 체결을 최대 `page_limit`건 조회합니다.
    ///
    /// 결과가 정확히 `page_limit`건이면 해당 윈도우가 잘렸을 수 있습니다.
    /// 빈 결과는 에러가 아닙니다.
    async fn fetch_executions(
        &self,
        symbol: &str,
        window_start: TimestampMs,
        window_end: TimestampMs,
        page_limit: u32,
    ) -> ExchangeResult<Vec<Execution>>;
}

/// 상태 없는 단일 호출 계좌/시장 조회.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// 무기한 선물의 최신 펀딩비. 기록이 없으면 `None`.
    async fn latest_funding_rate(&self, symbol: &str) -> ExchangeResult<Option<FundingRate>>;

    /// 최근 체결 내역 (시간 범위 없음).
    async fn recent_executions(&self, symbol: &str, limit: u32) -> ExchangeResult<Vec<Execution>>;

    /// 현물 최종 체결가.
    async fn last_price(&self, symbol: &str) -> ExchangeResult<Decimal>;

    /// 통합 계좌의 코인별 잔고.
    async fn coin_balances(&self, coins: &[String]) -> ExchangeResult<Vec<CoinBalance>>;
}
