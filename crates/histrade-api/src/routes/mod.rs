//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/historical-trades/{symbol}` - 과거 체결 수집 및 조회
//! - `/data-files`, `/data-file/{name}` - 저장된 체크포인트
//! - `/funding-rates`, `/user/trades/{symbol}`, `/wallet/balance` - 패스스루 조회

pub mod account;
pub mod data_files;
pub mod health;
pub mod historical;

pub use account::{account_router, wallet_coins};
pub use data_files::{data_files_router, DataFilesResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use historical::{historical_router, HistoricalTradesQuery, HistoricalTradesResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .merge(historical_router())
        .merge(data_files_router())
        .merge(account_router())
}
