//! 과거 체결 수집 endpoint.
//!
//! 요청 범위를 수집기로 백필한 뒤 병합된 전체 체크포인트를 반환합니다.
//! 중단된 범위는 기존 체크포인트에서 이어서 수집됩니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use histrade_core::{parse_datetime, CollectionRange, Execution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{api_error, collector_error, ApiResult};
use crate::state::AppState;

/// 수집 범위 쿼리.
#[derive(Debug, Deserialize)]
pub struct HistoricalTradesQuery {
    /// 시작 시각 (포함)
    pub start_date: Option<String>,
    /// 종료 시각 (미포함)
    pub end_date: Option<String>,
}

/// 수집 결과 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoricalTradesResponse {
    pub symbol: String,
    /// 요청에 주어진 문자열 그대로
    pub start_date: String,
    pub end_date: String,
    pub total_trades: usize,
    /// 체결 시각 내림차순
    pub trades: Vec<Execution>,
}

fn required_date(value: Option<String>, field: &str) -> ApiResult<String> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_DATE",
            format!("{} is required", field),
        )
    })
}

/// 범위 수집 실행.
///
/// GET /historical-trades/{symbol}?start_date=..&end_date=..
///
/// 수집은 별도 태스크로 실행되어 클라이언트 연결이 끊겨도 중간에 멈추지 않습니다.
/// 서버 종료 시에는 윈도우 사이에서 취소됩니다.
pub async fn get_historical_trades(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoricalTradesQuery>,
) -> ApiResult<Json<HistoricalTradesResponse>> {
    let start_date = required_date(query.start_date, "start_date")?;
    let end_date = required_date(query.end_date, "end_date")?;

    let parse = |raw: &str| {
        parse_datetime(raw)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_DATE", e.to_string()))
    };
    let range = CollectionRange::from_datetimes(&symbol, parse(&start_date)?, parse(&end_date)?);

    info!(range_id = %range.range_id(), "Historical trade collection requested");

    let collector = state.collector.clone();
    let cancel = state.shutdown.child_token();
    let report = tokio::spawn(async move { collector.run(&range, &cancel).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Collection task failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "collection task failed",
            )
        })?
        .map_err(|e| collector_error(&e))?;

    Ok(Json(HistoricalTradesResponse {
        symbol,
        start_date,
        end_date,
        total_trades: report.executions.len(),
        trades: report.executions,
    }))
}

/// 과거 체결 라우터 생성.
pub fn historical_router() -> Router<Arc<AppState>> {
    Router::new().route("/historical-trades/{symbol}", get(get_historical_trades))
}
