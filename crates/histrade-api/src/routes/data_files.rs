//! 저장된 체크포인트 조회 endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use histrade_core::RangeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{api_error, collector_error, ApiResult};
use crate::state::AppState;

/// 데이터 파일 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataFilesResponse {
    /// 체크포인트 항목 이름 (정렬됨)
    pub files: Vec<String>,
}

/// 체크포인트 목록.
///
/// GET /data-files
pub async fn list_data_files(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DataFilesResponse>> {
    let files = state
        .store
        .list_entries()
        .await
        .map_err(|e| collector_error(&e))?;

    Ok(Json(DataFilesResponse { files }))
}

/// 체크포인트 원본 JSON.
///
/// GET /data-file/{name}
pub async fn get_data_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    if RangeId::from_entry_name(&name).is_none() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_NAME",
            format!("invalid data file name: {}", name),
        ));
    }

    match state.store.read_entry(&name).await {
        Ok(Some(contents)) => Ok(Json(contents)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("data file not found: {}", name),
        )),
        Err(e) => Err(collector_error(&e)),
    }
}

/// 데이터 파일 라우터 생성.
pub fn data_files_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data-files", get(list_data_files))
        .route("/data-file/{name}", get(get_data_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::state::testing::{create_test_state, JAN_01};
    use axum::{body::Body, http::Request, response::Response};
    use histrade_core::{Checkpoint, CollectionRange, Execution, Side};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    async fn get(state: Arc<AppState>, uri: &str) -> Response {
        data_files_router()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_list_is_empty_without_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(&dir.path().join("data"));

        let response = get(state, "/data-files").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: DataFilesResponse = body_json(response).await;
        assert!(body.files.is_empty());
    }

    #[tokio::test]
    async fn test_list_and_read_saved_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path());
        let id = CollectionRange::new("ETHUSDT", JAN_01, JAN_01 + 86_400_000).range_id();
        let checkpoint = Checkpoint::from_executions(vec![Execution::new(
            "ETHUSDT",
            Side::Sell,
            dec!(2200.5),
            dec!(1.25),
            JAN_01 + 5,
            "e-1",
        )]);
        state.store.save(&id, &checkpoint).await.unwrap();

        let body: DataFilesResponse = body_json(get(state.clone(), "/data-files").await).await;
        assert_eq!(body.files, vec!["ETHUSDT_20240101_20240102.json".to_string()]);

        let response = get(state, "/data-file/ETHUSDT_20240101_20240102.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        let contents: Value = body_json(response).await;
        assert_eq!(contents[0]["orderId"], "e-1");
        assert_eq!(contents[0]["side"], "Sell");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(
            create_test_state(dir.path()),
            "/data-file/BTCUSDT_20240101_20240122.json",
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ApiErrorResponse = body_json(response).await;
        assert_eq!(body.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unsafe_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(create_test_state(dir.path()), "/data-file/..%2Fsecret.json").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorResponse = body_json(response).await;
        assert_eq!(body.code, "INVALID_NAME");
    }
}
