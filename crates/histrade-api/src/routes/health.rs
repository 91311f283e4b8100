//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템에서 사용됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 체크포인트 저장소 접근 가능 여부
    pub checkpoint_store: ComponentStatus,

    /// 수집기 상태 (진행 중인 범위 수)
    pub collector: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// 정상 상태.
    pub fn up() -> Self {
        Self {
            status: "up".to_string(),
            message: None,
        }
    }

    /// 비정상 상태.
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    /// 정보 포함 정상 상태.
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// GET /health/ready
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (overall_status, status_code, store_status) = match state.store.list_entries().await {
        Ok(entries) => (
            "healthy",
            StatusCode::OK,
            ComponentStatus::up_with_info(format!("{} files", entries.len())),
        ),
        Err(e) => (
            "degraded",
            StatusCode::SERVICE_UNAVAILABLE,
            ComponentStatus::down(e.to_string()),
        ),
    };

    let active = state.collector.locks().len();
    let collector_status = if active == 0 {
        ComponentStatus::up()
    } else {
        ComponentStatus::up_with_info(format!("{} ranges in progress", active))
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            checkpoint_store: store_status,
            collector: collector_status,
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::create_test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = Router::new()
            .nest("/health", health_router())
            .with_state(create_test_state(dir.path()));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_with_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let app = Router::new()
            .nest("/health", health_router())
            .with_state(create_test_state(&dir.path().join("not-yet-created")));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.components.checkpoint_store.message.as_deref(), Some("0 files"));
    }
}
