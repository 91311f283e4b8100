//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 수집기 자체 메트릭(`histrade_*`)도 같은 레코더로 기록됩니다.

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// 동적 경로 파라미터를 가진 라우트 접두사와 파라미터 이름.
const PARAM_ROUTES: &[(&str, &str)] = &[
    ("/historical-trades/", "{symbol}"),
    ("/user/trades/", "{symbol}"),
    ("/data-file/", "{name}"),
];

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # 패닉
///
/// 레코더가 이미 설치되어 있으면 패닉합니다.
pub fn setup_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        // 수집 요청은 수 분까지 걸릴 수 있음
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 180.0, 600.0],
        )
        .expect("히스토그램 버킷 설정 실패")
        .install_recorder()
        .expect("Prometheus 레코더 설치 실패")
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// 요청마다 HTTP 메트릭을 기록하는 미들웨어 (`middleware::from_fn`용).
///
/// 라벨의 path는 `normalize_path`로 정규화되어, 심볼이나 파일 이름마다
/// 시계열이 늘어나지 않습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().as_str().to_owned();
    let route = normalize_path(request.uri().path());

    record_http_request(&method, &route);
    let response = next.run(request).await;

    record_http_response(&method, &route, response.status().as_u16());
    record_http_duration(&method, &route, started.elapsed().as_secs_f64());
    response
}

/// 경로의 동적 파라미터를 라우트 패턴으로 정규화합니다.
///
/// 예: `/historical-trades/BTCUSDT` → `/historical-trades/{symbol}`
pub fn normalize_path(path: &str) -> String {
    for (prefix, param) in PARAM_ROUTES {
        if let Some(rest) = path.strip_prefix(prefix) {
            if !rest.is_empty() && !rest.contains('/') {
                return format!("{}{}", prefix, param);
            }
        }
    }
    path.to_string()
}
