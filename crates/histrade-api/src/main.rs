//! 과거 체결 수집 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 과거 체결 백필, 저장된 데이터 파일 조회, 계정 패스스루 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use histrade_api::metrics::{metrics_layer, setup_metrics_recorder};
use histrade_api::routes::create_api_router;
use histrade_api::state::AppState;
use histrade_collector::{Collector, CollectorOptions, FileCheckpointStore};
use histrade_core::{init_logging, AppConfig, LogConfig, ServerSettings};
use histrade_exchange::{BybitClient, BybitConfig};

/// 바인딩 주소.
///
/// # Errors
/// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
fn socket_addr(settings: &ServerSettings) -> Result<SocketAddr, std::net::AddrParseError> {
    format!("{}:{}", settings.host, settings.port).parse()
}

/// CORS 레이어 생성.
///
/// `CORS_ORIGINS`(쉼표 구분)가 설정되면 해당 origin만 허용하고,
/// 없으면 모든 origin을 허용합니다 (개발 모드).
fn cors_layer() -> CorsLayer {
    let origins: Vec<_> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let restricted = !origins.is_empty();
    let allow_origin = if restricted {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    } else {
        warn!("CORS_ORIGINS not set or empty, allowing any origin (development mode)");
        AllowOrigin::any()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::ACCEPT])
        // 와일드카드 origin과 함께 쓸 수 없음
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_api_router().with_state(state))
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 범위 수집은 길어질 수 있으므로 타임아웃은 설정값을 따름
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors_layer())
}

/// 종료 시그널 대기 (Ctrl+C, SIGTERM).
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    // 진행 중인 수집에 종료 시그널 전파
    shutdown_token.cancel();
    info!("Shutdown signal propagated to running collections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_default().context("설정 로드 실패")?;
    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting historical trade API server...");

    let metrics_handle = setup_metrics_recorder();
    info!("Prometheus metrics recorder initialized");

    let addr = socket_addr(&config.server).map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. HISTRADE__SERVER__HOST, HISTRADE__SERVER__PORT를 확인하세요."
        );
        e
    })?;

    let exchange_config = BybitConfig::from_settings(&config.exchange);
    if !exchange_config.has_credentials() {
        warn!("Bybit credentials not set, signed endpoints will fail");
    }
    let client = Arc::new(BybitClient::new(exchange_config)?);

    let store = Arc::new(FileCheckpointStore::new(&config.collector.data_dir));
    let collector = Collector::new(
        client.clone(),
        store,
        CollectorOptions::from_settings(&config.collector),
    );

    let shutdown_token = CancellationToken::new();
    let state = Arc::new(
        AppState::new(Arc::new(collector), client)
            .with_funding_symbols(config.funding.symbols.clone())
            .with_shutdown(shutdown_token.clone()),
    );

    info!(
        version = %state.version,
        data_dir = %config.collector.data_dir.display(),
        funding_symbols = state.funding_symbols.len(),
        "Application state initialized"
    );

    let app = create_router(state, metrics_handle, config.server.request_timeout());

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    shutdown_token.cancel();
    info!("Server shutdown complete");

    Ok(())
}
