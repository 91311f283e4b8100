//! 과거 체결 수집기 HTTP facade.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 과거 체결 수집 트리거 및 결과 반환
//! - 저장된 체크포인트 파일 조회
//! - 펀딩비/최근 체결/지갑 잔고 패스스루
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`metrics`]: Prometheus 메트릭 수집 및 HTTP 메트릭 미들웨어

pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::{metrics_layer, setup_metrics_recorder};
pub use routes::create_api_router;
pub use state::AppState;
