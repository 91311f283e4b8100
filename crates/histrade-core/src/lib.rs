//! # Histrade Core
//!
//! 과거 체결 내역 수집기의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 체결(`Execution`) 및 매매 방향
//! - 수집 범위(`CollectionRange`)와 범위 식별자(`RangeId`)
//! - 중복 제거/정렬 규칙을 가진 체크포인트(`Checkpoint`)
//! - 펀딩비, 지갑 잔고 등 단순 조회용 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
