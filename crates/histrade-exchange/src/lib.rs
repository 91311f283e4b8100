//! 거래소 연결 및 단순 조회.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `ExecutionSource` trait: 시간 윈도우 단위 체결 조회 (수집기가 사용)
//! - `AccountGateway` trait: 펀딩비/현재가/잔고 등 패스스루 조회
//! - Bybit v5 REST 커넥터 (HMAC 서명, 엄격한 응답 디코딩)
//! - 펀딩비/지갑 잔고 조합 함수

pub mod account;
pub mod connector;
pub mod error;
pub mod traits;

pub use account::{funding_rates, wallet_balances, WALLET_BATCH_SIZE};
pub use connector::{BybitClient, BybitConfig};
pub use error::*;
pub use traits::*;
