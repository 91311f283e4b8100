//! 체결(fill) 기록.
//!
//! 거래소에서 조회한 단일 체결을 나타냅니다. 조회 이후에는 변경되지 않습니다.
//! 직렬화 형식은 기존 데이터 파일과 호환되도록 유지합니다:
//!
//! ```json
//! {"symbol": "BTCUSDT", "side": "Buy", "price": 42000.5, "qty": 0.01,
//!  "timestamp": 1704067200000, "orderId": "1590437381325373696"}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TimestampMs;

/// 매매 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(format!("Unknown side: {}", s)),
        }
    }
}

/// 체결된 거래 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// 거래소 상품 식별자 (예: "BTCUSDT")
    pub symbol: String,
    /// 매매 방향
    pub side: Side,
    /// 체결 가격 (>= 0)
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// 체결 수량 (> 0)
    #[serde(rename = "qty", with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// 체결 시각 (epoch 밀리초, 정렬 기준)
    #[serde(rename = "timestamp")]
    pub execution_time_ms: TimestampMs,
    /// 주문 ID (심볼 내에서 유일)
    #[serde(rename = "orderId")]
    pub order_id: String,
}

impl Execution {
    /// 새 체결 기록을 생성합니다.
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: Decimal,
        execution_time_ms: TimestampMs,
        order_id: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            price,
            quantity,
            execution_time_ms,
            order_id: order_id.into(),
        }
    }
}
