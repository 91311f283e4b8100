//! 단순 조회용 계좌/시장 정보 타입.
//!
//! 펀딩비, 지갑 잔고 조회는 상태 없는 단일 호출 패스스루이며
//! 수집기와 무관하게 facade에서 그대로 직렬화됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TimestampMs;

/// 무기한 선물의 최신 펀딩비.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    /// 심볼
    pub symbol: String,
    /// 펀딩비 (퍼센트 단위, 예: 0.01 = 0.01%)
    #[serde(rename = "fundingRate", with = "rust_decimal::serde::float")]
    pub funding_rate_pct: Decimal,
    /// 펀딩 시각 (epoch 밀리초)
    pub timestamp: TimestampMs,
}

/// 거래소에서 조회한 코인 잔고 원본.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinBalance {
    /// 코인 (예: "BTC")
    pub coin: String,
    /// 전체 잔고
    pub wallet_balance: Decimal,
    /// 이체 가능 잔고
    pub transfer_balance: Decimal,
    /// 묶인 잔고
    pub locked: Decimal,
}

/// 현재가가 반영된 지갑 잔고.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// 코인
    pub coin: String,
    /// 전체 잔고
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// 사용 가능 잔고
    #[serde(with = "rust_decimal::serde::float")]
    pub free: Decimal,
    /// 묶인 잔고
    #[serde(with = "rust_decimal::serde::float")]
    pub locked: Decimal,
    /// 현재가 (USDT)
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    /// 평가 금액 (USD)
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_value: Decimal,
}

impl WalletBalance {
    /// 잔고와 현재가로 평가 금액을 계산합니다.
    pub fn priced(balance: &CoinBalance, current_price: Decimal) -> Self {
        Self {
            coin: balance.coin.clone(),
            total: balance.wallet_balance,
            free: balance.transfer_balance,
            locked: balance.locked,
            current_price,
            usd_value: balance.wallet_balance * current_price,
        }
    }

    /// 잔고가 없는 코인.
    pub fn empty(coin: impl Into<String>, current_price: Decimal) -> Self {
        Self {
            coin: coin.into(),
            total: Decimal::ZERO,
            free: Decimal::ZERO,
            locked: Decimal::ZERO,
            current_price,
            usd_value: Decimal::ZERO,
        }
    }
}
