//! 패스스루 조회 조합.
//!
//! 여러 심볼/코인에 대한 단일 호출을 묶어 facade 응답 형태로 만듭니다.
//! 재시도나 영속화는 하지 않습니다.

use histrade_core::{FundingRate, WalletBalance};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::traits::{AccountGateway, ExchangeResult};

/// 잔고 조회 한 번에 묶는 코인 수.
pub const WALLET_BATCH_SIZE: usize = 10;

/// 심볼별 최신 펀딩비.
///
/// 개별 심볼 조회 실패는 경고 로그 후 건너뜁니다.
pub async fn funding_rates(gateway: &dyn AccountGateway, symbols: &[String]) -> Vec<FundingRate> {
    let mut rates = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        match gateway.latest_funding_rate(symbol).await {
            Ok(Some(rate)) => rates.push(rate),
            Ok(None) => debug!(symbol = %symbol, "No funding history"),
            Err(e) => warn!(symbol = %symbol, error = %e, "Failed to fetch funding rate"),
        }
    }

    rates
}

/// 코인 목록의 지갑 잔고와 USDT 평가 금액.
///
/// 코인은 `WALLET_BATCH_SIZE`개씩 나눠 조회합니다. 현재가 조회에 실패하면
/// 가격 0으로 처리하고, 잔고가 없거나 0인 코인도 0 잔고로 포함합니다.
/// 잔고 조회 자체가 실패하면 에러를 반환합니다.
pub async fn wallet_balances(
    gateway: &dyn AccountGateway,
    coins: &[String],
) -> ExchangeResult<Vec<WalletBalance>> {
    let mut balances = Vec::with_capacity(coins.len());

    for batch in coins.chunks(WALLET_BATCH_SIZE) {
        debug!(coins = ?batch, "Fetching wallet balance batch");

        let mut prices = Vec::with_capacity(batch.len());
        for coin in batch {
            let price = match gateway.last_price(&format!("{}USDT", coin)).await {
                Ok(price) => price,
                Err(e) => {
                    warn!(coin = %coin, error = %e, "Failed to fetch price, using 0");
                    Decimal::ZERO
                }
            };
            prices.push(price);
        }

        let fetched = gateway.coin_balances(batch).await?;

        for (coin, price) in batch.iter().zip(prices) {
            let balance = fetched
                .iter()
                .find(|b| &b.coin == coin && b.wallet_balance > Decimal::ZERO);

            balances.push(match balance {
                Some(balance) => WalletBalance::priced(balance, price),
                None => WalletBalance::empty(coin.clone(), price),
            });
        }
    }

    Ok(balances)
}
