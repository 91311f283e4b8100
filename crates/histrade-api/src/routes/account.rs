//! 계정/시세 패스스루 endpoint.
//!
//! 거래소 단일 호출을 그대로 전달합니다. 재시도나 영속화는 없습니다.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use histrade_core::{Execution, FundingRate, RangeId, WalletBalance};
use histrade_exchange::{funding_rates, wallet_balances};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{collector_error, exchange_error, ApiResult};
use crate::state::AppState;

/// 기본 체결 조회 개수.
const DEFAULT_TRADES_LIMIT: u32 = 50;
/// 거래소가 허용하는 최대 조회 개수.
const MAX_TRADES_LIMIT: u32 = 100;

/// 사용자 체결 조회 쿼리.
#[derive(Debug, Deserialize)]
pub struct UserTradesQuery {
    pub limit: Option<u32>,
}

/// 설정된 심볼들의 최신 펀딩비.
///
/// GET /funding-rates
pub async fn get_funding_rates(State(state): State<Arc<AppState>>) -> Json<Vec<FundingRate>> {
    Json(funding_rates(state.account.as_ref(), &state.funding_symbols).await)
}

/// 사용자 최근 체결.
///
/// GET /user/trades/{symbol}?limit=50
pub async fn get_user_trades(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<UserTradesQuery>,
) -> ApiResult<Json<Vec<Execution>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRADES_LIMIT)
        .clamp(1, MAX_TRADES_LIMIT);

    let trades = state
        .account
        .recent_executions(&symbol, limit)
        .await
        .map_err(|e| exchange_error(&e))?;

    Ok(Json(trades))
}

/// 저장된 데이터 파일의 심볼에서 기준 코인 목록을 만듭니다.
///
/// `BTCUSDT_20240101_20240122.json` → `BTC`. 중복은 제거되고 정렬됩니다.
pub fn wallet_coins(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|name| RangeId::from_entry_name(name))
        .map(|id| {
            let symbol = id.symbol();
            symbol.strip_suffix("USDT").unwrap_or(symbol).to_string()
        })
        .filter(|coin| !coin.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 수집한 적 있는 코인들의 지갑 잔고.
///
/// GET /wallet/balance
pub async fn get_wallet_balance(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<WalletBalance>>> {
    let entries = state
        .store
        .list_entries()
        .await
        .map_err(|e| collector_error(&e))?;
    let coins = wallet_coins(&entries);

    let balances = wallet_balances(state.account.as_ref(), &coins)
        .await
        .map_err(|e| exchange_error(&e))?;

    Ok(Json(balances))
}

/// 패스스루 라우터 생성.
pub fn account_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/funding-rates", get(get_funding_rates))
        .route("/user/trades/{symbol}", get(get_user_trades))
        .route("/wallet/balance", get(get_wallet_balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{create_test_state, JAN_01};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use histrade_core::{Checkpoint, CollectionRange};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    async fn get(state: Arc<AppState>, uri: &str) -> Response {
        account_router()
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

    #[test]
    fn test_wallet_coins_from_entries() {
        let entries = vec![
            "BTCUSDT_20240101_20240122.json".to_string(),
            "ETHUSDT_20240101_20240108.json".to_string(),
            "BTCUSDT_20240201_20240301.json".to_string(),
            "notes.txt".to_string(),
        ];

        assert_eq!(wallet_coins(&entries), vec!["BTC", "ETH"]);
    }

    #[tokio::test]
    async fn test_funding_rates_skip_failed_symbols() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(create_test_state(dir.path()), "/funding-rates").await;

        assert_eq!(response.status(), StatusCode::OK);
        let rates: Vec<FundingRate> = body_json(response).await;
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].symbol, "BTCUSDT");
        assert_eq!(rates[0].funding_rate_pct, dec!(0.01));
    }

    #[tokio::test]
    async fn test_user_trades_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(create_test_state(dir.path()), "/user/trades/ETHUSDT?limit=2").await;

        assert_eq!(response.status(), StatusCode::OK);
        let trades: Vec<Execution> = body_json(response).await;
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.symbol == "ETHUSDT"));
    }

    #[tokio::test]
    async fn test_wallet_balance_for_collected_coins() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path());
        for symbol in ["BTCUSDT", "SOLUSDT"] {
            let id = CollectionRange::new(symbol, JAN_01, JAN_01 + 86_400_000).range_id();
            state.store.save(&id, &Checkpoint::new()).await.unwrap();
        }

        let response = get(state, "/wallet/balance").await;

        assert_eq!(response.status(), StatusCode::OK);
        let balances: Vec<WalletBalance> = body_json(response).await;
        assert_eq!(balances.len(), 2);

        assert_eq!(balances[0].coin, "BTC");
        assert_eq!(balances[0].total, dec!(0.5));
        assert_eq!(balances[0].usd_value, dec!(21000));

        // 현재가 조회 실패 → 가격 0, 잔고 없음 → 0 잔고
        assert_eq!(balances[1].coin, "SOL");
        assert_eq!(balances[1].current_price, dec!(0));
        assert_eq!(balances[1].total, dec!(0));
    }
}
