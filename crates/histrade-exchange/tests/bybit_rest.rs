//! Bybit REST 커넥터 통합 테스트 (mockito 서버 사용).

use histrade_exchange::{
    AccountGateway, BybitClient, BybitConfig, ExchangeError, ExecutionSource,
};
use mockito::{Matcher, Server};
use rust_decimal_macros::dec;

fn client_for(server: &Server) -> BybitClient {
    let config = BybitConfig::new("test-key", "test-secret").with_base_url(server.url());
    BybitClient::new(config).expect("client")
}

const EXECUTIONS_BODY: &str = r#"{
    "retCode": 0,
    "retMsg": "OK",
    "result": {
        "category": "spot",
        "nextPageCursor": "",
        "list": [
            {"symbol": "BTCUSDT", "side": "Sell", "execPrice": "42100.5", "execQty": "0.002",
             "execTime": "1704153600000", "orderId": "1002", "execId": "e2"},
            {"symbol": "BTCUSDT", "side": "Buy", "execPrice": "42000", "execQty": "0.01",
             "execTime": "1704067200000", "orderId": "1001", "execId": "e1"}
        ]
    },
    "time": 1704240000000
}"#;

#[tokio::test]
async fn fetch_executions_requests_half_open_window() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "spot".into()),
            Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
            Matcher::UrlEncoded("startTime".into(), "1704067200000".into()),
            Matcher::UrlEncoded("endTime".into(), "1704671999999".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .match_header("X-BAPI-API-KEY", "test-key")
        .match_header("X-BAPI-RECV-WINDOW", "5000")
        .match_header("X-BAPI-SIGN", Matcher::Regex("^[0-9a-f]{64}$".into()))
        .match_header("X-BAPI-TIMESTAMP", Matcher::Regex("^[0-9]+$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(EXECUTIONS_BODY)
        .create_async()
        .await;

    let client = client_for(&server);
    let executions = client
        .fetch_executions("BTCUSDT", 1_704_067_200_000, 1_704_672_000_000, 100)
        .await
        .expect("executions");

    mock.assert_async().await;
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].order_id, "1002");
    assert_eq!(executions[0].price, dec!(42100.5));
    assert_eq!(executions[1].quantity, dec!(0.01));
}

#[tokio::test]
async fn empty_list_is_success() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"retCode":0,"retMsg":"OK","result":{"list":[],"nextPageCursor":""}}"#)
        .create_async()
        .await;

    let executions = client_for(&server)
        .fetch_executions("BTCUSDT", 0, 1000, 100)
        .await
        .expect("empty page");

    assert!(executions.is_empty());
}

#[tokio::test]
async fn nonzero_ret_code_is_upstream_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"retCode":10003,"retMsg":"API key is invalid.","result":{}}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .fetch_executions("BTCUSDT", 0, 1000, 100)
        .await
        .unwrap_err();

    match err {
        ExchangeError::Upstream { code, message } => {
            assert_eq!(code, 10003);
            assert_eq!(message, "API key is invalid.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_without_envelope_is_upstream_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let err = client_for(&server)
        .fetch_executions("BTCUSDT", 0, 1000, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Upstream { code: 502, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn malformed_row_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"retCode":0,"retMsg":"OK","result":{"list":[
                {"symbol":"BTCUSDT","side":"Buy","execPrice":"n/a","execQty":"1",
                 "execTime":"1704067200000","orderId":"1"}]}}"#,
        )
        .create_async()
        .await;

    let err = client_for(&server)
        .fetch_executions("BTCUSDT", 0, 1000, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_host_is_transient() {
    let config = BybitConfig::new("k", "s").with_base_url("http://127.0.0.1:1");
    let client = BybitClient::new(config).unwrap();

    let err = client
        .fetch_executions("BTCUSDT", 0, 1000, 100)
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn signed_call_without_credentials_fails_before_request() {
    let server = Server::new_async().await;
    let client = BybitClient::new(BybitConfig::default().with_base_url(server.url())).unwrap();

    let err = client.recent_executions("BTCUSDT", 50).await.unwrap_err();

    assert!(matches!(err, ExchangeError::MissingCredentials));
}

#[tokio::test]
async fn funding_rate_is_reported_in_percent() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v5/market/funding/history")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "linear".into()),
            Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"retCode":0,"retMsg":"OK","result":{"category":"linear","list":[
                {"symbol":"BTCUSDT","fundingRate":"0.0001","fundingRateTimestamp":"1704067200000"}]}}"#,
        )
        .create_async()
        .await;

    let rate = client_for(&server)
        .latest_funding_rate("BTCUSDT")
        .await
        .unwrap()
        .expect("rate");

    assert_eq!(rate.funding_rate_pct, dec!(0.01));
    assert_eq!(rate.timestamp, 1_704_067_200_000);
}

#[tokio::test]
async fn last_price_and_coin_balances() {
    let mut server = Server::new_async().await;
    let _tickers = server
        .mock("GET", "/v5/market/tickers")
        .match_query(Matcher::UrlEncoded("symbol".into(), "ETHUSDT".into()))
        .with_status(200)
        .with_body(
            r#"{"retCode":0,"retMsg":"OK","result":{"category":"spot","list":[
                {"symbol":"ETHUSDT","lastPrice":"2250.75"}]}}"#,
        )
        .create_async()
        .await;
    let _balances = server
        .mock("GET", "/v5/asset/transfer/query-account-coins-balance")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("accountType".into(), "UNIFIED".into()),
            Matcher::UrlEncoded("coin".into(), "ETH,SOL".into()),
        ]))
        .match_header("X-BAPI-API-KEY", "test-key")
        .with_status(200)
        .with_body(
            r#"{"retCode":0,"retMsg":"success","result":{"accountType":"UNIFIED","balance":[
                {"coin":"ETH","walletBalance":"1.5","transferBalance":"1.2","bonus":"0"},
                {"coin":"SOL","walletBalance":"0","transferBalance":"0","locked":"0"}]}}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);

    assert_eq!(client.last_price("ETHUSDT").await.unwrap(), dec!(2250.75));

    let balances = client
        .coin_balances(&["ETH".to_string(), "SOL".to_string()])
        .await
        .unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].wallet_balance, dec!(1.5));
    assert_eq!(balances[0].locked, dec!(0));
}

#[tokio::test]
async fn reserved_characters_in_values_are_percent_encoded() {
    let mut server = Server::new_async().await;
    let encoded = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::AllOf(vec![
            Matcher::Regex("symbol=BTCUSDT%26limit%3D1000&".into()),
            Matcher::UrlEncoded("symbol".into(), "BTCUSDT&limit=1000".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"retCode":0,"retMsg":"OK","result":{"list":[]}}"#)
        .create_async()
        .await;
    let injected = server
        .mock("GET", "/v5/execution/list")
        .match_query(Matcher::UrlEncoded("limit".into(), "1000".into()))
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let executions = client
        .fetch_executions("BTCUSDT&limit=1000", 0, 1_000, 100)
        .await
        .unwrap();

    assert!(executions.is_empty());
    encoded.assert_async().await;
    injected.assert_async().await;
}
