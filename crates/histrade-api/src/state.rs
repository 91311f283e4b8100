//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.

use chrono::{DateTime, Utc};
use histrade_collector::{CheckpointStore, Collector};
use histrade_exchange::AccountGateway;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 과거 체결 수집기 (범위 잠금 포함)
    pub collector: Arc<Collector>,

    /// 체크포인트 저장소 - 데이터 파일 목록/조회에 사용
    pub store: Arc<dyn CheckpointStore>,

    /// 계정/시세 패스스루 조회
    pub account: Arc<dyn AccountGateway>,

    /// `/funding-rates`에서 조회할 심볼 목록
    pub funding_symbols: Vec<String>,

    /// 종료 시그널. 진행 중인 수집을 윈도우 사이에서 중단합니다.
    pub shutdown: CancellationToken,

    /// 서버 버전
    pub version: String,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 새 AppState 생성. 저장소는 수집기와 같은 인스턴스를 사용합니다.
    pub fn new(collector: Arc<Collector>, account: Arc<dyn AccountGateway>) -> Self {
        Self {
            store: collector.store().clone(),
            collector,
            account,
            funding_symbols: Vec::new(),
            shutdown: CancellationToken::new(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 펀딩비 조회 심볼 설정.
    pub fn with_funding_symbols(mut self, symbols: Vec<String>) -> Self {
        self.funding_symbols = symbols;
        self
    }

    /// 종료 토큰 설정.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 라우트 테스트용 상태와 가짜 협력자.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use histrade_collector::{CollectorOptions, FileCheckpointStore};
    use histrade_core::{CoinBalance, Execution, FundingRate, Side};
    use histrade_exchange::{ExchangeError, ExchangeResult, ExecutionSource};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub const JAN_01: i64 = 1_704_067_200_000;
    pub const JAN_08: i64 = 1_704_672_000_000;

    /// 첫 주 윈도우에만 체결을 돌려주는 가짜 거래소.
    #[derive(Default)]
    pub struct FakeSource {
        calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExecutionSource for FakeSource {
        async fn fetch_executions(
            &self,
            symbol: &str,
            window_start: i64,
            _window_end: i64,
            _page_limit: u32,
        ) -> ExchangeResult<Vec<Execution>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "FAILUSDT" {
                return Err(ExchangeError::Upstream {
                    code: 10001,
                    message: "params error".into(),
                });
            }
            if window_start != JAN_01 {
                return Ok(Vec::new());
            }
            Ok(vec![
                Execution::new(symbol, Side::Buy, dec!(42000), dec!(0.5), JAN_01 + 1_000, "o-1"),
                Execution::new(symbol, Side::Sell, dec!(42100), dec!(0.2), JAN_01 + 9_000, "o-2"),
            ])
        }
    }

    /// 고정 응답을 돌려주는 가짜 계정 조회.
    pub struct FakeGateway;

    #[async_trait]
    impl AccountGateway for FakeGateway {
        async fn latest_funding_rate(&self, symbol: &str) -> ExchangeResult<Option<FundingRate>> {
            match symbol {
                "BTCUSDT" => Ok(Some(FundingRate {
                    symbol: symbol.to_string(),
                    funding_rate_pct: dec!(0.01),
                    timestamp: JAN_08,
                })),
                "ETHUSDT" => Ok(None),
                _ => Err(ExchangeError::TransientNetwork("connection reset".into())),
            }
        }

        async fn recent_executions(
            &self,
            symbol: &str,
            limit: u32,
        ) -> ExchangeResult<Vec<Execution>> {
            Ok((0..limit.min(3))
                .map(|i| {
                    Execution::new(
                        symbol,
                        Side::Buy,
                        dec!(100),
                        dec!(1),
                        JAN_08 - i as i64,
                        format!("u-{}", i),
                    )
                })
                .collect())
        }

        async fn last_price(&self, symbol: &str) -> ExchangeResult<Decimal> {
            match symbol {
                "BTCUSDT" => Ok(dec!(42000)),
                _ => Err(ExchangeError::MalformedResponse("empty ticker list".into())),
            }
        }

        async fn coin_balances(&self, coins: &[String]) -> ExchangeResult<Vec<CoinBalance>> {
            Ok(coins
                .iter()
                .filter(|c| c.as_str() == "BTC")
                .map(|c| CoinBalance {
                    coin: c.clone(),
                    wallet_balance: dec!(0.5),
                    transfer_balance: dec!(0.4),
                    locked: dec!(0.1),
                })
                .collect())
        }
    }

    /// 임시 데이터 디렉토리를 사용하는 테스트 상태.
    pub fn create_test_state(dir: &Path) -> Arc<AppState> {
        create_test_state_with_source(dir).0
    }

    /// 테스트 상태와 호출 횟수를 확인할 수 있는 가짜 거래소.
    pub fn create_test_state_with_source(dir: &Path) -> (Arc<AppState>, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        let store = Arc::new(FileCheckpointStore::new(dir));
        let collector = Collector::new(
            source.clone(),
            store,
            CollectorOptions {
                pacing: Duration::from_millis(1),
                ..CollectorOptions::default()
            },
        );

        let state = Arc::new(
            AppState::new(Arc::new(collector), Arc::new(FakeGateway))
                .with_funding_symbols(vec![
                    "BTCUSDT".to_string(),
                    "ETHUSDT".to_string(),
                    "SOLUSDT".to_string(),
                ]),
        );
        (state, source)
    }
}
