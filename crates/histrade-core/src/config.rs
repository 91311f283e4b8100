//! 설정 관리.
//!
//! 설정은 다음 순서로 덮어씁니다:
//! 1. 코드 기본값
//! 2. TOML 파일 (`HISTRADE_CONFIG` 또는 `config/default.toml`, 없으면 생략)
//! 3. `HISTRADE__` 접두사 환경 변수 (예: `HISTRADE__COLLECTOR__PACING_MS=800`)
//!
//! 거래소 자격증명은 여기서 다루지 않으며 거래소 커넥터가 직접 로드합니다.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreResult;

/// 최소 페이싱 간격 (밀리초).
pub const MIN_PACING_MS: u64 = 100;

/// 설정 파일 기본 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerSettings,
    /// 수집기 설정
    pub collector: CollectorSettings,
    /// 거래소 연결 설정
    pub exchange: ExchangeSettings,
    /// 펀딩비 조회 설정
    pub funding: FundingSettings,
    /// 로깅 설정
    pub logging: LoggingSettings,
}

/// HTTP 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초). 장시간 수집 요청을 고려해 넉넉하게 잡습니다.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout_secs: 900,
        }
    }
}

impl ServerSettings {
    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 과거 체결 수집기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// 체크포인트 저장 디렉토리
    pub data_dir: PathBuf,
    /// 윈도우 크기 (일)
    pub step_days: i64,
    /// 윈도우당 최대 조회 건수
    pub page_limit: u32,
    /// 윈도우 간 대기 시간 (밀리초)
    pub pacing_ms: u64,
    /// 단일 조회 타임아웃 (초)
    pub fetch_timeout_secs: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            step_days: 7,
            page_limit: 100,
            pacing_ms: 500,
            fetch_timeout_secs: 30,
        }
    }
}

impl CollectorSettings {
    /// 윈도우 크기를 밀리초로 반환
    pub fn step_ms(&self) -> i64 {
        self.step_days.saturating_mul(24 * 60 * 60 * 1000)
    }

    /// 윈도우 간 대기 시간 (최소 100ms 보장)
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms.max(MIN_PACING_MS))
    }

    /// 단일 조회 타임아웃
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// 거래소 연결 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeSettings {
    /// 테스트넷 사용
    pub testnet: bool,
    /// REST 기본 URL 재정의 (테스트/프록시용)
    pub base_url: Option<String>,
    /// 수신 윈도우 (밀리초)
    pub recv_window_ms: u64,
    /// HTTP 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 체결 조회 카테고리 (spot, linear 등)
    pub category: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            testnet: false,
            base_url: None,
            recv_window_ms: 5000,
            timeout_secs: 30,
            category: "spot".to_string(),
        }
    }
}

/// 펀딩비 조회 대상.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FundingSettings {
    /// 조회할 심볼 목록
    pub symbols: Vec<String>,
}

impl Default for FundingSettings {
    fn default() -> Self {
        Self {
            symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "SOLUSDT".to_string(),
            ],
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("HISTRADE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("funding.symbols")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// `HISTRADE_CONFIG` 또는 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        let path = std::env::var("HISTRADE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(Some(&path))
    }
}
