//! tracing 기반 로깅 인프라.
//!
//! 출력 형식:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 운영환경/로그 집계용 JSON 형식
//! - **compact**: 한 줄 형식

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingSettings;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식 (운영용)
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 로그 레벨 필터 (예: "info", "histrade_collector=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// span 진입/종료 이벤트 포함 여부
    pub with_span_events: bool,
    /// 파일명과 줄 번호 포함 여부
    pub with_file: bool,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_file: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// 새 로그 설정을 생성합니다.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// 로그 형식을 설정합니다.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// span 이벤트를 활성화합니다.
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// 애플리케이션 설정에서 생성합니다. 알 수 없는 형식은 pretty로 대체합니다.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format.parse().unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// 주어진 설정으로 로깅 시스템을 초기화합니다.
///
/// `RUST_LOG`가 설정되어 있으면 설정 레벨보다 우선합니다.
///
/// # 예제
///
/// ```no_run
/// use histrade_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(config.with_file)
                    .with_line_number(config.with_file)
                    .with_target(config.with_target)
                    .with_span_events(span_events),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(config.with_file)
                    .with_line_number(config.with_file)
                    .with_target(config.with_target)
                    .with_span_events(span_events),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_file(config.with_file)
                    .with_line_number(config.with_file)
                    .with_target(config.with_target)
                    .with_span_events(span_events),
            )
            .try_init()?,
    }

    tracing::info!(
        format = ?config.format,
        level = %config.level,
        "Logging initialized"
    );

    Ok(())
}

/// 수집 범위 컨텍스트 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! collect_span {
    ($name:expr, $range_id:expr) => {
        tracing::info_span!($name, range_id = %$range_id)
    };
    ($name:expr, $range_id:expr, $symbol:expr) => {
        tracing::info_span!($name, range_id = %$range_id, symbol = %$symbol)
    };
}
