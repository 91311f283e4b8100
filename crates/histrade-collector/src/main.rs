//! Historical trade collector CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use histrade_collector::{CheckpointStore, Collector, CollectorOptions, FileCheckpointStore};
use histrade_core::{init_logging, parse_datetime, AppConfig, CollectionRange, LogConfig};
use histrade_exchange::{BybitClient, BybitConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "histrade-collector")]
#[command(about = "Bybit historical trade execution collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (기본: HISTRADE_CONFIG 또는 config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 범위의 체결 내역 수집 (중단된 범위는 이어서 수집)
    Collect {
        /// 심볼 (예: "BTCUSDT")
        #[arg(long)]
        symbol: String,

        /// 시작 시각 (포함, 예: "2024-01-01" 또는 "2024-01-01T00:00:00")
        #[arg(long)]
        start: String,

        /// 종료 시각 (미포함)
        #[arg(long)]
        end: String,
    },

    /// 저장된 체크포인트 목록
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(Some(path)),
        None => AppConfig::load_default(),
    }
    .context("설정 로드 실패")?;

    let mut log_config = LogConfig::from_settings(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let store = Arc::new(FileCheckpointStore::new(&config.collector.data_dir));

    match cli.command {
        Commands::List => {
            for name in store.list_entries().await? {
                println!("{}", name);
            }
        }
        Commands::Collect { symbol, start, end } => {
            let range = CollectionRange::from_datetimes(
                symbol,
                parse_datetime(&start)?,
                parse_datetime(&end)?,
            );

            let client = BybitClient::new(BybitConfig::from_settings(&config.exchange))?;
            let collector = Collector::new(
                Arc::new(client),
                store,
                CollectorOptions::from_settings(&config.collector),
            );

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("종료 신호 수신, 현재 윈도우 이후 중단합니다");
                        cancel.cancel();
                    }
                }
            });

            let report = collector.run(&range, &cancel).await?;
            tracing::info!(
                range_id = %report.range_id,
                total = report.executions.len(),
                "체크포인트 저장 완료"
            );
        }
    }

    Ok(())
}
