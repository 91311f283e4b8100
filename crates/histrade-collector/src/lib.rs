//! 과거 체결 내역 수집기.
//!
//! 이 crate는 요청 범위를 고정 크기 윈도우로 나눠 순서대로 조회하고,
//! 윈도우마다 결과를 체크포인트에 병합/저장하여 중단 후 재실행 시
//! 이어서 수집할 수 있게 합니다:
//! - 윈도우 계획 (`WindowPlanner`)
//! - 체크포인트 저장소 (`CheckpointStore`, `FileCheckpointStore`)
//! - 범위별 상호 배제 (`RangeLocks`)
//! - 수집 상태 머신 (`Collector`)

pub mod error;
pub mod modules;
pub mod stats;

pub use error::{CollectorError, CollectorResult};
pub use modules::{
    CheckpointStore, CollectionReport, Collector, CollectorOptions, CollectorState,
    FileCheckpointStore, MergeOutcome, RangeGuard, RangeLocks, Window, WindowPlanner, Windows,
};
pub use stats::CollectionStats;
