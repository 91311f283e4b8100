//! 수집 모듈.

pub mod checkpoint;
pub mod collector;
pub mod lock;
pub mod window;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, MergeOutcome};
pub use collector::{CollectionReport, Collector, CollectorOptions, CollectorState};
pub use lock::{RangeGuard, RangeLocks};
pub use window::{Window, WindowPlanner, Windows};
