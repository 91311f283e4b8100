//! 체결 수집을 위한 도메인 모델.

mod account;
mod checkpoint;
mod execution;
mod range;

pub use account::*;
pub use checkpoint::*;
pub use execution::*;
pub use range::*;
