//! Coverage Context - 观看覆盖上下文
//!
//! 职责:
//! - 固定宽度时间桶的覆盖记录
//! - 观看率计算
//! - 上报用的 0/1 位串

mod errors;
mod tracker;

pub use errors::CoverageError;
pub use tracker::{advance_coverage, bucket_count_for, Advance, CoverageTracker};
