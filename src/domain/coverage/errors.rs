//! Coverage Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoverageError {
    #[error("无效的分段宽度: {0}")]
    InvalidSegmentSize(f64),
}
