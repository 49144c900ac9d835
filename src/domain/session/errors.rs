//! Session Context - Errors

use thiserror::Error;

use crate::domain::coverage::CoverageError;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("无效的会话 ID: {0}")]
    InvalidSessionId(String),

    #[error("无效的视频 ID: {0}")]
    InvalidVideoId(String),

    #[error("无效的组织 ID: {0}")]
    InvalidOrgId(String),

    #[error(transparent)]
    Coverage(#[from] CoverageError),
}
