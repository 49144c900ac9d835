//! 应用层错误定义

use thiserror::Error;

use crate::domain::session::SessionError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 会话创建失败
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApplicationError {
    /// 创建配置无效错误
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
