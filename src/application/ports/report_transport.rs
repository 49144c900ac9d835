//! Report Transport Port - 上报投递抽象
//!
//! 投递是尽力而为的：不重试、不排队、不退避，失败只记日志

use thiserror::Error;

use crate::domain::session::WatchReport;

/// 投递错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Channel unavailable: {0}")]
    Unavailable(&'static str),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("No async runtime available")]
    NoRuntime,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),
}

/// Report Transport Port
///
/// 协调器只依赖这个接口。实现必须是非阻塞、只产生副作用的。
pub trait ReportTransportPort: Send + Sync {
    fn send(&self, report: &WatchReport);
}

/// 单一投递通道
///
/// 由 DeliveryTransport 在调用时按能力探测选择
pub trait ReportChannelPort: Send + Sync {
    /// 通道名称（日志用）
    fn name(&self) -> &'static str;

    /// 能力探测：当前环境下能否投递这么大的负载
    fn is_available(&self, payload_len: usize) -> bool;

    /// 交付负载，立即返回，不等待网络结果
    fn dispatch(&self, url: &str, body: Vec<u8>) -> Result<(), TransportError>;
}
