//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod media_player;
mod report_transport;

pub use media_player::MediaPlayerPort;
pub use report_transport::{ReportChannelPort, ReportTransportPort, TransportError};
