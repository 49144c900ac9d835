//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（MediaPlayer、ReportTransport、ReportChannel）
//! - signals: 播放器事件与页面生命周期信号
//! - coordinator: 会话生命周期状态机
//! - error: 应用层错误定义

pub mod coordinator;
pub mod error;
pub mod ports;
pub mod signals;

// Re-exports
pub use coordinator::{CoordinatorConfig, SessionSnapshot, WatchSessionCoordinator};
pub use error::ApplicationError;
pub use ports::{MediaPlayerPort, ReportChannelPort, ReportTransportPort, TransportError};
pub use signals::{LifecycleSignal, PlayerEvent, SessionSignal, Visibility};
