//! Watchtrack - 视频观看会话追踪
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Coverage Context: 时间桶覆盖
//! - Playback Context: 播放事件记录
//! - Session Context: 观看会话与上报记录
//!
//! 应用层 (application/):
//! - Ports: 端口定义（MediaPlayer, ReportTransport, ReportChannel）
//! - Signals: 播放器事件、页面生命周期信号
//! - Coordinator: 会话生命周期状态机
//!
//! 基础设施层 (infrastructure/):
//! - Transport: beacon 主通道 + fetch 后备通道
//! - Runtime: 定时轮询与信号分发的运行循环
//! - Player: 模拟播放器
//! - Replay: 播放轨迹回放

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
