//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Coverage Context: 时间桶覆盖
//! - Playback Context: 播放事件记录
//! - Session Context: 观看会话与上报记录

pub mod coverage;
pub mod playback;
pub mod session;
