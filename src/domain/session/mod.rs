//! Session Context - 观看会话限界上下文
//!
//! 职责:
//! - WatchSession 聚合（覆盖、位置、结束/上报标志）
//! - 会话阶段
//! - 上报记录的线上格式

mod aggregate;
mod errors;
mod report;
mod value_objects;

pub use aggregate::WatchSession;
pub use errors::SessionError;
pub use report::WatchReport;
pub use value_objects::{OrgId, SessionId, SessionInfo, SessionPhase, VideoId};
