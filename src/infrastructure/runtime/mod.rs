//! Runtime - 会话运行循环

mod session_runner;

pub use session_runner::{MountedSession, SessionHandle, SessionRunner, SessionRunnerConfig};
