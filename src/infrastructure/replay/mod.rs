//! Trace Replay - 按时间轴回放一段播放轨迹
//!
//! 轨迹格式（JSON）:
//! ```json
//! {
//!   "session_id": "s-1", "org_id": "acme", "video_id": "v-1",
//!   "duration": 120.0,
//!   "steps": [
//!     {"at_ms": 0, "action": "play"},
//!     {"at_ms": 15000, "action": "seek", "to": 90.0},
//!     {"at_ms": 20000, "action": "lifecycle", "signal": "page_hide"}
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::application::{
    ApplicationError, CoordinatorConfig, LifecycleSignal, MediaPlayerPort, PlayerEvent,
    ReportTransportPort, SessionSnapshot, WatchSessionCoordinator,
};
use crate::domain::session::{SessionError, SessionInfo};
use crate::infrastructure::player::SimulatedPlayer;
use crate::infrastructure::runtime::{SessionRunner, SessionRunnerConfig};

/// 回放错误
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse trace: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// 播放轨迹
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayTrace {
    pub session_id: String,
    pub org_id: String,
    pub video_id: String,
    /// 初始已知的时长；为空时等待 `duration_loaded` 步骤
    #[serde(default)]
    pub duration: Option<f64>,
    pub steps: Vec<ReplayStep>,
}

/// 轨迹中的一步
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayStep {
    /// 相对挂载时刻的偏移（毫秒）
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ReplayAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayAction {
    Play,
    Pause,
    Seek { to: f64 },
    /// 播放器发出 ended
    End,
    DurationLoaded { duration: f64 },
    Lifecycle { signal: LifecycleSignal },
}

impl ReplayTrace {
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ReplayError> {
        let trace: Self = serde_json::from_str(content)?;
        trace.validate()?;
        Ok(trace)
    }

    fn validate(&self) -> Result<(), ReplayError> {
        if self
            .steps
            .windows(2)
            .any(|pair| pair[1].at_ms < pair[0].at_ms)
        {
            return Err(ReplayError::InvalidTrace(
                "steps must be ordered by at_ms".to_string(),
            ));
        }
        if matches!(self.duration, Some(d) if !(d.is_finite() && d > 0.0)) {
            return Err(ReplayError::InvalidTrace(
                "duration must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_info(&self) -> Result<SessionInfo, SessionError> {
        SessionInfo::new(&self.session_id, &self.org_id, &self.video_id)
    }
}

/// 回放一段轨迹，返回卸载时的会话快照
///
/// 最后一步之后等待 `settle` 再卸载，让运行循环处理完尾部信号和轮询
pub async fn replay(
    trace: &ReplayTrace,
    coordinator_config: CoordinatorConfig,
    runner_config: SessionRunnerConfig,
    transport: Arc<dyn ReportTransportPort>,
    settle: Duration,
) -> Result<SessionSnapshot, ReplayError> {
    let player = Arc::new(SimulatedPlayer::new(trace.duration));
    let coordinator = WatchSessionCoordinator::new(
        trace.session_info()?,
        coordinator_config,
        Some(player.clone() as Arc<dyn MediaPlayerPort>),
        transport,
    )?;

    let mounted = SessionRunner::mount(coordinator, runner_config);
    let handle = mounted.handle();
    let started = Instant::now();

    tracing::info!(
        session_id = %trace.session_id,
        steps = trace.steps.len(),
        "Replaying trace"
    );

    for step in &trace.steps {
        tokio::time::sleep_until(started + Duration::from_millis(step.at_ms)).await;
        tracing::debug!(at_ms = step.at_ms, action = ?step.action, "Replay step");

        match step.action {
            ReplayAction::Play => {
                player.play();
                handle.dispatch(PlayerEvent::Play);
            }
            ReplayAction::Pause => {
                player.pause();
                handle.dispatch(PlayerEvent::Pause);
            }
            ReplayAction::Seek { to } => {
                handle.dispatch(PlayerEvent::Seeking);
                player.seek(to);
                handle.dispatch(PlayerEvent::Seeked);
            }
            ReplayAction::End => {
                if let Some(duration) = player.duration() {
                    player.seek(duration);
                }
                player.pause();
                handle.dispatch(PlayerEvent::Ended);
            }
            ReplayAction::DurationLoaded { duration } => player.set_duration(duration),
            ReplayAction::Lifecycle { signal } => {
                handle.dispatch(signal);
            }
        }
    }

    tokio::time::sleep(settle).await;
    mounted
        .unmount()
        .await
        .ok_or_else(|| ReplayError::InvalidTrace("session runner aborted".to_string()))
}
