//! Session Signals - 协调器的输入
//!
//! 播放器事件与页面生命周期信号

use serde::{Deserialize, Serialize};

/// 播放器离散事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerEvent {
    Play,
    Pause,
    Seeking,
    Seeked,
    /// 自然播完
    Ended,
}

/// 页面可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// 页面生命周期信号
///
/// 一次真实的离开可能同时触发多个信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleSignal {
    PageHide,
    BeforeUnload,
    VisibilityChange(Visibility),
}

impl LifecycleSignal {
    /// 是否表示用户离开
    pub fn is_departure(&self) -> bool {
        match self {
            Self::PageHide | Self::BeforeUnload => true,
            Self::VisibilityChange(v) => *v == Visibility::Hidden,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageHide => "pagehide",
            Self::BeforeUnload => "beforeunload",
            Self::VisibilityChange(Visibility::Hidden) => "visibilitychange:hidden",
            Self::VisibilityChange(Visibility::Visible) => "visibilitychange:visible",
        }
    }
}

/// 运行循环分发给协调器的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSignal {
    Join,
    Player(PlayerEvent),
    Lifecycle(LifecycleSignal),
}

impl From<PlayerEvent> for SessionSignal {
    fn from(event: PlayerEvent) -> Self {
        Self::Player(event)
    }
}

impl From<LifecycleSignal> for SessionSignal {
    fn from(signal: LifecycleSignal) -> Self {
        Self::Lifecycle(signal)
    }
}
