//! Session Context - Value Objects

use serde::{Deserialize, Serialize};

use super::SessionError;

macro_rules! opaque_id {
    ($name:ident, $err:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, SessionError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(SessionError::$err(value));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(SessionId, InvalidSessionId);
opaque_id!(VideoId, InvalidVideoId);
opaque_id!(OrgId, InvalidOrgId);

/// 宿主应用在开始追踪前提供的会话信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub org_id: OrgId,
    pub video_id: VideoId,
}

impl SessionInfo {
    pub fn new(
        session_id: impl Into<String>,
        org_id: impl Into<String>,
        video_id: impl Into<String>,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            session_id: SessionId::new(session_id)?,
            org_id: OrgId::new(org_id)?,
            video_id: VideoId::new(video_id)?,
        })
    }
}

/// 会话阶段
///
/// `Idle → Joined → {Playing ⇄ Paused ⇄ Seeking} → Ended | Left`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Joined,
    Playing,
    Paused,
    Seeking,
    Ended,
    Left,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Joined => "joined",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Seeking => "seeking",
            Self::Ended => "ended",
            Self::Left => "left",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Left)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
