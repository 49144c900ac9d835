//! Playback Event Recorder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 播放事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackEventKind {
    Join,
    Play,
    Pause,
    Seek,
    End,
    Leave,
}

impl PlaybackEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek => "seek",
            Self::End => "end",
            Self::Leave => "leave",
        }
    }
}

impl std::fmt::Display for PlaybackEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条播放事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackEvent {
    #[serde(rename = "type")]
    pub kind: PlaybackEventKind,
    /// 事件发生时的播放位置（秒）
    pub position: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// 事件记录器
///
/// 不变量:
/// - 只追加，已有条目不会被修改或删除
/// - 顺序即记录顺序
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Vec<PlaybackEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条事件
    pub fn record(
        &mut self,
        kind: PlaybackEventKind,
        position: f64,
        metadata: Option<serde_json::Value>,
    ) {
        tracing::trace!(kind = %kind, position, "Playback event recorded");
        self.events.push(PlaybackEvent {
            kind,
            position,
            timestamp: Utc::now(),
            metadata,
        });
    }

    pub fn events(&self) -> &[PlaybackEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&PlaybackEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 统计某类事件出现次数
    pub fn count(&self, kind: PlaybackEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// 导出为 JSON（诊断用）
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_appends_in_order() {
        let mut recorder = EventRecorder::new();
        recorder.record(PlaybackEventKind::Join, 0.0, None);
        recorder.record(PlaybackEventKind::Play, 0.0, None);
        recorder.record(PlaybackEventKind::Seek, 42.0, Some(json!({ "from": 3.0 })));

        let kinds: Vec<_> = recorder.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PlaybackEventKind::Join,
                PlaybackEventKind::Play,
                PlaybackEventKind::Seek
            ]
        );
        assert_eq!(recorder.last().unwrap().position, 42.0);
        assert!(recorder.events()[0].timestamp <= recorder.events()[2].timestamp);
        assert_eq!(recorder.count(PlaybackEventKind::Play), 1);
    }

    #[test]
    fn test_json_export() {
        let mut recorder = EventRecorder::new();
        recorder.record(PlaybackEventKind::Pause, 12.5, None);

        let exported: serde_json::Value =
            serde_json::from_str(&recorder.to_json().unwrap()).unwrap();
        assert_eq!(exported[0]["type"], "pause");
        assert_eq!(exported[0]["position"], 12.5);
        assert!(exported[0].get("metadata").is_none());
    }
}
