//! Playback Context - 播放事件记录
//!
//! 只追加的诊断日志，不参与上报正确性

mod recorder;

pub use recorder::{EventRecorder, PlaybackEvent, PlaybackEventKind};
