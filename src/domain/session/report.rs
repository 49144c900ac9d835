//! Terminal watch report
//!
//! POST {org_id}/video/{video_id}/leave
//! Body: {"session_id": "...", "watch_rate": 67, "watch_segments": "1010",
//!        "recent_position": 25.0, "is_quit": true}

use serde::{Deserialize, Serialize};

/// 会话结束时上报的摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchReport {
    pub session_id: String,
    /// 观看率 0-100
    pub watch_rate: u8,
    /// 每个时间桶一个字符的 0/1 位串，时长未知时为空
    pub watch_segments: String,
    /// 最后已知播放位置（秒）
    pub recent_position: f64,
    /// true 表示中途离开，false 表示自然播完
    pub is_quit: bool,
}
