//! Session Context - Aggregate Root

use super::{SessionError, SessionInfo, WatchReport};
use crate::domain::coverage::{advance_coverage, Advance, CoverageTracker};

/// WatchSession 聚合根
///
/// 不变量:
/// - 标识与分段宽度创建后不可变
/// - 时长一旦确定不再改变
/// - has_ended / has_reported 只会从 false 变为 true，且只变一次
#[derive(Debug, Clone)]
pub struct WatchSession {
    info: SessionInfo,
    total_duration: Option<f64>,
    coverage: CoverageTracker,
    last_known_position: f64,
    has_ended: bool,
    has_reported: bool,
}

impl WatchSession {
    pub fn new(info: SessionInfo, segment_size: f64) -> Result<Self, SessionError> {
        Ok(Self {
            info,
            total_duration: None,
            coverage: CoverageTracker::new(segment_size)?,
            last_known_position: 0.0,
            has_ended: false,
            has_reported: false,
        })
    }

    /// 设置视频时长
    ///
    /// 只接受第一次出现的有效值，返回是否生效。
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if !duration.is_finite() || duration <= 0.0 {
            return false;
        }
        match self.total_duration {
            None => {
                self.total_duration = Some(duration);
                self.coverage.set_bucket_limit(duration);
                tracing::debug!(
                    session_id = %self.info.session_id,
                    duration,
                    "Video duration resolved"
                );
                true
            }
            Some(existing) => {
                if (existing - duration).abs() > f64::EPSILON {
                    tracing::debug!(
                        session_id = %self.info.session_id,
                        existing,
                        ignored = duration,
                        "Duration already fixed, ignoring new value"
                    );
                }
                false
            }
        }
    }

    pub fn update_position(&mut self, position: f64) {
        if position.is_finite() && position >= 0.0 {
            self.last_known_position = position;
        }
    }

    /// 从锚点推进覆盖
    pub fn advance(&mut self, anchor: f64, current: f64, max_step: Option<f64>) -> Advance {
        advance_coverage(&mut self.coverage, anchor, current, max_step)
    }

    /// 直接标记区间（播完时的尾部窗口）
    pub fn mark_range(&mut self, from: f64, to: f64) -> usize {
        self.coverage.mark_range(from, to)
    }

    /// 标记自然播完，只有第一次返回 true
    pub fn mark_ended(&mut self) -> bool {
        if self.has_ended {
            return false;
        }
        self.has_ended = true;
        true
    }

    /// 取得上报闩锁，只有第一次返回 true
    ///
    /// 必须在交给传输层之前调用。
    pub fn try_latch_report(&mut self) -> bool {
        if self.has_reported {
            return false;
        }
        self.has_reported = true;
        true
    }

    /// 当前观看率
    pub fn watch_rate(&self) -> u8 {
        self.total_duration
            .map(|d| self.coverage.coverage_ratio(d))
            .unwrap_or(0)
    }

    /// 构建上报记录
    pub fn build_report(&self, is_quit: bool) -> WatchReport {
        let watch_segments = self
            .total_duration
            .and_then(|d| self.coverage.to_bitstring(d))
            .unwrap_or_default();

        WatchReport {
            session_id: self.info.session_id.to_string(),
            watch_rate: self.watch_rate(),
            watch_segments,
            recent_position: self.last_known_position,
            is_quit,
        }
    }

    // Getters
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn total_duration(&self) -> Option<f64> {
        self.total_duration
    }

    pub fn segment_size(&self) -> f64 {
        self.coverage.segment_size()
    }

    pub fn coverage(&self) -> &CoverageTracker {
        &self.coverage
    }

    pub fn last_known_position(&self) -> f64 {
        self.last_known_position
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended
    }

    pub fn has_reported(&self) -> bool {
        self.has_reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> WatchSession {
        let info = SessionInfo::new("s-1", "acme", "v-1").unwrap();
        WatchSession::new(info, 10.0).unwrap()
    }

    #[test]
    fn test_duration_set_once() {
        let mut s = session();
        assert!(!s.set_duration(0.0));
        assert!(s.set_duration(120.0));
        assert!(!s.set_duration(90.0));
        assert_eq!(s.total_duration(), Some(120.0));
    }

    #[test]
    fn test_latches_flip_once() {
        let mut s = session();
        assert!(s.mark_ended());
        assert!(!s.mark_ended());
        assert!(s.try_latch_report());
        assert!(!s.try_latch_report());
        assert!(s.has_ended() && s.has_reported());
    }

    #[test]
    fn test_report_without_duration() {
        let mut s = session();
        s.mark_range(0.0, 15.0);
        s.update_position(15.0);

        let report = s.build_report(true);
        assert_eq!(report.watch_rate, 0);
        assert_eq!(report.watch_segments, "");
        assert_eq!(report.recent_position, 15.0);
        assert!(report.is_quit);
    }

    #[test]
    fn test_report_with_duration() {
        let mut s = session();
        s.set_duration(30.0);
        s.mark_range(0.0, 5.0);
        s.mark_range(20.0, 25.0);

        let report = s.build_report(false);
        assert_eq!(report.watch_segments, "1010");
        assert_eq!(report.watch_rate, 67);
        assert!(!report.is_quit);
    }

    #[test]
    fn test_invalid_position_ignored() {
        let mut s = session();
        s.update_position(12.0);
        s.update_position(f64::NAN);
        s.update_position(-3.0);
        assert_eq!(s.last_known_position(), 12.0);
    }
}
