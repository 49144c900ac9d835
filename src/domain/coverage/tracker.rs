//! Segment Coverage Tracker
//!
//! 把视频按固定宽度切成时间桶，记录被连续观看过的桶。
//! 纯数据结构，不做任何 I/O。

use std::collections::BTreeSet;

use super::CoverageError;

/// 根据视频时长计算桶数量
///
/// 非整倍数时等于 `ceil(duration / segment_size)`；
/// 整倍数时多出一个末尾桶，保证 `to == duration` 的标记仍在范围内。
pub fn bucket_count_for(duration: f64, segment_size: f64) -> u64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0;
    }
    (duration / segment_size).floor() as u64 + 1
}

/// 覆盖追踪器
///
/// 不变量:
/// - 已覆盖集合只增不减（除非时长确定后裁掉越界桶）
/// - 时长已知时，所有桶下标 < bucket_count
#[derive(Debug, Clone)]
pub struct CoverageTracker {
    segment_size: f64,
    covered: BTreeSet<u64>,
    /// 时长已知后的桶数量上限
    bucket_limit: Option<u64>,
}

impl CoverageTracker {
    pub fn new(segment_size: f64) -> Result<Self, CoverageError> {
        if !segment_size.is_finite() || segment_size <= 0.0 {
            return Err(CoverageError::InvalidSegmentSize(segment_size));
        }
        Ok(Self {
            segment_size,
            covered: BTreeSet::new(),
            bucket_limit: None,
        })
    }

    /// 标记 `[from, to]` 所覆盖的全部桶
    ///
    /// 负数起点会被截到 0；`to < 0`、`from > to` 或非有限值时不做任何事。
    /// 返回新增的桶数量。
    pub fn mark_range(&mut self, from: f64, to: f64) -> usize {
        if !from.is_finite() || !to.is_finite() || to < 0.0 {
            return 0;
        }
        let from = from.max(0.0);
        if from > to {
            return 0;
        }

        let first = (from / self.segment_size).floor() as u64;
        let mut last = (to / self.segment_size).floor() as u64;
        if let Some(limit) = self.bucket_limit {
            if limit == 0 {
                return 0;
            }
            last = last.min(limit - 1);
            if first > last {
                return 0;
            }
        }

        let before = self.covered.len();
        self.covered.extend(first..=last);
        self.covered.len() - before
    }

    /// 时长确定后固定桶数量，并丢弃越界的桶
    pub fn set_bucket_limit(&mut self, duration: f64) {
        let limit = bucket_count_for(duration, self.segment_size);
        self.covered.retain(|index| *index < limit);
        self.bucket_limit = Some(limit);
    }

    /// 观看率（0-100）
    pub fn coverage_ratio(&self, total_duration: f64) -> u8 {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return 0;
        }
        let covered_secs = self.covered.len() as f64 * self.segment_size;
        (covered_secs / total_duration * 100.0).round().min(100.0) as u8
    }

    /// 上报用位串，每个桶一个字符，'1' 表示已覆盖
    ///
    /// 时长未知时返回 None，由调用方决定如何处理。
    pub fn to_bitstring(&self, total_duration: f64) -> Option<String> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return None;
        }
        let count = bucket_count_for(total_duration, self.segment_size);
        Some(
            (0..count)
                .map(|i| if self.covered.contains(&i) { '1' } else { '0' })
                .collect(),
        )
    }

    pub fn is_covered(&self, index: u64) -> bool {
        self.covered.contains(&index)
    }

    pub fn covered_count(&self) -> usize {
        self.covered.len()
    }

    pub fn covered_segments(&self) -> impl Iterator<Item = u64> + '_ {
        self.covered.iter().copied()
    }

    pub fn segment_size(&self) -> f64 {
        self.segment_size
    }
}

/// 一次累积的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// 新的锚点位置
    pub anchor: f64,
    /// 本次是否记入覆盖
    pub credited: bool,
}

/// 从锚点推进到当前位置
///
/// 定时轮询和暂停/结束/离开共用这一处累积逻辑。
/// 只有 `0 < current - anchor` 且（若给定 `max_step`）差值小于 `max_step`
/// 时才记入覆盖；无论是否记入，锚点都移到 `current`，跳转不会被补记。
pub fn advance_coverage(
    tracker: &mut CoverageTracker,
    anchor: f64,
    current: f64,
    max_step: Option<f64>,
) -> Advance {
    let delta = current - anchor;
    let credited = delta > 0.0 && max_step.map_or(true, |max| delta < max);
    if credited {
        tracker.mark_range(anchor, current);
    }
    Advance {
        anchor: current,
        credited,
    }
}
