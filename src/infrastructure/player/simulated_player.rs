//! Simulated Player - 时钟驱动的播放器
//!
//! 实现 MediaPlayerPort，用于轨迹回放和测试。
//! 位置由 tokio 时钟推算，测试中可以用暂停的时钟精确控制。

use std::sync::{Mutex, MutexGuard};

use tokio::time::Instant;

use crate::application::ports::MediaPlayerPort;

#[derive(Debug)]
struct PlayerState {
    /// 最近一次暂停/跳转时的位置
    base_position: f64,
    /// 播放中时，开始计时的时刻
    started_at: Option<Instant>,
    duration: Option<f64>,
}

impl PlayerState {
    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        self.clamp(self.base_position + elapsed)
    }

    fn clamp(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        match self.duration {
            Some(d) => position.min(d),
            None => position,
        }
    }
}

/// 模拟播放器
#[derive(Debug)]
pub struct SimulatedPlayer {
    state: Mutex<PlayerState>,
}

impl SimulatedPlayer {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            state: Mutex::new(PlayerState {
                base_position: 0.0,
                started_at: None,
                duration,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn play(&self) {
        let mut state = self.lock();
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
    }

    pub fn pause(&self) {
        let mut state = self.lock();
        state.base_position = state.position();
        state.started_at = None;
    }

    pub fn seek(&self, to: f64) {
        let mut state = self.lock();
        state.base_position = state.clamp(to);
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
    }

    /// 元数据加载完成
    pub fn set_duration(&self, duration: f64) {
        let mut state = self.lock();
        state.base_position = state.position();
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
        state.duration = Some(duration);
    }

    pub fn position(&self) -> f64 {
        self.lock().position()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().started_at.is_some()
    }

    /// 是否已到达末尾
    pub fn is_finished(&self) -> bool {
        let state = self.lock();
        matches!(state.duration, Some(d) if state.position() >= d)
    }
}

impl MediaPlayerPort for SimulatedPlayer {
    fn current_position(&self) -> Option<f64> {
        Some(self.position())
    }

    fn duration(&self) -> Option<f64> {
        self.lock().duration
    }
}
