//! Session Lifecycle Coordinator
//!
//! 监听播放器事件、页面生命周期信号和定时轮询，维护覆盖，
//! 并在终止时刻产生唯一一次上报。
//!
//! 状态: `Idle → Joined → {Playing ⇄ Paused ⇄ Seeking} → Ended | Left`

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::application::error::ApplicationError;
use crate::application::ports::{MediaPlayerPort, ReportTransportPort};
use crate::application::signals::{LifecycleSignal, PlayerEvent, SessionSignal};
use crate::domain::playback::{EventRecorder, PlaybackEvent, PlaybackEventKind};
use crate::domain::session::{SessionInfo, SessionPhase, WatchSession};

/// 协调器配置
///
/// 阈值是经验值，按需调整
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// 时间桶宽度（秒）
    pub segment_size_secs: f64,
    /// 轮询时认为是连续播放的最大步长（秒）
    pub jitter_threshold_secs: f64,
    /// 末尾窗口（秒），进入后视为播完
    pub near_end_window_secs: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            segment_size_secs: 10.0,
            jitter_threshold_secs: 2.0,
            near_end_window_secs: 9.0,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if !self.jitter_threshold_secs.is_finite() || self.jitter_threshold_secs <= 0.0 {
            return Err(ApplicationError::invalid_config(
                "jitter threshold must be positive",
            ));
        }
        if !self.near_end_window_secs.is_finite() || self.near_end_window_secs < 0.0 {
            return Err(ApplicationError::invalid_config(
                "near-end window cannot be negative",
            ));
        }
        Ok(())
    }
}

/// 播完的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCause {
    /// 播放器发出的 ended 事件
    Natural,
    /// 轮询在末尾窗口内合成
    NearEnd,
}

/// 会话快照（诊断用）
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: SessionPhase,
    pub total_duration: Option<f64>,
    pub last_position: f64,
    pub watch_rate: u8,
    pub watch_segments: Option<String>,
    pub covered_segments: Vec<u64>,
    pub has_ended: bool,
    pub has_reported: bool,
    pub events: Vec<PlaybackEvent>,
}

/// 会话生命周期协调器
///
/// 独占 WatchSession；所有处理器同步执行完毕，不需要锁。
pub struct WatchSessionCoordinator {
    config: CoordinatorConfig,
    session: WatchSession,
    recorder: EventRecorder,
    player: Option<Arc<dyn MediaPlayerPort>>,
    transport: Arc<dyn ReportTransportPort>,
    phase: SessionPhase,
    is_playing: bool,
    is_seeking: bool,
    /// 至少播放过一次，末尾检测只在此之后生效
    has_played: bool,
    /// 覆盖累积的起点
    anchor: f64,
}

impl WatchSessionCoordinator {
    pub fn new(
        info: SessionInfo,
        config: CoordinatorConfig,
        player: Option<Arc<dyn MediaPlayerPort>>,
        transport: Arc<dyn ReportTransportPort>,
    ) -> Result<Self, ApplicationError> {
        config.validate()?;
        let session = WatchSession::new(info, config.segment_size_secs)?;
        Ok(Self {
            config,
            session,
            recorder: EventRecorder::new(),
            player,
            transport,
            phase: SessionPhase::Idle,
            is_playing: false,
            is_seeking: false,
            has_played: false,
            anchor: 0.0,
        })
    }

    /// 分发一个信号
    pub fn handle(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::Join => self.join(),
            SessionSignal::Player(event) => self.on_player_event(event),
            SessionSignal::Lifecycle(signal) => self.on_lifecycle(signal),
        }
    }

    pub fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Play => self.play(),
            PlayerEvent::Pause => self.pause(),
            PlayerEvent::Seeking => self.seeking(),
            PlayerEvent::Seeked => self.seeked(),
            PlayerEvent::Ended => self.end(),
        }
    }

    pub fn on_lifecycle(&mut self, signal: LifecycleSignal) {
        if signal.is_departure() {
            self.leave(signal);
        }
    }

    /// 挂载时调用一次
    pub fn join(&mut self) {
        if self.phase != SessionPhase::Idle {
            tracing::debug!(session_id = %self.session_id(), "Already joined, ignoring");
            return;
        }
        self.refresh_duration();
        let position = self.read_position();
        self.anchor = position;
        self.recorder.record(PlaybackEventKind::Join, position, None);
        self.phase = SessionPhase::Joined;

        tracing::info!(
            session_id = %self.session_id(),
            video_id = %self.session.info().video_id,
            position,
            "Watch session joined"
        );
    }

    pub fn play(&mut self) {
        if !self.accepts_signals("play") {
            return;
        }
        self.refresh_duration();
        let position = self.read_position();
        self.is_playing = true;
        self.has_played = true;
        self.anchor = position;
        self.recorder.record(PlaybackEventKind::Play, position, None);
        self.phase = self.active_phase();
    }

    pub fn pause(&mut self) {
        if !self.accepts_signals("pause") {
            return;
        }
        let position = self.read_position();
        // 末尾的暂停交给播完检测处理
        if !self.in_trailing_window(position) {
            self.settle(position);
        }
        self.anchor = position;
        self.recorder.record(PlaybackEventKind::Pause, position, None);
        self.is_playing = false;
        self.phase = self.active_phase();
    }

    pub fn seeking(&mut self) {
        if !self.accepts_signals("seeking") {
            return;
        }
        self.is_seeking = true;
        self.phase = SessionPhase::Seeking;
    }

    pub fn seeked(&mut self) {
        if !self.accepts_signals("seeked") {
            return;
        }
        let from = self.anchor;
        let position = self.read_position();
        self.is_seeking = false;
        self.anchor = position;
        self.recorder
            .record(PlaybackEventKind::Seek, position, Some(json!({ "from": from })));
        self.phase = self.active_phase();

        tracing::debug!(
            session_id = %self.session_id(),
            from,
            to = position,
            "Seek completed"
        );
    }

    /// 定时轮询
    ///
    /// 连续播放不会产生逐秒事件，覆盖主要靠这里累积。
    pub fn poll(&mut self) {
        if self.phase == SessionPhase::Idle || self.phase.is_terminal() {
            return;
        }
        self.refresh_duration();
        let position = self.read_position();

        if self.is_playing && !self.is_seeking {
            let step = self
                .session
                .advance(self.anchor, position, Some(self.config.jitter_threshold_secs));
            if !step.credited && position - self.anchor >= self.config.jitter_threshold_secs {
                tracing::debug!(
                    session_id = %self.session_id(),
                    anchor = self.anchor,
                    position,
                    "Position jumped without seek, not credited"
                );
            }
            self.anchor = step.anchor;
        }

        if self.has_played && !self.is_seeking && self.in_trailing_window(position) {
            tracing::debug!(
                session_id = %self.session_id(),
                position,
                "Near end detected, synthesizing end"
            );
            self.finish(EndCause::NearEnd);
        }
    }

    /// 自然播完
    pub fn end(&mut self) {
        self.finish(EndCause::Natural);
    }

    /// 离开（pagehide / beforeunload / 页面隐藏）
    pub fn leave(&mut self, trigger: LifecycleSignal) {
        if self.session.has_ended() {
            return;
        }
        if !self.accepts_signals(trigger.as_str()) {
            return;
        }
        let position = self.read_position();
        self.settle(position);
        self.recorder.record(
            PlaybackEventKind::Leave,
            position,
            Some(json!({ "trigger": trigger.as_str() })),
        );
        self.is_playing = false;
        self.phase = SessionPhase::Left;

        tracing::info!(
            session_id = %self.session_id(),
            trigger = trigger.as_str(),
            position,
            "Viewer left"
        );
        self.dispatch_report(true);
    }

    fn finish(&mut self, cause: EndCause) {
        if !self.accepts_signals("ended") {
            return;
        }
        if !self.session.mark_ended() {
            return;
        }
        let position = self.read_position();
        if !self.is_seeking {
            self.settle(position);
            // 已经停在末尾时尾部区间为空，不记入
            if let Some(duration) = self.session.total_duration() {
                if position < duration {
                    self.session.mark_range(position, duration);
                }
            }
        }
        self.recorder.record(
            PlaybackEventKind::End,
            position,
            (cause == EndCause::NearEnd).then(|| json!({ "synthesized": true })),
        );
        self.is_playing = false;
        self.phase = SessionPhase::Ended;

        tracing::info!(
            session_id = %self.session_id(),
            cause = ?cause,
            position,
            "Playback ended"
        );
        self.dispatch_report(false);
    }

    /// 唯一的上报出口
    ///
    /// 先置闩锁再调用传输层，同一轮里的重复触发都会在这里被吸收。
    fn dispatch_report(&mut self, is_quit: bool) {
        if !self.session.try_latch_report() {
            tracing::debug!(session_id = %self.session_id(), "Report already dispatched");
            return;
        }
        let report = self.session.build_report(is_quit);

        tracing::info!(
            session_id = %report.session_id,
            watch_rate = report.watch_rate,
            recent_position = report.recent_position,
            is_quit = report.is_quit,
            "Dispatching watch report"
        );
        self.transport.send(&report);
    }

    /// 播放中把锚点到当前位置记入覆盖
    ///
    /// 与轮询使用同一步长上限，没有 seek 事件的跳转同样不记入。
    fn settle(&mut self, position: f64) {
        if !self.is_playing || self.is_seeking {
            return;
        }
        let step = self.session.advance(
            self.anchor,
            position,
            Some(self.config.jitter_threshold_secs),
        );
        if !step.credited && position - self.anchor >= self.config.jitter_threshold_secs {
            tracing::debug!(
                session_id = %self.session_id(),
                anchor = self.anchor,
                position,
                "Position jumped before settle, not credited"
            );
        }
        self.anchor = step.anchor;
    }

    fn accepts_signals(&self, what: &str) -> bool {
        if self.phase == SessionPhase::Idle {
            tracing::debug!(session_id = %self.session_id(), signal = what, "Not joined, ignoring");
            return false;
        }
        if self.phase.is_terminal() {
            tracing::debug!(
                session_id = %self.session_id(),
                signal = what,
                phase = %self.phase,
                "Session terminal, ignoring"
            );
            return false;
        }
        true
    }

    fn in_trailing_window(&self, position: f64) -> bool {
        match self.session.total_duration() {
            Some(duration) => position >= duration - self.config.near_end_window_secs,
            None => false,
        }
    }

    fn active_phase(&self) -> SessionPhase {
        if self.is_seeking {
            SessionPhase::Seeking
        } else if self.is_playing {
            SessionPhase::Playing
        } else if self.has_played {
            SessionPhase::Paused
        } else {
            SessionPhase::Joined
        }
    }

    /// 读取当前位置；播放器缺失时退回最后已知位置
    fn read_position(&mut self) -> f64 {
        match self.player.as_ref().and_then(|p| p.current_position()) {
            Some(position) if position.is_finite() && position >= 0.0 => {
                self.session.update_position(position);
                position
            }
            _ => self.session.last_known_position(),
        }
    }

    fn refresh_duration(&mut self) {
        if self.session.total_duration().is_some() {
            return;
        }
        if let Some(duration) = self.player.as_ref().and_then(|p| p.duration()) {
            self.session.set_duration(duration);
        }
    }

    pub fn attach_player(&mut self, player: Arc<dyn MediaPlayerPort>) {
        self.player = Some(player);
    }

    /// 播放器被销毁后，后续操作退化为使用最后已知位置
    pub fn detach_player(&mut self) {
        self.player = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let coverage = self.session.coverage();
        SessionSnapshot {
            session_id: self.session_id().to_string(),
            phase: self.phase,
            total_duration: self.session.total_duration(),
            last_position: self.session.last_known_position(),
            watch_rate: self.session.watch_rate(),
            watch_segments: self
                .session
                .total_duration()
                .and_then(|d| coverage.to_bitstring(d)),
            covered_segments: coverage.covered_segments().collect(),
            has_ended: self.session.has_ended(),
            has_reported: self.session.has_reported(),
            events: self.recorder.events().to_vec(),
        }
    }

    // Getters
    pub fn session(&self) -> &WatchSession {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.session.info().session_id.as_str()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }
}
