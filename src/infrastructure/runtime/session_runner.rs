//! Session Runner - 单任务运行循环
//!
//! 一个 tokio 任务独占协调器，按到达顺序分发播放器事件、生命周期信号和定时轮询。
//! 每个处理器都同步执行完毕，不存在并行访问。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::{SessionSignal, SessionSnapshot, WatchSessionCoordinator};

/// 运行循环配置
#[derive(Debug, Clone)]
pub struct SessionRunnerConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 信号缓冲区容量
    pub signal_buffer: usize,
}

impl Default for SessionRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            signal_buffer: 64,
        }
    }
}

/// 向运行中的会话投递信号
///
/// 可克隆，交给播放器和页面生命周期的监听方
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionSignal>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// 非阻塞投递，卸载路径上不能等待
    ///
    /// 返回信号是否被接收
    pub fn dispatch(&self, signal: impl Into<SessionSignal>) -> bool {
        let signal = signal.into();
        if self.cancel.is_cancelled() {
            tracing::debug!(signal = ?signal, "Session unmounted, dropping signal");
            return false;
        }
        match self.sender.try_send(signal) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(signal = ?signal, error = %e, "Failed to dispatch session signal");
                false
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// 已挂载的会话
pub struct MountedSession {
    handle: SessionHandle,
    task: JoinHandle<WatchSessionCoordinator>,
}

impl MountedSession {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// 卸载：释放定时器和所有监听，返回最终快照
    ///
    /// 卸载本身不会触发上报
    pub async fn unmount(self) -> Option<SessionSnapshot> {
        self.handle.cancel.cancel();
        match self.task.await {
            Ok(coordinator) => Some(coordinator.snapshot()),
            Err(e) => {
                tracing::error!(error = %e, "Session runner task failed");
                None
            }
        }
    }
}

/// 会话运行器
pub struct SessionRunner;

impl SessionRunner {
    /// 挂载会话并启动运行循环，必须在 tokio 运行时内调用
    pub fn mount(
        coordinator: WatchSessionCoordinator,
        config: SessionRunnerConfig,
    ) -> MountedSession {
        let (sender, receiver) = mpsc::channel(config.signal_buffer.max(1));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run(coordinator, receiver, cancel.clone(), config));

        MountedSession {
            handle: SessionHandle { sender, cancel },
            task,
        }
    }

    async fn run(
        mut coordinator: WatchSessionCoordinator,
        mut receiver: mpsc::Receiver<SessionSignal>,
        cancel: CancellationToken,
        config: SessionRunnerConfig,
    ) -> WatchSessionCoordinator {
        coordinator.join();

        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 第一次 tick 立即完成，跳过
        ticker.tick().await;

        tracing::debug!(
            session_id = %coordinator.session_id(),
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            "Session runner started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                signal = receiver.recv() => match signal {
                    Some(signal) => coordinator.handle(signal),
                    None => break,
                },
                _ = ticker.tick() => coordinator.poll(),
            }
        }

        // 卸载前已经到达的信号仍然处理
        receiver.close();
        while let Ok(signal) = receiver.try_recv() {
            coordinator.handle(signal);
        }

        tracing::debug!(
            session_id = %coordinator.session_id(),
            phase = %coordinator.phase(),
            "Session runner stopped"
        );
        coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        CoordinatorConfig, LifecycleSignal, MediaPlayerPort, PlayerEvent, ReportTransportPort,
        Visibility,
    };
    use crate::domain::session::{SessionInfo, SessionPhase, WatchReport};
    use crate::infrastructure::player::SimulatedPlayer;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<WatchReport>>,
    }

    impl ReportTransportPort for RecordingTransport {
        fn send(&self, report: &WatchReport) {
            self.sent.lock().unwrap().push(report.clone());
        }
    }

    fn mount(duration: Option<f64>) -> (MountedSession, Arc<SimulatedPlayer>, Arc<RecordingTransport>) {
        let player = Arc::new(SimulatedPlayer::new(duration));
        let transport = Arc::new(RecordingTransport::default());
        let coordinator = WatchSessionCoordinator::new(
            SessionInfo::new("s-1", "acme", "v-1").unwrap(),
            CoordinatorConfig::default(),
            Some(player.clone() as Arc<dyn MediaPlayerPort>),
            transport.clone(),
        )
        .unwrap();
        let mounted = SessionRunner::mount(coordinator, SessionRunnerConfig::default());
        (mounted, player, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_accumulates_coverage() {
        let (mounted, player, transport) = mount(Some(100.0));
        let handle = mounted.handle();

        player.play();
        assert!(handle.dispatch(PlayerEvent::Play));
        tokio::time::sleep(Duration::from_millis(25_500)).await;

        let snapshot = mounted.unmount().await.unwrap();
        assert_eq!(snapshot.phase, SessionPhase::Playing);
        assert_eq!(snapshot.covered_segments, vec![0, 1, 2]);
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(!handle.is_mounted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_tick_departure_signals_report_once() {
        let (mounted, player, transport) = mount(Some(100.0));
        let handle = mounted.handle();

        player.play();
        handle.dispatch(PlayerEvent::Play);
        tokio::time::sleep(Duration::from_millis(15_500)).await;

        handle.dispatch(LifecycleSignal::PageHide);
        handle.dispatch(LifecycleSignal::VisibilityChange(Visibility::Hidden));
        handle.dispatch(LifecycleSignal::BeforeUnload);
        tokio::task::yield_now().await;

        let snapshot = mounted.unmount().await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_quit);
        assert_eq!(snapshot.phase, SessionPhase::Left);
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_end_without_ended_event() {
        let (mounted, player, transport) = mount(Some(20.0));
        let handle = mounted.handle();

        player.play();
        handle.dispatch(PlayerEvent::Play);
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = mounted.unmount().await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].is_quit);
        assert_eq!(sent[0].watch_rate, 100);
        assert_eq!(snapshot.phase, SessionPhase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_releases_without_report() {
        let (mounted, player, transport) = mount(Some(100.0));
        let handle = mounted.handle();

        player.play();
        handle.dispatch(PlayerEvent::Play);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let snapshot = mounted.unmount().await.unwrap();
        assert!(!snapshot.has_reported);
        assert!(!handle.dispatch(LifecycleSignal::BeforeUnload));
        assert!(transport.sent.lock().unwrap().is_empty());
    }
}
