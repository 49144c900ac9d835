/// Delivery Tests
///
/// 在本地启动一个 axum 接收端，验证上报经 beacon / fetch 通道
/// 到达 `{org_id}/video/{video_id}/leave` 时的线上格式
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use watchtrack::application::{
    CoordinatorConfig, LifecycleSignal, MediaPlayerPort, ReportChannelPort, WatchSessionCoordinator,
};
use watchtrack::domain::session::SessionInfo;
use watchtrack::infrastructure::transport::{
    BeaconConfig, BeaconDispatcher, DeliveryConfig, DeliveryTransport, FetchChannel,
};
use watchtrack::infrastructure::SimulatedPlayer;

#[derive(Debug)]
struct Received {
    org_id: String,
    video_id: String,
    body: serde_json::Value,
}

async fn leave(
    State(tx): State<mpsc::UnboundedSender<Received>>,
    Path((org_id, video_id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) {
    let _ = tx.send(Received {
        org_id,
        video_id,
        body,
    });
}

/// 启动接收端，返回 base_url 和接收队列
async fn start_receiver() -> (String, mpsc::UnboundedReceiver<Received>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/api/:org_id/video/:video_id/leave", post(leave))
        .with_state(tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), rx)
}

/// 播放 25 秒后离开
fn watch_and_leave(transport: Arc<DeliveryTransport>, info: SessionInfo) {
    let player = Arc::new(SimulatedPlayer::new(Some(100.0)));
    let mut coordinator = WatchSessionCoordinator::new(
        info,
        CoordinatorConfig::default(),
        Some(player.clone() as Arc<dyn MediaPlayerPort>),
        transport,
    )
    .unwrap();

    coordinator.join();
    coordinator.play();
    for second in 1..=25 {
        player.seek(second as f64);
        coordinator.poll();
    }
    coordinator.on_lifecycle(LifecycleSignal::PageHide);
    coordinator.on_lifecycle(LifecycleSignal::BeforeUnload);
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Received>) -> Received {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("report not delivered in time")
        .expect("receiver closed")
}

#[tokio::test]
async fn test_beacon_delivers_report() {
    let (base_url, mut rx) = start_receiver().await;
    let info = SessionInfo::new("sess-42", "acme", "intro-video").unwrap();

    let delivery = DeliveryConfig::new(base_url).with_timeout(5);
    let client = delivery.build_client().unwrap();
    let dispatcher = BeaconDispatcher::spawn(client.clone(), BeaconConfig::default());
    let transport = Arc::new(DeliveryTransport::new(
        delivery.leave_url(&info),
        Some(Arc::new(dispatcher.channel()) as Arc<dyn ReportChannelPort>),
        Arc::new(FetchChannel::new(client)),
    ));

    watch_and_leave(transport, info);
    // 会话已经结束，派发器仍负责投递
    dispatcher.shutdown().await;

    let received = next(&mut rx).await;
    assert_eq!(received.org_id, "acme");
    assert_eq!(received.video_id, "intro-video");
    assert_eq!(received.body["session_id"], "sess-42");
    assert_eq!(received.body["watch_rate"], 30);
    assert_eq!(received.body["watch_segments"], "11100000000");
    assert_eq!(received.body["recent_position"], 25.0);
    assert_eq!(received.body["is_quit"], true);

    // 两个离开信号只产生一次上报
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_fetch_fallback_delivers_report() {
    let (base_url, mut rx) = start_receiver().await;
    let info = SessionInfo::new("sess-7", "acme", "v-1").unwrap();

    let delivery = DeliveryConfig::new(base_url);
    let client = delivery.build_client().unwrap();
    let transport = Arc::new(DeliveryTransport::new(
        delivery.leave_url(&info),
        None,
        Arc::new(FetchChannel::new(client)),
    ));

    watch_and_leave(transport, info);

    let received = next(&mut rx).await;
    assert_eq!(received.body["session_id"], "sess-7");
    assert_eq!(received.body["is_quit"], true);
}
