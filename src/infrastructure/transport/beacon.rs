//! Beacon Channel - 抗销毁的主投递通道
//!
//! 负载交给一个独立于会话的后台派发任务，会话宿主被销毁后投递仍会进行。
//! 提交是非阻塞的：队列满、已关闭或负载超限时立即拒绝，由调用方改走后备通道。

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ReportChannelPort, TransportError};

/// Beacon 派发器配置
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// 待投递队列容量
    pub queue_size: usize,
    /// 单个负载的最大字节数
    pub max_payload_bytes: usize,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            queue_size: 64,
            max_payload_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug)]
struct BeaconRequest {
    url: String,
    body: Vec<u8>,
}

/// Beacon 派发器
///
/// 进程级的后台任务，生命周期长于任何单个会话
pub struct BeaconDispatcher {
    sender: mpsc::Sender<BeaconRequest>,
    config: BeaconConfig,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl BeaconDispatcher {
    /// 启动派发任务，必须在 tokio 运行时内调用
    pub fn spawn(client: Client, config: BeaconConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_size.max(1));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(Self::run(client, receiver, shutdown.clone()));

        tracing::info!(
            queue_size = config.queue_size,
            max_payload_bytes = config.max_payload_bytes,
            "Beacon dispatcher started"
        );

        Self {
            sender,
            config,
            shutdown,
            task,
        }
    }

    /// 为会话创建一个投递通道
    pub fn channel(&self) -> BeaconChannel {
        BeaconChannel {
            sender: self.sender.clone(),
            max_payload_bytes: self.config.max_payload_bytes,
        }
    }

    /// 停止接收新负载，投递完已排队的负载后退出
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Beacon dispatcher task failed");
        }
    }

    async fn run(
        client: Client,
        mut receiver: mpsc::Receiver<BeaconRequest>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                request = receiver.recv() => match request {
                    Some(request) => Self::deliver(&client, request).await,
                    None => break,
                },
            }
        }

        // 关闭后仍把已排队的负载投递完
        receiver.close();
        let mut drained = 0usize;
        while let Some(request) = receiver.recv().await {
            Self::deliver(&client, request).await;
            drained += 1;
        }
        tracing::info!(drained, "Beacon dispatcher stopped");
    }

    async fn deliver(client: &Client, request: BeaconRequest) {
        let result = client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %request.url, "Beacon delivered");
            }
            Ok(response) => {
                tracing::warn!(
                    url = %request.url,
                    status = %response.status(),
                    "Beacon rejected by server"
                );
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Beacon delivery failed");
            }
        }
    }
}

/// Beacon 通道
#[derive(Clone)]
pub struct BeaconChannel {
    sender: mpsc::Sender<BeaconRequest>,
    max_payload_bytes: usize,
}

impl ReportChannelPort for BeaconChannel {
    fn name(&self) -> &'static str {
        "beacon"
    }

    fn is_available(&self, payload_len: usize) -> bool {
        !self.sender.is_closed() && payload_len <= self.max_payload_bytes
    }

    fn dispatch(&self, url: &str, body: Vec<u8>) -> Result<(), TransportError> {
        if body.len() > self.max_payload_bytes {
            return Err(TransportError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_payload_bytes,
            });
        }
        self.sender
            .try_send(BeaconRequest {
                url: url.to_string(),
                body,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::Unavailable("beacon queue full"),
                mpsc::error::TrySendError::Closed(_) => {
                    TransportError::Unavailable("beacon dispatcher closed")
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_oversized_payload() {
        let dispatcher = BeaconDispatcher::spawn(
            Client::new(),
            BeaconConfig {
                queue_size: 4,
                max_payload_bytes: 8,
            },
        );
        let channel = dispatcher.channel();

        assert!(channel.is_available(8));
        assert!(!channel.is_available(9));
        assert!(matches!(
            channel.dispatch("http://127.0.0.1:9/leave", vec![0; 16]),
            Err(TransportError::PayloadTooLarge { size: 16, limit: 8 })
        ));

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_unavailable_after_shutdown() {
        let dispatcher = BeaconDispatcher::spawn(Client::new(), BeaconConfig::default());
        let channel = dispatcher.channel();
        dispatcher.shutdown().await;

        assert!(!channel.is_available(10));
        assert!(matches!(
            channel.dispatch("http://127.0.0.1:9/leave", b"{}".to_vec()),
            Err(TransportError::Unavailable(_))
        ));
    }
}
