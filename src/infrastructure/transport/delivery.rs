//! Delivery Transport - 双通道尽力投递
//!
//! 实现 ReportTransportPort：优先 beacon，不可用时退回 fetch。
//! 不重试、不排队、不退避，丢失的上报只记日志。
//!
//! 上报 API:
//! POST {base_url}/{org_id}/video/{video_id}/leave
//! Request: WatchReport (JSON)

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::application::ports::{ReportChannelPort, ReportTransportPort, TransportError};
use crate::domain::session::{SessionInfo, WatchReport};

/// 投递配置
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// 上报服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: 10,
        }
    }
}

impl DeliveryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 创建共享的 HTTP 客户端
    pub fn build_client(&self) -> Result<Client, TransportError> {
        Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    /// 会话的上报地址
    pub fn leave_url(&self, info: &SessionInfo) -> String {
        format!(
            "{}/{}/video/{}/leave",
            self.base_url.trim_end_matches('/'),
            info.org_id,
            info.video_id
        )
    }
}

/// 双通道投递
pub struct DeliveryTransport {
    url: String,
    primary: Option<Arc<dyn ReportChannelPort>>,
    fallback: Arc<dyn ReportChannelPort>,
}

impl DeliveryTransport {
    pub fn new(
        url: impl Into<String>,
        primary: Option<Arc<dyn ReportChannelPort>>,
        fallback: Arc<dyn ReportChannelPort>,
    ) -> Self {
        Self {
            url: url.into(),
            primary,
            fallback,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 按顺序探测通道，交给第一个接受的通道
    fn hand_off(&self, body: Vec<u8>) -> Result<&'static str, TransportError> {
        let channels = self.primary.iter().chain(std::iter::once(&self.fallback));
        let mut last_error = TransportError::Unavailable("no channel available");

        for channel in channels {
            if !channel.is_available(body.len()) {
                tracing::debug!(channel = channel.name(), "Channel unavailable, trying next");
                continue;
            }
            match channel.dispatch(&self.url, body.clone()) {
                Ok(()) => return Ok(channel.name()),
                Err(e) => {
                    tracing::debug!(channel = channel.name(), error = %e, "Channel refused report");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl ReportTransportPort for DeliveryTransport {
    fn send(&self, report: &WatchReport) {
        let body = match serde_json::to_vec(report) {
            Ok(body) => body,
            Err(e) => {
                let e = TransportError::from(e);
                tracing::warn!(
                    session_id = %report.session_id,
                    error = %e,
                    "Failed to encode watch report"
                );
                return;
            }
        };

        match self.hand_off(body) {
            Ok(channel) => {
                tracing::info!(
                    session_id = %report.session_id,
                    channel,
                    url = %self.url,
                    "Watch report handed off"
                );
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %report.session_id,
                    error = %e,
                    "Watch report dropped"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeChannel {
        name: &'static str,
        available: bool,
        accept: bool,
        received: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl FakeChannel {
        fn new(name: &'static str, available: bool, accept: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                available,
                accept,
                received: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    impl ReportChannelPort for FakeChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self, _payload_len: usize) -> bool {
            self.available
        }

        fn dispatch(&self, url: &str, body: Vec<u8>) -> Result<(), TransportError> {
            if !self.accept {
                return Err(TransportError::Unavailable("queue full"));
            }
            self.received.lock().unwrap().push((url.to_string(), body));
            Ok(())
        }
    }

    fn report() -> WatchReport {
        WatchReport {
            session_id: "s-1".to_string(),
            watch_rate: 50,
            watch_segments: "1100".to_string(),
            recent_position: 20.0,
            is_quit: true,
        }
    }

    #[test]
    fn test_leave_url() {
        let info = SessionInfo::new("s-1", "acme", "v-42").unwrap();
        let config = DeliveryConfig::new("http://example.com/api/");
        assert_eq!(
            config.leave_url(&info),
            "http://example.com/api/acme/video/v-42/leave"
        );
    }

    #[test]
    fn test_config_builder() {
        let config = DeliveryConfig::new("http://example.com").with_timeout(3);
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(DeliveryConfig::default().timeout_secs, 10);
    }

    #[test]
    fn test_primary_preferred() {
        let primary = FakeChannel::new("beacon", true, true);
        let fallback = FakeChannel::new("fetch", true, true);
        let transport = DeliveryTransport::new("http://x/leave", Some(primary.clone()), fallback.clone());

        transport.send(&report());

        assert_eq!(primary.count(), 1);
        assert_eq!(fallback.count(), 0);
        let (url, body) = primary.received.lock().unwrap()[0].clone();
        assert_eq!(url, "http://x/leave");
        let decoded: WatchReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(decoded, report());
    }

    #[test]
    fn test_fallback_when_primary_unavailable() {
        let primary = FakeChannel::new("beacon", false, true);
        let fallback = FakeChannel::new("fetch", true, true);
        let transport = DeliveryTransport::new("http://x/leave", Some(primary.clone()), fallback.clone());

        transport.send(&report());

        assert_eq!(primary.count(), 0);
        assert_eq!(fallback.count(), 1);
    }

    #[test]
    fn test_fallback_when_primary_refuses() {
        let primary = FakeChannel::new("beacon", true, false);
        let fallback = FakeChannel::new("fetch", true, true);
        let transport = DeliveryTransport::new("http://x/leave", Some(primary.clone()), fallback.clone());

        transport.send(&report());

        assert_eq!(fallback.count(), 1);
    }

    #[test]
    fn test_no_channel_drops_silently() {
        let fallback = FakeChannel::new("fetch", false, true);
        let transport = DeliveryTransport::new("http://x/leave", None, fallback.clone());

        transport.send(&report());

        assert_eq!(fallback.count(), 0);
    }
}
