//! Fetch Channel - 后备投递通道
//!
//! 在当前运行时上派生一个普通的异步 POST，不等待结果

use reqwest::Client;
use tokio::runtime::Handle;

use crate::application::ports::{ReportChannelPort, TransportError};

/// Fetch 通道
#[derive(Clone)]
pub struct FetchChannel {
    client: Client,
}

impl FetchChannel {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ReportChannelPort for FetchChannel {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn is_available(&self, _payload_len: usize) -> bool {
        Handle::try_current().is_ok()
    }

    fn dispatch(&self, url: &str, body: Vec<u8>) -> Result<(), TransportError> {
        let handle = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let url = url.to_string();

        handle.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(url = %url, "Report delivered via fetch");
                }
                Ok(response) => {
                    tracing::warn!(url = %url, status = %response.status(), "Report rejected by server");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Report delivery failed");
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_outside_runtime() {
        let channel = FetchChannel::new(Client::new());
        assert!(!channel.is_available(10));
        assert!(matches!(
            channel.dispatch("http://127.0.0.1:9/leave", b"{}".to_vec()),
            Err(TransportError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn test_available_inside_runtime() {
        let channel = FetchChannel::new(Client::new());
        assert!(channel.is_available(10));
    }
}
