//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::CoordinatorConfig;
use crate::infrastructure::runtime::SessionRunnerConfig;
use crate::infrastructure::transport::{BeaconConfig, DeliveryConfig};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 追踪配置
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// 上报投递配置
    #[serde(default)]
    pub transport: TransportConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 追踪配置
///
/// 阈值都是经验值
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// 时间桶宽度（秒）
    #[serde(default = "default_segment_size")]
    pub segment_size_secs: f64,

    /// 轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// 连续播放判定阈值（秒），轮询步长超过它视为跳转
    #[serde(default = "default_jitter_threshold")]
    pub jitter_threshold_secs: f64,

    /// 末尾窗口（秒）
    #[serde(default = "default_near_end_window")]
    pub near_end_window_secs: f64,

    /// 信号缓冲区容量
    #[serde(default = "default_signal_buffer")]
    pub signal_buffer: usize,
}

fn default_segment_size() -> f64 {
    10.0
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_jitter_threshold() -> f64 {
    2.0
}

fn default_near_end_window() -> f64 {
    9.0
}

fn default_signal_buffer() -> usize {
    64
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            segment_size_secs: default_segment_size(),
            poll_interval_ms: default_poll_interval(),
            jitter_threshold_secs: default_jitter_threshold(),
            near_end_window_secs: default_near_end_window(),
            signal_buffer: default_signal_buffer(),
        }
    }
}

impl TrackerConfig {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            segment_size_secs: self.segment_size_secs,
            jitter_threshold_secs: self.jitter_threshold_secs,
            near_end_window_secs: self.near_end_window_secs,
        }
    }

    pub fn runner_config(&self) -> SessionRunnerConfig {
        SessionRunnerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            signal_buffer: self.signal_buffer,
        }
    }
}

/// 上报投递配置
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// 上报服务基础 URL，上报地址为 {base_url}/{org_id}/video/{video_id}/leave
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 是否启用 beacon 主通道
    #[serde(default = "default_beacon_enabled")]
    pub beacon_enabled: bool,

    /// beacon 队列容量
    #[serde(default = "default_beacon_queue_size")]
    pub beacon_queue_size: usize,

    /// beacon 单个负载上限（字节）
    #[serde(default = "default_beacon_max_payload")]
    pub beacon_max_payload_bytes: usize,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_beacon_enabled() -> bool {
    true
}

fn default_beacon_queue_size() -> usize {
    64
}

fn default_beacon_max_payload() -> usize {
    64 * 1024 // 64KB
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            beacon_enabled: default_beacon_enabled(),
            beacon_queue_size: default_beacon_queue_size(),
            beacon_max_payload_bytes: default_beacon_max_payload(),
        }
    }
}

impl TransportConfig {
    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig::new(self.base_url.clone()).with_timeout(self.timeout_secs)
    }

    pub fn beacon_config(&self) -> BeaconConfig {
        BeaconConfig {
            queue_size: self.beacon_queue_size,
            max_payload_bytes: self.beacon_max_payload_bytes,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracker.segment_size_secs, 10.0);
        assert_eq!(config.tracker.poll_interval_ms, 1000);
        assert_eq!(config.transport.base_url, "http://localhost:8080/api");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_runner_config() {
        let config = TrackerConfig {
            poll_interval_ms: 250,
            ..Default::default()
        };
        assert_eq!(config.runner_config().poll_interval, Duration::from_millis(250));
        assert_eq!(config.coordinator_config().near_end_window_secs, 9.0);
    }

    #[test]
    fn test_transport_config() {
        let config = TransportConfig::default();
        assert_eq!(config.beacon_config().max_payload_bytes, 65536);
        assert_eq!(config.delivery_config().timeout_secs, 10);
    }
}
