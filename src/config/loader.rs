//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（watchtrack.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["watchtrack", "watchtrack.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `WATCHTRACK_`，层级分隔符 `__`）
/// 2. 配置文件（watchtrack.toml 或 watchtrack.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `WATCHTRACK_TRACKER__SEGMENT_SIZE_SECS=5`
/// - `WATCHTRACK_TRACKER__NEAR_END_WINDOW_SECS=12`
/// - `WATCHTRACK_TRANSPORT__BASE_URL=https://api.example.com`
/// - `WATCHTRACK_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("tracker.segment_size_secs", 10.0)?
        .set_default("tracker.poll_interval_ms", 1000)?
        .set_default("tracker.jitter_threshold_secs", 2.0)?
        .set_default("tracker.near_end_window_secs", 9.0)?
        .set_default("tracker.signal_buffer", 64)?
        .set_default("transport.base_url", "http://localhost:8080/api")?
        .set_default("transport.timeout_secs", 10)?
        .set_default("transport.beacon_enabled", true)?
        .set_default("transport.beacon_queue_size", 64)?
        .set_default("transport.beacon_max_payload_bytes", 64 * 1024)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量
    builder = builder.add_source(
        Environment::with_prefix("WATCHTRACK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let tracker = &config.tracker;

    if !(tracker.segment_size_secs.is_finite() && tracker.segment_size_secs > 0.0) {
        return Err(ConfigError::ValidationError(
            "Segment size must be positive".to_string(),
        ));
    }

    if tracker.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Poll interval cannot be 0".to_string(),
        ));
    }

    if !(tracker.jitter_threshold_secs.is_finite() && tracker.jitter_threshold_secs > 0.0) {
        return Err(ConfigError::ValidationError(
            "Jitter threshold must be positive".to_string(),
        ));
    }

    if !(tracker.near_end_window_secs.is_finite() && tracker.near_end_window_secs >= 0.0) {
        return Err(ConfigError::ValidationError(
            "Near-end window cannot be negative".to_string(),
        ));
    }

    if config.transport.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Transport base URL cannot be empty".to_string(),
        ));
    }

    if config.transport.beacon_enabled && config.transport.beacon_queue_size == 0 {
        return Err(ConfigError::ValidationError(
            "Beacon queue size cannot be 0 when beacon is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Watch Tracker Configuration ===");
    tracing::info!("Segment Size: {}s", config.tracker.segment_size_secs);
    tracing::info!("Poll Interval: {}ms", config.tracker.poll_interval_ms);
    tracing::info!("Jitter Threshold: {}s", config.tracker.jitter_threshold_secs);
    tracing::info!("Near-End Window: {}s", config.tracker.near_end_window_secs);
    tracing::info!("Report Base URL: {}", config.transport.base_url);
    tracing::info!("Transport Timeout: {}s", config.transport.timeout_secs);
    tracing::info!("Beacon Enabled: {}", config.transport.beacon_enabled);
    if config.transport.beacon_enabled {
        tracing::info!("Beacon Queue Size: {}", config.transport.beacon_queue_size);
        tracing::info!(
            "Beacon Max Payload: {} bytes",
            config.transport.beacon_max_payload_bytes
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("===================================");
}
