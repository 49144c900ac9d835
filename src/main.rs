//! Watchtrack - 观看会话追踪
//!
//! 命令:
//! - replay: 回放一段播放轨迹，按配置把上报投递到后端
//! - config: 打印生效的配置

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use watchtrack::application::{ReportChannelPort, ReportTransportPort};
use watchtrack::config::{load_config_from_path, print_config, AppConfig};
use watchtrack::infrastructure::replay::{replay, ReplayTrace};
use watchtrack::infrastructure::transport::{BeaconDispatcher, DeliveryTransport, FetchChannel};

#[derive(Parser)]
#[command(name = "watchtrack")]
#[command(about = "Video watch-session tracker", long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放播放轨迹
    Replay {
        /// 轨迹文件（JSON）
        trace: PathBuf,

        /// 最后一步之后等待的毫秒数
        #[arg(long, default_value_t = 1500)]
        settle_ms: u64,
    },
    /// 打印生效的配置
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    match cli.command {
        Commands::Config => print_config(&config),
        Commands::Replay { trace, settle_ms } => {
            run_replay(&config, &trace, Duration::from_millis(settle_ms)).await?
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},watchtrack={}", config.log.level, config.log.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_replay(config: &AppConfig, path: &Path, settle: Duration) -> anyhow::Result<()> {
    print_config(config);

    let trace = ReplayTrace::from_path(path)?;
    let info = trace.session_info()?;

    let delivery = config.transport.delivery_config();
    let client = delivery.build_client()?;

    // Beacon 派发器独立于会话运行
    let dispatcher = config
        .transport
        .beacon_enabled
        .then(|| BeaconDispatcher::spawn(client.clone(), config.transport.beacon_config()));
    let primary = dispatcher
        .as_ref()
        .map(|d| Arc::new(d.channel()) as Arc<dyn ReportChannelPort>);
    let fallback: Arc<dyn ReportChannelPort> = Arc::new(FetchChannel::new(client));

    let transport: Arc<dyn ReportTransportPort> = Arc::new(DeliveryTransport::new(
        delivery.leave_url(&info),
        primary,
        fallback,
    ));

    let snapshot = replay(
        &trace,
        config.tracker.coordinator_config(),
        config.tracker.runner_config(),
        transport,
        settle,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    // 等待已排队的上报投递完成
    if let Some(dispatcher) = dispatcher {
        dispatcher.shutdown().await;
    }

    tracing::info!(
        session_id = %snapshot.session_id,
        phase = %snapshot.phase,
        watch_rate = snapshot.watch_rate,
        "Replay complete"
    );

    Ok(())
}
