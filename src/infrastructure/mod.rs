//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod player;
pub mod replay;
pub mod runtime;
pub mod transport;

pub use player::SimulatedPlayer;
pub use runtime::{MountedSession, SessionHandle, SessionRunner, SessionRunnerConfig};
pub use transport::{BeaconDispatcher, DeliveryConfig, DeliveryTransport, FetchChannel};
