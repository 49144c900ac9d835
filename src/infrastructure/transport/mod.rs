//! Transport Adapter - 上报投递实现

mod beacon;
mod delivery;
mod fetch;

pub use beacon::{BeaconChannel, BeaconConfig, BeaconDispatcher};
pub use delivery::{DeliveryConfig, DeliveryTransport};
pub use fetch::FetchChannel;
