//! Player Adapter - 模拟播放器

mod simulated_player;

pub use simulated_player::SimulatedPlayer;
