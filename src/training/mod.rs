//! Self-play infrastructure: the game driver, replay buffer, metrics
//! collection, and dashboard message types for live TUI updates.

pub mod dashboard_msg;
pub mod metrics;
pub mod replay_buffer;
pub mod selfplay;

pub use selfplay::{GameSummary, SelfPlayConfig, SelfPlayDriver, Turn};
