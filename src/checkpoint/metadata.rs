use serde::{Deserialize, Serialize};

use crate::training::metrics::SelfPlayStats;

/// Rolling metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub x_win_rate: f32,
    pub draw_rate: f32,
    pub average_game_length: f32,
    /// Rolling oracle loss, `None` when no game had been trained yet.
    #[serde(default)]
    pub current_loss: Option<f32>,
    pub games_trained: usize,
    #[serde(default)]
    pub stats: SelfPlayStats,
}

/// Board geometry the checkpointed oracle was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardParameters {
    pub size: usize,
    pub win_length: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub game: usize,
    pub timestamp: u64,
    pub oracle: String,
    pub board: BoardParameters,
    pub metrics: CheckpointMetrics,
}
