use std::path::PathBuf;

use crate::training::metrics::SelfPlayStats;
use crate::ui::board_widget::BoardView;

/// Per-game statistics snapshot sent from the self-play thread to the dashboard.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub game: usize,
    pub total_games: usize,
    pub stats: SelfPlayStats,
    /// Rolling-window rates; lifetime counts live in `stats`.
    pub x_win_rate: f32,
    pub draw_rate: f32,
    pub loss: f32,
    pub avg_game_length: f32,
    pub games_trained: usize,
    pub oracle: String,
    pub games_per_sec: f32,
    pub avg_game_ms: f32,
    pub avg_train_ms: f32,
}

/// Board position sent while a game is in progress.
#[derive(Debug, Clone)]
pub struct LiveBoard {
    pub view: BoardView,
    pub game: usize,
    pub move_number: usize,
}

/// Updates sent from the self-play thread to the UI.
#[derive(Debug, Clone)]
pub enum SelfPlayUpdate {
    Stats(StatsSnapshot),
    LiveBoard(LiveBoard),
    CheckpointSaved { game: usize, path: PathBuf },
    Finished,
}

/// Commands sent from the UI to the self-play thread.
#[derive(Debug, Clone)]
pub enum SelfPlayCommand {
    SaveCheckpoint,
}
