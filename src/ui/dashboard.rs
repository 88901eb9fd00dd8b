use std::collections::VecDeque;

use crate::training::dashboard_msg::{LiveBoard, SelfPlayUpdate, StatsSnapshot};
use crate::training::metrics::SelfPlayStats;
use crate::ui::board_widget::BoardView;

const MAX_HISTORY: usize = 500;

/// Status of the self-play run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Paused,
    Finished,
}

/// Dashboard state holding history buffers and current values.
pub struct DashboardState {
    // (game, value)
    pub x_win_rate_history: VecDeque<(f64, f64)>,
    pub draw_rate_history: VecDeque<(f64, f64)>,
    pub loss_history: VecDeque<(f64, f64)>,
    pub game_length_history: VecDeque<u64>,

    pub game: usize,
    pub total_games: usize,
    pub stats: SelfPlayStats,
    pub x_win_rate: f32,
    pub draw_rate: f32,
    pub loss: f32,
    pub avg_game_length: f32,
    pub games_trained: usize,
    pub oracle: String,
    pub games_per_sec: f32,
    pub avg_game_ms: f32,
    pub avg_train_ms: f32,

    pub live_board: Option<BoardView>,
    pub live_game: usize,
    pub live_move_number: usize,

    pub status: RunStatus,
    pub last_checkpoint: Option<String>,
}

impl DashboardState {
    pub fn new(total_games: usize) -> Self {
        DashboardState {
            x_win_rate_history: VecDeque::new(),
            draw_rate_history: VecDeque::new(),
            loss_history: VecDeque::new(),
            game_length_history: VecDeque::new(),

            game: 0,
            total_games,
            stats: SelfPlayStats::default(),
            x_win_rate: 0.0,
            draw_rate: 0.0,
            loss: 0.0,
            avg_game_length: 0.0,
            games_trained: 0,
            oracle: String::new(),
            games_per_sec: 0.0,
            avg_game_ms: 0.0,
            avg_train_ms: 0.0,

            live_board: None,
            live_game: 0,
            live_move_number: 0,

            status: RunStatus::Running,
            last_checkpoint: None,
        }
    }

    pub fn apply(&mut self, update: SelfPlayUpdate) {
        match update {
            SelfPlayUpdate::Stats(snap) => self.apply_stats(&snap),
            SelfPlayUpdate::LiveBoard(live) => self.apply_live(live),
            SelfPlayUpdate::CheckpointSaved { game, path } => {
                self.last_checkpoint = Some(format!("game {} ({})", game, path.display()));
            }
            SelfPlayUpdate::Finished => self.status = RunStatus::Finished,
        }
    }

    /// Apply a stats snapshot. History only grows when the game count moves.
    pub fn apply_stats(&mut self, snap: &StatsSnapshot) {
        let new_game = snap.game != self.game || self.loss_history.is_empty();

        self.game = snap.game;
        self.total_games = snap.total_games;
        self.stats = snap.stats;
        self.x_win_rate = snap.x_win_rate;
        self.draw_rate = snap.draw_rate;
        self.loss = snap.loss;
        self.avg_game_length = snap.avg_game_length;
        self.games_trained = snap.games_trained;
        self.oracle = snap.oracle.clone();
        self.games_per_sec = snap.games_per_sec;
        self.avg_game_ms = snap.avg_game_ms;
        self.avg_train_ms = snap.avg_train_ms;

        if !new_game || snap.game == 0 {
            return;
        }
        let g = snap.game as f64;
        push_capped(&mut self.x_win_rate_history, (g, snap.x_win_rate as f64));
        push_capped(&mut self.draw_rate_history, (g, snap.draw_rate as f64));
        push_capped(&mut self.loss_history, (g, snap.loss as f64));
        push_capped(&mut self.game_length_history, snap.avg_game_length as u64);
    }

    fn apply_live(&mut self, live: LiveBoard) {
        self.live_board = Some(live.view);
        self.live_game = live.game;
        self.live_move_number = live.move_number;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.status = match self.status {
            RunStatus::Running => RunStatus::Paused,
            RunStatus::Paused => RunStatus::Running,
            RunStatus::Finished => RunStatus::Finished,
        };
        self.status == RunStatus::Paused
    }

    /// Progress ratio [0.0, 1.0].
    pub fn progress(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        self.game as f64 / self.total_games as f64
    }
}

fn push_capped<T>(history: &mut VecDeque<T>, value: T) {
    history.push_back(value);
    if history.len() > MAX_HISTORY {
        history.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Player};
    use std::path::PathBuf;

    fn snap(game: usize) -> StatsSnapshot {
        StatsSnapshot {
            game,
            total_games: 1000,
            x_win_rate: 0.55,
            draw_rate: 0.05,
            loss: 0.08,
            avg_game_length: 42.0,
            games_trained: game,
            oracle: "ValueNet".to_string(),
            ..StatsSnapshot::default()
        }
    }

    #[test]
    fn test_apply_stats_updates_fields() {
        let mut state = DashboardState::new(10);
        state.apply_stats(&snap(100));

        assert_eq!(state.game, 100);
        assert_eq!(state.total_games, 1000);
        assert!((state.x_win_rate - 0.55).abs() < 1e-6);
        assert!((state.loss - 0.08).abs() < 1e-6);
        assert_eq!(state.oracle, "ValueNet");
        assert_eq!(state.x_win_rate_history.len(), 1);
        assert_eq!(state.game_length_history.len(), 1);
    }

    #[test]
    fn test_repeated_snapshot_does_not_grow_history() {
        let mut state = DashboardState::new(10);
        state.apply_stats(&snap(5));
        state.apply_stats(&snap(5));
        assert_eq!(state.loss_history.len(), 1);
    }

    #[test]
    fn test_history_caps_at_500() {
        let mut state = DashboardState::new(10_000);
        for i in 1..=600 {
            state.apply_stats(&snap(i));
        }
        assert_eq!(state.x_win_rate_history.len(), 500);
        assert_eq!(state.loss_history.len(), 500);
        assert_eq!(state.game_length_history.len(), 500);
    }

    #[test]
    fn test_apply_messages() {
        let mut state = DashboardState::new(10);
        state.apply(SelfPlayUpdate::LiveBoard(LiveBoard {
            view: BoardView::from_board(&Board::new(5, 4, Player::O)),
            game: 3,
            move_number: 7,
        }));
        state.apply(SelfPlayUpdate::CheckpointSaved {
            game: 3,
            path: PathBuf::from("checkpoints/checkpoint_0000003"),
        });
        state.apply(SelfPlayUpdate::Finished);

        assert_eq!(state.live_board.as_ref().map(|v| v.size), Some(5));
        assert_eq!(state.live_move_number, 7);
        assert!(state.last_checkpoint.as_deref().unwrap().starts_with("game 3"));
        assert_eq!(state.status, RunStatus::Finished);
    }

    #[test]
    fn test_toggle_pause() {
        let mut state = DashboardState::new(10);
        assert!(state.toggle_pause());
        assert!(!state.toggle_pause());
        state.status = RunStatus::Finished;
        assert!(!state.toggle_pause());
    }

    #[test]
    fn test_progress() {
        let mut state = DashboardState::new(1000);
        assert!((state.progress() - 0.0).abs() < 1e-6);
        state.game = 500;
        assert!((state.progress() - 0.5).abs() < 1e-6);
    }
}
