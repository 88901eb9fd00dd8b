use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::game::{GameOutcome, Player};

/// Lifetime outcome counters. Never windowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfPlayStats {
    pub games: usize,
    pub x_wins: usize,
    pub o_wins: usize,
    pub draws: usize,
}

impl SelfPlayStats {
    pub fn record(&mut self, outcome: GameOutcome) {
        self.games += 1;
        match outcome {
            GameOutcome::Winner(Player::X) => self.x_wins += 1,
            GameOutcome::Winner(Player::O) => self.o_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
    }

    pub fn x_win_rate(&self) -> f32 {
        if self.games == 0 {
            return 0.0;
        }
        self.x_wins as f32 / self.games as f32
    }

    /// X wins per O win, `None` until O has won once.
    pub fn x_to_o_ratio(&self) -> Option<f32> {
        (self.o_wins > 0).then(|| self.x_wins as f32 / self.o_wins as f32)
    }
}

/// One finished game as seen by the rolling window.
#[derive(Debug, Clone, Copy)]
pub struct GameRecord {
    pub outcome: GameOutcome,
    pub length: usize,
}

/// Rolling-window game and training statistics.
pub struct TrainingMetrics {
    games: VecDeque<GameRecord>,
    losses: VecDeque<f32>,
    capacity: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            games: VecDeque::with_capacity(capacity),
            losses: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_game(&mut self, record: GameRecord) {
        push_bounded(&mut self.games, record, self.capacity);
    }

    pub fn record_loss(&mut self, loss: f32) {
        push_bounded(&mut self.losses, loss, self.capacity);
    }

    fn rate(&self, last_n: usize, pred: impl Fn(&GameRecord) -> bool) -> f32 {
        let n = self.games.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self.games.iter().rev().take(n).filter(|&r| pred(r)).count();
        hits as f32 / n as f32
    }

    /// X win rate over the last N games.
    pub fn x_win_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.outcome == GameOutcome::Winner(Player::X))
    }

    pub fn draw_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.outcome == GameOutcome::Draw)
    }

    /// Average final training loss over the last N games, `None` before any
    /// training has happened.
    pub fn average_loss(&self, last_n: usize) -> Option<f32> {
        if self.losses.is_empty() || last_n == 0 {
            return None;
        }
        Some(mean_of_last(&self.losses, last_n, |&l| l as f64))
    }

    pub fn average_game_length(&self, last_n: usize) -> f32 {
        mean_of_last(&self.games, last_n, |r| r.length as f64)
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-game timing tracker for the self-play loop.
pub struct TimingMetrics {
    game_micros: VecDeque<u64>,
    train_micros: VecDeque<u64>,
    capacity: usize,
    window_start: Instant,
    window_count: usize,
    window_overhead_micros: u128, // checkpoint time excluded from throughput
}

impl TimingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TimingMetrics {
            game_micros: VecDeque::with_capacity(capacity),
            train_micros: VecDeque::with_capacity(capacity),
            capacity,
            window_start: Instant::now(),
            window_count: 0,
            window_overhead_micros: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_game_time(&mut self, d: Duration) {
        push_bounded(&mut self.game_micros, d.as_micros() as u64, self.capacity);
        self.window_count += 1;
    }

    pub fn record_train_time(&mut self, d: Duration) {
        push_bounded(&mut self.train_micros, d.as_micros() as u64, self.capacity);
    }

    pub fn record_overhead(&mut self, d: Duration) {
        self.window_overhead_micros += d.as_micros();
    }

    pub fn avg_game_ms(&self, last_n: usize) -> f32 {
        mean_of_last(&self.game_micros, last_n, |&v| v as f64) / 1000.0
    }

    pub fn avg_train_ms(&self, last_n: usize) -> f32 {
        mean_of_last(&self.train_micros, last_n, |&v| v as f64) / 1000.0
    }

    /// Games per second since the last `reset_window`, net of overhead.
    pub fn games_per_sec(&self) -> f32 {
        let total_micros = self.window_start.elapsed().as_micros();
        let net_micros = total_micros.saturating_sub(self.window_overhead_micros);
        if net_micros == 0 {
            return 0.0;
        }
        self.window_count as f32 / (net_micros as f32 / 1_000_000.0)
    }

    pub fn reset_window(&mut self) {
        self.window_start = Instant::now();
        self.window_count = 0;
        self.window_overhead_micros = 0;
    }
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, capacity: usize) {
    queue.push_back(value);
    if queue.len() > capacity {
        queue.pop_front();
    }
}

fn mean_of_last<T>(queue: &VecDeque<T>, last_n: usize, value: impl Fn(&T) -> f64) -> f32 {
    let n = queue.len().min(last_n);
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = queue.iter().rev().take(n).map(value).sum();
    (sum / n as f64) as f32
}
