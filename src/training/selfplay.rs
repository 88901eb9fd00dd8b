use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::checkpoint::{BoardParameters, CheckpointManager, CheckpointMetadata, CheckpointMetrics};
use crate::error::SelfPlayError;
use crate::game::generator::{possible_moves, random_item};
use crate::game::{Board, GameOutcome, Move, Placement, Player};
use crate::oracle::{ScoringOracle, TrainReport};
use crate::store::BoardStore;
use crate::training::dashboard_msg::{LiveBoard, SelfPlayCommand, SelfPlayUpdate, StatsSnapshot};
use crate::training::metrics::{GameRecord, SelfPlayStats, TimingMetrics, TrainingMetrics};
use crate::ui::board_widget::BoardView;

const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Self-play loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    pub num_games: usize,
    pub log_interval: usize,
    /// 0 disables periodic checkpoints.
    pub checkpoint_interval: usize,
    /// Moves between live board updates in dashboard mode.
    pub live_update_interval: usize,
    pub seed: Option<u64>,
    /// Save every finished game to the board store.
    pub autosave: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 1_000,
            log_interval: 100,
            checkpoint_interval: 500,
            live_update_interval: 1,
            seed: None,
            autosave: false,
        }
    }
}

/// Result of a single `step`.
#[derive(Debug, Clone)]
pub enum Turn {
    Moved(Move),
    Finished(GameSummary),
}

/// A finished game, captured before the board is restarted.
#[derive(Debug, Clone)]
pub struct GameSummary {
    /// Lifetime game number, starting at 1.
    pub game: usize,
    pub outcome: GameOutcome,
    pub moves: usize,
    pub starting_player: Player,
    pub winning_moves: Vec<Move>,
    pub final_board: Board,
    pub report: TrainReport,
}

/// Plays the oracle against itself, retraining it after every game.
pub struct SelfPlayDriver<O: ScoringOracle> {
    board: Board,
    oracle: O,
    config: SelfPlayConfig,
    rng: StdRng,
    stats: SelfPlayStats,
    metrics: TrainingMetrics,
    timing: TimingMetrics,
    starting_player: Player,
    game_started: Instant,
    checkpoints: Option<CheckpointManager>,
    store: Option<BoardStore>,
}

impl<O: ScoringOracle> SelfPlayDriver<O> {
    pub fn new(board: Board, oracle: O, config: SelfPlayConfig) -> Result<Self, SelfPlayError> {
        oracle.check_board(&board)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let starting_player = board
            .moves()
            .first()
            .map_or(board.current_player(), |m| m.player);

        Ok(SelfPlayDriver {
            board,
            oracle,
            config,
            rng,
            stats: SelfPlayStats::default(),
            metrics: TrainingMetrics::new(),
            timing: TimingMetrics::new(),
            starting_player,
            game_started: Instant::now(),
            checkpoints: None,
            store: None,
        })
    }

    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    pub fn with_store(mut self, store: BoardStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    pub fn stats(&self) -> SelfPlayStats {
        self.stats
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn timing(&self) -> &TimingMetrics {
        &self.timing
    }

    pub fn board_parameters(&self) -> BoardParameters {
        BoardParameters {
            size: self.board.size(),
            win_length: self.board.win_length(),
        }
    }

    /// Restore the oracle and lifetime counters from the latest checkpoint.
    pub fn resume(&mut self) -> Result<Option<CheckpointMetadata>, SelfPlayError> {
        let Some(manager) = &self.checkpoints else {
            return Ok(None);
        };
        let data = manager.restore_latest(&mut self.oracle)?;
        self.oracle.check_board(&self.board)?;
        if data.metadata.board != self.board_parameters() {
            warn!(
                saved = ?data.metadata.board,
                current = ?self.board_parameters(),
                "checkpoint was trained with different board parameters"
            );
        }
        self.stats = data.metadata.metrics.stats;
        info!(game = data.metadata.game, path = %data.path.display(), "resumed from checkpoint");
        Ok(Some(data.metadata))
    }

    /// Choose the next move: uniform random until the oracle is trained, then
    /// the highest score (first in enumeration order on ties).
    pub fn next_move(&mut self) -> Option<Move> {
        let candidates = possible_moves(&self.board);
        if !self.oracle.is_trained() {
            return random_item(&mut self.rng, &candidates).copied();
        }
        let scores = self.oracle.score_all(&self.board, &candidates);
        best_index(&scores).map(|i| candidates[i])
    }

    /// Play one move, or finish the game when none is possible.
    pub fn step(&mut self) -> Result<Turn, SelfPlayError> {
        if let Some(outcome) = self.board.status().outcome() {
            return self.finish_game(outcome).map(Turn::Finished);
        }

        let Some(candidate) = self.next_move() else {
            return self.finish_game(GameOutcome::Draw).map(Turn::Finished);
        };

        match self.board.add_move(candidate) {
            Placement::Rejected(reason) => Err(SelfPlayError::IllegalMove {
                x: candidate.x,
                y: candidate.y,
                reason,
            }),
            Placement::Won(player) => self
                .finish_game(GameOutcome::Winner(player))
                .map(Turn::Finished),
            Placement::Placed => {
                trace!(x = candidate.x, y = candidate.y, player = %candidate.player, "move");
                Ok(Turn::Moved(candidate))
            }
        }
    }

    pub fn play_game(&mut self) -> Result<GameSummary, SelfPlayError> {
        loop {
            if let Turn::Finished(summary) = self.step()? {
                return Ok(summary);
            }
        }
    }

    /// Train, record the result, autosave, and restart with the other player.
    /// Nothing is recorded when training fails, so the finished board can be
    /// retried without counting the game twice.
    fn finish_game(&mut self, outcome: GameOutcome) -> Result<GameSummary, SelfPlayError> {
        let moves = self.board.move_count();
        let game_time = self.game_started.elapsed();

        let train_started = Instant::now();
        let report = self.oracle.train(&self.board)?;
        self.timing.record_train_time(train_started.elapsed());
        self.timing.record_game_time(game_time);
        self.stats.record(outcome);
        self.metrics.record_game(GameRecord {
            outcome,
            length: moves,
        });
        self.metrics.record_loss(report.loss);

        let game = self.stats.games;
        if self.config.autosave {
            if let Some(store) = &self.store {
                let name = format!("game-{:07}", game);
                if let Err(e) = store.save(&name, &self.board) {
                    warn!(error = %e, name = %name, "failed to autosave finished game");
                }
            }
        }

        let summary = GameSummary {
            game,
            outcome,
            moves,
            starting_player: self.starting_player,
            winning_moves: self.board.winning_moves().to_vec(),
            final_board: self.board.clone(),
            report,
        };
        debug!(
            game,
            outcome = ?outcome,
            moves,
            loss = report.loss,
            iterations = report.iterations,
            "game finished"
        );

        self.starting_player = self.starting_player.other();
        self.board.restart(self.starting_player);
        self.game_started = Instant::now();
        Ok(summary)
    }

    /// Save a checkpoint now. `None` when no checkpoint manager is attached.
    pub fn save_checkpoint(&mut self) -> Result<Option<PathBuf>, SelfPlayError> {
        let Some(manager) = &self.checkpoints else {
            return Ok(None);
        };
        let started = Instant::now();
        let path = manager.save_checkpoint(
            &self.oracle,
            self.board_parameters(),
            &self.checkpoint_metrics(),
            self.stats.games,
        )?;
        self.timing.record_overhead(started.elapsed());
        info!(game = self.stats.games, path = %path.display(), "checkpoint saved");
        Ok(Some(path))
    }

    fn checkpoint_metrics(&self) -> CheckpointMetrics {
        let window = self.window();
        CheckpointMetrics {
            x_win_rate: self.metrics.x_win_rate(window),
            draw_rate: self.metrics.draw_rate(window),
            average_game_length: self.metrics.average_game_length(window),
            current_loss: self.metrics.average_loss(window),
            games_trained: self.oracle.games_trained(),
            stats: self.stats,
        }
    }

    pub fn snapshot(&self, total_games: usize) -> StatsSnapshot {
        let window = self.window();
        StatsSnapshot {
            game: self.stats.games,
            total_games,
            stats: self.stats,
            x_win_rate: self.metrics.x_win_rate(window),
            draw_rate: self.metrics.draw_rate(window),
            loss: self.metrics.average_loss(window).unwrap_or(0.0),
            avg_game_length: self.metrics.average_game_length(window),
            games_trained: self.oracle.games_trained(),
            oracle: self.oracle.name().to_string(),
            games_per_sec: self.timing.games_per_sec(),
            avg_game_ms: self.timing.avg_game_ms(window),
            avg_train_ms: self.timing.avg_train_ms(window),
        }
    }

    /// Current board, with candidate scores once the oracle is trained.
    pub fn live_view(&self) -> BoardView {
        let view = BoardView::from_board(&self.board);
        if !self.oracle.is_trained() || self.board.status().is_terminal() {
            return view;
        }
        let candidates = possible_moves(&self.board);
        let scores = self.oracle.score_all(&self.board, &candidates);
        view.with_scores(&candidates, &scores)
    }

    fn window(&self) -> usize {
        self.config.log_interval.max(1)
    }

    /// Periodic logging and checkpointing. Returns the checkpoint path if one
    /// was written.
    fn after_game(&mut self, total_games: usize) -> Option<PathBuf> {
        let game = self.stats.games;
        if self.config.log_interval > 0 && game % self.config.log_interval == 0 {
            self.log_progress(total_games);
        }
        if self.config.checkpoint_interval == 0 || game % self.config.checkpoint_interval != 0 {
            return None;
        }
        match self.save_checkpoint() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, game, "checkpoint failed");
                None
            }
        }
    }

    fn log_progress(&mut self, total_games: usize) {
        let snap = self.snapshot(total_games);
        info!(
            "Game {}/{} | X {} O {} draw {} | x_win({}): {:.1}% | draw: {:.1}% | loss: {:.4} | avg_len: {:.1} | {:.1} games/s",
            snap.game,
            snap.total_games,
            snap.stats.x_wins,
            snap.stats.o_wins,
            snap.stats.draws,
            self.window(),
            snap.x_win_rate * 100.0,
            snap.draw_rate * 100.0,
            snap.loss,
            snap.avg_game_length,
            snap.games_per_sec,
        );
        self.timing.reset_window();
    }

    /// Play `games` games with periodic logging and checkpointing.
    pub fn run(&mut self, games: usize) -> Result<SelfPlayStats, SelfPlayError> {
        let total_games = self.stats.games + games;
        info!(
            games,
            oracle = self.oracle.name(),
            size = self.board.size(),
            win_length = self.board.win_length(),
            "starting self-play"
        );

        for _ in 0..games {
            self.play_game()?;
            self.after_game(total_games);
        }

        info!(
            games = self.stats.games,
            x_wins = self.stats.x_wins,
            o_wins = self.stats.o_wins,
            draws = self.stats.draws,
            "self-play complete"
        );
        Ok(self.stats)
    }

    /// Like `run`, streaming updates to a dashboard and honouring its pause,
    /// quit, and save requests. Always sends `Finished` before returning.
    pub fn run_with_updates(
        &mut self,
        games: usize,
        update_tx: mpsc::Sender<SelfPlayUpdate>,
        cmd_rx: mpsc::Receiver<SelfPlayCommand>,
        pause: Arc<AtomicBool>,
        quit: Arc<AtomicBool>,
    ) -> Result<SelfPlayStats, SelfPlayError> {
        let total_games = self.stats.games + games;
        let result = self.dashboard_loop(total_games, &update_tx, &cmd_rx, &pause, &quit);
        let _ = update_tx.send(SelfPlayUpdate::Stats(self.snapshot(total_games)));
        let _ = update_tx.send(SelfPlayUpdate::Finished);
        result.map(|_| self.stats)
    }

    fn dashboard_loop(
        &mut self,
        total_games: usize,
        update_tx: &mpsc::Sender<SelfPlayUpdate>,
        cmd_rx: &mpsc::Receiver<SelfPlayCommand>,
        pause: &AtomicBool,
        quit: &AtomicBool,
    ) -> Result<(), SelfPlayError> {
        let live_every = self.config.live_update_interval.max(1);

        while self.stats.games < total_games {
            self.handle_commands(cmd_rx, update_tx);
            while pause.load(Ordering::Relaxed) && !quit.load(Ordering::Relaxed) {
                std::thread::sleep(PAUSE_POLL);
                self.handle_commands(cmd_rx, update_tx);
            }
            if quit.load(Ordering::Relaxed) {
                info!(game = self.stats.games, "self-play stopped");
                return Ok(());
            }

            match self.step()? {
                Turn::Moved(_) => {
                    let move_number = self.board.move_count();
                    if move_number % live_every == 0 {
                        let _ = update_tx.send(SelfPlayUpdate::LiveBoard(LiveBoard {
                            view: self.live_view(),
                            game: self.stats.games + 1,
                            move_number,
                        }));
                    }
                }
                Turn::Finished(summary) => {
                    let _ = update_tx.send(SelfPlayUpdate::LiveBoard(LiveBoard {
                        view: BoardView::from_board(&summary.final_board),
                        game: summary.game,
                        move_number: summary.moves,
                    }));
                    let _ = update_tx.send(SelfPlayUpdate::Stats(self.snapshot(total_games)));
                    if let Some(path) = self.after_game(total_games) {
                        let _ = update_tx.send(SelfPlayUpdate::CheckpointSaved {
                            game: summary.game,
                            path,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_commands(
        &mut self,
        cmd_rx: &mpsc::Receiver<SelfPlayCommand>,
        update_tx: &mpsc::Sender<SelfPlayUpdate>,
    ) {
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                SelfPlayCommand::SaveCheckpoint => match self.save_checkpoint() {
                    Ok(Some(path)) => {
                        let _ = update_tx.send(SelfPlayUpdate::CheckpointSaved {
                            game: self.stats.games,
                            path,
                        });
                    }
                    Ok(None) => warn!("checkpoint requested but no checkpoint directory is configured"),
                    Err(e) => warn!(error = %e, "checkpoint failed"),
                },
            }
        }
    }
}

/// Index of the highest score, first on ties. NaN never wins over a number.
fn best_index(scores: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(b) if score > scores[b] || (scores[b].is_nan() && !score.is_nan()) => {
                best = Some(i)
            }
            Some(_) => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointManagerConfig;
    use crate::error::OracleError;
    use std::path::Path;

    /// Plays a fixed sequence of coordinates by scoring the scripted cell for
    /// the current move number highest. Counts training calls.
    struct ScriptedOracle {
        script: Vec<(usize, usize)>,
        trained: bool,
        train_calls: usize,
        failing_trains: usize,
        size: usize,
    }

    impl ScriptedOracle {
        fn new(size: usize, script: &[(usize, usize)]) -> Self {
            ScriptedOracle {
                script: script.to_vec(),
                trained: true,
                train_calls: 0,
                failing_trains: 0,
                size,
            }
        }

        fn untrained(size: usize) -> Self {
            ScriptedOracle {
                trained: false,
                ..Self::new(size, &[])
            }
        }
    }

    impl ScoringOracle for ScriptedOracle {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn is_trained(&self) -> bool {
            self.trained
        }

        fn score(&self, board: &Board, candidate: &Move) -> f32 {
            let scripted = self.script.get(board.move_count()).copied();
            if scripted == Some(candidate.coords()) {
                1.0
            } else {
                0.0
            }
        }

        fn train(&mut self, board: &Board) -> Result<TrainReport, OracleError> {
            board.status().outcome().ok_or(OracleError::UnfinishedGame)?;
            if self.failing_trains > 0 {
                self.failing_trains -= 1;
                return Err(OracleError::Weights("disk full".to_string()));
            }
            self.train_calls += 1;
            Ok(TrainReport {
                loss: 0.1,
                iterations: 1,
                samples: board.move_count(),
            })
        }

        fn check_board(&self, board: &Board) -> Result<(), OracleError> {
            if board.size() != self.size {
                return Err(OracleError::BoardSizeMismatch {
                    expected: self.size,
                    actual: board.size(),
                });
            }
            Ok(())
        }

        fn games_trained(&self) -> usize {
            self.train_calls
        }

        fn save_to_dir(&self, dir: &Path) -> Result<(), OracleError> {
            std::fs::write(dir.join("scripted.txt"), self.train_calls.to_string())?;
            Ok(())
        }
    }

    const DRAW: [(usize, usize); 9] = [
        (0, 0),
        (1, 1),
        (2, 0),
        (1, 0),
        (1, 2),
        (0, 2),
        (0, 1),
        (2, 1),
        (2, 2),
    ];

    const DIAGONAL: [(usize, usize); 5] = [(0, 0), (0, 1), (1, 1), (0, 2), (2, 2)];

    fn config() -> SelfPlayConfig {
        SelfPlayConfig {
            log_interval: 1,
            checkpoint_interval: 0,
            seed: Some(3),
            ..SelfPlayConfig::default()
        }
    }

    fn driver(oracle: ScriptedOracle) -> SelfPlayDriver<ScriptedOracle> {
        SelfPlayDriver::new(Board::new(3, 3, Player::X), oracle, config()).unwrap()
    }

    #[test]
    fn test_failed_training_is_retried_without_double_counting() {
        let mut d = driver(ScriptedOracle {
            failing_trains: 1,
            ..ScriptedOracle::new(3, &DIAGONAL)
        });

        assert!(matches!(
            d.play_game(),
            Err(SelfPlayError::Oracle(OracleError::Weights(_)))
        ));
        assert_eq!(d.stats().games, 0);
        assert!(d.metrics().average_loss(10).is_none());
        assert_eq!(d.board().winner(), Some(Player::X));

        let summary = d.play_game().unwrap();
        assert_eq!(summary.game, 1);
        assert_eq!(summary.outcome, GameOutcome::Winner(Player::X));
        assert_eq!(d.stats().games, 1);
        assert_eq!(d.stats().x_wins, 1);
        assert_eq!(d.oracle().train_calls, 1);
    }

    #[test]
    fn test_scripted_win_is_detected() {
        let mut d = driver(ScriptedOracle::new(3, &DIAGONAL));
        let summary = d.play_game().unwrap();

        assert_eq!(summary.outcome, GameOutcome::Winner(Player::X));
        assert_eq!(summary.moves, 5);
        let mut line: Vec<_> = summary.winning_moves.iter().map(|m| m.coords()).collect();
        line.sort();
        assert_eq!(line, vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(d.stats().x_wins, 1);
        assert_eq!(d.oracle().train_calls, 1);
    }

    #[test]
    fn test_full_board_without_line_is_a_draw() {
        let mut d = driver(ScriptedOracle::new(3, &DRAW));
        let summary = d.play_game().unwrap();

        assert_eq!(summary.outcome, GameOutcome::Draw);
        assert_eq!(summary.moves, 9);
        assert!(summary.winning_moves.is_empty());
        assert!(possible_moves(&summary.final_board).is_empty());
        assert_eq!(d.stats().draws, 1);
        assert_eq!(d.stats().games, 1);
        assert_eq!(d.oracle().train_calls, 1);
    }

    #[test]
    fn test_untrained_oracle_plays_legal_random_moves() {
        let mut d = driver(ScriptedOracle::untrained(3));
        for _ in 0..50 {
            let m = d.next_move().unwrap();
            assert!(d.board().is_valid_move(&m));
        }

        let summary = d.play_game().unwrap();
        assert!(summary.moves >= 5 && summary.moves <= 9);
        assert_eq!(summary.final_board.moves().len(), summary.moves);
    }

    #[test]
    fn test_ties_pick_first_candidate() {
        let mut d = driver(ScriptedOracle::new(3, &[]));
        assert_eq!(d.next_move(), Some(Move::new(0, 0, Player::X)));
    }

    #[test]
    fn test_restart_alternates_starting_player() {
        let mut d = driver(ScriptedOracle::new(3, &DRAW));
        let first = d.play_game().unwrap();
        assert_eq!(first.starting_player, Player::X);
        assert_eq!(d.board().move_count(), 0);
        assert_eq!(d.board().current_player(), Player::O);
        assert_eq!(d.board().winner(), None);

        let second = d.play_game().unwrap();
        assert_eq!(second.starting_player, Player::O);
        assert_eq!(second.final_board.moves()[0].player, Player::O);
        assert_eq!(d.board().current_player(), Player::X);
    }

    #[test]
    fn test_finished_board_is_closed_out_on_first_step() {
        let mut board = Board::new(3, 3, Player::X);
        for (i, &(x, y)) in DIAGONAL.iter().enumerate() {
            let p = if i % 2 == 0 { Player::X } else { Player::O };
            board.add_move(Move::new(x, y, p));
        }
        let mut d = SelfPlayDriver::new(board, ScriptedOracle::new(3, &[]), config()).unwrap();

        match d.step().unwrap() {
            Turn::Finished(summary) => assert_eq!(summary.outcome, GameOutcome::Winner(Player::X)),
            Turn::Moved(m) => panic!("expected finished game, moved {m:?}"),
        }
    }

    #[test]
    fn test_board_size_mismatch_rejected() {
        let result = SelfPlayDriver::new(Board::new(4, 3, Player::X), ScriptedOracle::new(3, &[]), config());
        assert!(matches!(
            result,
            Err(SelfPlayError::Oracle(OracleError::BoardSizeMismatch { .. }))
        ));
    }

    #[test]
    fn test_run_trains_once_per_game() {
        let mut d = driver(ScriptedOracle::new(3, &DRAW));
        let stats = d.run(4).unwrap();

        assert_eq!(stats.games, 4);
        assert_eq!(stats.draws, 4);
        assert_eq!(d.oracle().train_calls, 4);
        assert!((d.metrics().draw_rate(10) - 1.0).abs() < 1e-6);
        assert!((d.metrics().average_game_length(10) - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_autosave_writes_each_game() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path().join("boards.json"));
        let mut d = SelfPlayDriver::new(
            Board::new(3, 3, Player::X),
            ScriptedOracle::new(3, &DIAGONAL),
            SelfPlayConfig {
                autosave: true,
                ..config()
            },
        )
        .unwrap()
        .with_store(store);

        d.run(2).unwrap();

        let store = BoardStore::open(dir.path().join("boards.json"));
        assert_eq!(store.names().unwrap(), vec!["game-0000001", "game-0000002"]);
        assert_eq!(store.load("game-0000001").unwrap().winner(), Some(Player::X));
    }

    #[test]
    fn test_periodic_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            keep_last_n: 10,
            keep_best_n: 10,
        });
        let mut d = SelfPlayDriver::new(
            Board::new(3, 3, Player::X),
            ScriptedOracle::new(3, &DRAW),
            SelfPlayConfig {
                checkpoint_interval: 2,
                ..config()
            },
        )
        .unwrap()
        .with_checkpoints(manager);

        d.run(4).unwrap();

        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            ..CheckpointManagerConfig::default()
        });
        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|c| c.metadata.game)
            .collect();
        assert_eq!(games, vec![2, 4]);
        let latest = manager.load_latest().unwrap();
        assert_eq!(latest.metadata.metrics.stats.draws, 4);
        assert!(latest.path.join("scripted.txt").exists());
        assert_eq!(latest.metadata.metrics.current_loss, Some(0.1));
    }

    #[test]
    fn test_checkpoint_before_training_has_no_loss() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            ..CheckpointManagerConfig::default()
        });
        let mut d = driver(ScriptedOracle::new(3, &DIAGONAL)).with_checkpoints(manager);

        let path = d.save_checkpoint().unwrap().unwrap();
        let json = std::fs::read_to_string(path.join("metadata.json")).unwrap();
        let metadata: CheckpointMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata.metrics.current_loss, None);
        assert_eq!(d.snapshot(1).loss, 0.0);
    }

    #[test]
    fn test_run_with_updates_streams_and_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            ..CheckpointManagerConfig::default()
        });
        let mut d = driver(ScriptedOracle::new(3, &DIAGONAL)).with_checkpoints(manager);

        let (update_tx, update_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        cmd_tx.send(SelfPlayCommand::SaveCheckpoint).unwrap();
        let pause = Arc::new(AtomicBool::new(false));
        let quit = Arc::new(AtomicBool::new(false));

        let stats = d.run_with_updates(2, update_tx, cmd_rx, pause, quit).unwrap();
        assert_eq!(stats.games, 2);

        let updates: Vec<SelfPlayUpdate> = update_rx.try_iter().collect();
        assert!(matches!(updates.last(), Some(SelfPlayUpdate::Finished)));
        assert!(updates
            .iter()
            .any(|u| matches!(u, SelfPlayUpdate::CheckpointSaved { game: 0, .. })));
        let live = updates
            .iter()
            .filter(|u| matches!(u, SelfPlayUpdate::LiveBoard(_)))
            .count();
        assert!(live >= 10);
        let finished_view = updates.iter().find_map(|u| match u {
            SelfPlayUpdate::LiveBoard(l) if l.view.winner.is_some() => Some(l),
            _ => None,
        });
        assert_eq!(finished_view.map(|l| l.move_number), Some(5));
    }

    #[test]
    fn test_run_with_updates_honours_quit() {
        let mut d = driver(ScriptedOracle::new(3, &DRAW));
        let (update_tx, update_rx) = mpsc::channel();
        let (_cmd_tx, cmd_rx) = mpsc::channel();
        let quit = Arc::new(AtomicBool::new(true));

        let stats = d
            .run_with_updates(5, update_tx, cmd_rx, Arc::new(AtomicBool::new(false)), quit)
            .unwrap();
        assert_eq!(stats.games, 0);
        assert_eq!(d.oracle().train_calls, 0);
        let updates: Vec<SelfPlayUpdate> = update_rx.try_iter().collect();
        assert!(matches!(updates.last(), Some(SelfPlayUpdate::Finished)));
    }

    #[test]
    fn test_best_index() {
        assert_eq!(best_index(&[]), None);
        assert_eq!(best_index(&[0.2, 0.9, 0.9, 0.1]), Some(1));
        assert_eq!(best_index(&[f32::NAN, 0.3]), Some(1));
    }
}
