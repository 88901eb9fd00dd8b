use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::event::{self, Event, KeyCode, KeyEvent};
use ratatui::{backend::Backend, Frame, Terminal};
use tracing::{info, warn};

use crate::checkpoint::{BoardParameters, CheckpointManager, CheckpointMetrics};
use crate::error::PlayError;
use crate::game::generator::possible_moves;
use crate::game::{Board, GameOutcome, Move, Placement, Player, Rejection};
use crate::oracle::{ScoringOracle, TrainReport};
use crate::store::BoardStore;
use crate::training::metrics::SelfPlayStats;
use crate::ui::board_widget::BoardView;

/// What keystrokes currently feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Board,
    /// Typing `x y` coordinates.
    Coordinates(String),
    /// Typing a name to save the current board under.
    SaveName(String),
    /// Browsing saved boards.
    Picker { selected: usize },
}

/// Hot-seat Gomoku with a saved-boards picker. Finished games are autosaved
/// and the oracle trains on them.
pub struct App<O: ScoringOracle> {
    board: Board,
    starting_player: Player,
    oracle: O,
    store: BoardStore,
    checkpoints: Option<CheckpointManager>,
    stats: SelfPlayStats,
    last_loss: Option<f32>,
    cursor: (usize, usize),
    mode: InputMode,
    saved: Vec<String>,
    show_scores: bool,
    should_quit: bool,
    message: Option<String>,
}

impl<O: ScoringOracle> App<O> {
    pub fn new(board: Board, oracle: O, store: BoardStore) -> Self {
        let center = board.size() / 2;
        let mut app = App {
            starting_player: board.current_player(),
            board,
            oracle,
            store,
            checkpoints: None,
            stats: SelfPlayStats::default(),
            last_loss: None,
            cursor: (center, center),
            mode: InputMode::Board,
            saved: Vec::new(),
            show_scores: false,
            should_quit: false,
            message: None,
        };
        app.refresh_saved();
        app
    }

    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    /// Continue the lifetime counters of a restored checkpoint.
    pub fn with_stats(mut self, stats: SelfPlayStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn stats(&self) -> SelfPlayStats {
        self.stats
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn saved_names(&self) -> &[String] {
        &self.saved
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Board picture with the cursor and, when enabled, oracle scores.
    pub fn view(&self) -> BoardView {
        let mut view = BoardView::from_board(&self.board);
        if self.show_scores && self.oracle.is_trained() && !self.board.status().is_terminal() {
            let candidates = possible_moves(&self.board);
            let scores = self.oracle.score_all(&self.board, &candidates);
            view = view.with_scores(&candidates, &scores);
        }
        view.with_cursor(self.cursor.0, self.cursor.1)
    }

    /// Main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        super::game_view::render(frame, self);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match std::mem::replace(&mut self.mode, InputMode::Board) {
            InputMode::Board => self.handle_board_key(key.code),
            InputMode::Coordinates(input) => self.handle_coordinates_key(key.code, input),
            InputMode::SaveName(input) => self.handle_save_name_key(key.code, input),
            InputMode::Picker { selected } => self.handle_picker_key(key.code, selected),
        }
    }

    fn handle_board_key(&mut self, code: KeyCode) {
        self.message = None;
        let last = self.board.size() - 1;
        let (x, y) = self.cursor;

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Left => self.cursor.0 = x.saturating_sub(1),
            KeyCode::Right => self.cursor.0 = (x + 1).min(last),
            KeyCode::Up => self.cursor.1 = y.saturating_sub(1),
            KeyCode::Down => self.cursor.1 = (y + 1).min(last),
            KeyCode::Enter | KeyCode::Char(' ') => self.place_at_cursor(),
            KeyCode::Char(':') | KeyCode::Char('m') => {
                self.mode = InputMode::Coordinates(String::new());
            }
            KeyCode::Char('w') => self.mode = InputMode::SaveName(String::new()),
            KeyCode::Char('b') => self.open_picker(),
            KeyCode::Char('r') => self.restart(),
            KeyCode::Char('s') => self.show_scores = !self.show_scores,
            KeyCode::Char('t') => {
                self.message = Some(match self.train_current() {
                    Ok(report) => format!("Trained on this board (loss {:.4})", report.loss),
                    Err(e) => e.to_string(),
                });
            }
            KeyCode::Char('c') => {
                self.message = Some(match self.save_checkpoint() {
                    Ok(Some(path)) => format!("Checkpoint saved to {}", path.display()),
                    Ok(None) => "No checkpoint directory configured".to_string(),
                    Err(e) => e.to_string(),
                });
            }
            _ => {}
        }
    }

    fn handle_coordinates_key(&mut self, code: KeyCode, mut input: String) {
        match code {
            KeyCode::Esc => {}
            KeyCode::Enter => self.submit_coordinates(&input),
            KeyCode::Backspace => {
                input.pop();
                self.mode = InputMode::Coordinates(input);
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ' ' || c == ',' || c == '-' => {
                input.push(c);
                self.mode = InputMode::Coordinates(input);
            }
            _ => self.mode = InputMode::Coordinates(input),
        }
    }

    fn handle_save_name_key(&mut self, code: KeyCode, mut input: String) {
        match code {
            KeyCode::Esc => {}
            KeyCode::Enter => {
                self.message = Some(match self.save_as(&input) {
                    Ok(()) => format!("Saved as {}", input.trim()),
                    Err(e) => e.to_string(),
                });
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = InputMode::SaveName(input);
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = InputMode::SaveName(input);
            }
            _ => self.mode = InputMode::SaveName(input),
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode, selected: usize) {
        let count = self.saved.len();
        let selected = selected.min(count.saturating_sub(1));
        let name = self.saved.get(selected).cloned();

        match (code, name) {
            (KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q'), _) => {}
            (KeyCode::Up, _) => {
                self.mode = InputMode::Picker {
                    selected: selected.saturating_sub(1),
                };
            }
            (KeyCode::Down, _) => {
                self.mode = InputMode::Picker {
                    selected: (selected + 1).min(count.saturating_sub(1)),
                };
            }
            (KeyCode::Enter | KeyCode::Char('l'), Some(name)) => match self.load(&name) {
                Ok(Some(report)) => {
                    self.message = Some(format!("Loaded {name}, trained (loss {:.4})", report.loss));
                }
                Ok(None) => self.message = Some(format!("Loaded {name}")),
                Err(e) => {
                    self.message = Some(e.to_string());
                    self.mode = InputMode::Picker { selected };
                }
            },
            (KeyCode::Char('d'), Some(name)) => {
                self.message = Some(match self.delete(&name) {
                    Ok(true) => format!("Deleted {name}"),
                    Ok(false) => format!("{name} was already gone"),
                    Err(e) => e.to_string(),
                });
                self.mode = InputMode::Picker {
                    selected: selected.min(self.saved.len().saturating_sub(1)),
                };
            }
            _ => self.mode = InputMode::Picker { selected },
        }
    }

    /// Place the current player's mark under the cursor.
    pub fn place_at_cursor(&mut self) {
        let (x, y) = self.cursor;
        self.play(Move::new(x, y, self.board.current_player()));
    }

    /// Place a move typed as `x y` or `x,y`.
    pub fn submit_coordinates(&mut self, input: &str) {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        let [x, y] = parts.as_slice() else {
            self.message = Some(format!("Enter two coordinates as 'x y', got '{}'", input.trim()));
            return;
        };
        match Move::parse(x, y, self.board.current_player()) {
            Ok(m) => {
                if self.board.in_bounds(m.x, m.y) {
                    self.cursor = m.coords();
                }
                self.play(m);
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    fn play(&mut self, m: Move) {
        match self.board.add_move(m) {
            Placement::Rejected(reason) => {
                self.message = Some(rejection_message(reason, &m, &self.board));
            }
            Placement::Placed | Placement::Won(_) => {
                if let Some(outcome) = self.board.status().outcome() {
                    self.finish(outcome);
                }
            }
        }
    }

    /// Autosave the finished board and train the oracle on it.
    fn finish(&mut self, outcome: GameOutcome) {
        let result = match outcome {
            GameOutcome::Winner(p) => format!("{} wins!", p.name()),
            GameOutcome::Draw => "It's a draw!".to_string(),
        };

        let name = autosave_name();
        let saved = match self.store.save(&name, &self.board) {
            Ok(()) => {
                self.refresh_saved();
                format!(" Saved as {name}.")
            }
            Err(e) => {
                warn!(error = %e, name = %name, "failed to autosave finished game");
                " Autosave failed.".to_string()
            }
        };
        let trained = match self.train_current() {
            Ok(report) => format!(" Trained (loss {:.4}).", report.loss),
            Err(e) => format!(" Training failed: {e}"),
        };
        self.message = Some(format!("{result}{saved}{trained} Press 'r' for a new game."));
    }

    /// Train the oracle on the current board, which must be finished.
    pub fn train_current(&mut self) -> Result<TrainReport, PlayError> {
        let report = self.oracle.train(&self.board)?;
        if let Some(outcome) = self.board.status().outcome() {
            self.stats.record(outcome);
        }
        self.last_loss = Some(report.loss);
        info!(
            moves = self.board.move_count(),
            loss = report.loss,
            games_trained = self.oracle.games_trained(),
            "oracle trained on played board"
        );
        Ok(report)
    }

    pub fn restart(&mut self) {
        self.board.restart(self.starting_player);
        self.message = Some("New game started!".to_string());
    }

    pub fn open_picker(&mut self) {
        self.refresh_saved();
        self.mode = InputMode::Picker { selected: 0 };
    }

    pub fn save_as(&mut self, name: &str) -> Result<(), PlayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayError::EmptyName);
        }
        self.store.save(name, &self.board)?;
        self.refresh_saved();
        Ok(())
    }

    /// Replace the board with the one saved under `name`. A finished board is
    /// trained on straight away.
    pub fn load(&mut self, name: &str) -> Result<Option<TrainReport>, PlayError> {
        let board = self.store.load(name)?;
        self.oracle.check_board(&board)?;
        self.board = board;
        let last = self.board.size() - 1;
        self.cursor = (self.cursor.0.min(last), self.cursor.1.min(last));

        if self.board.status().is_terminal() {
            return Ok(Some(self.train_current()?));
        }
        Ok(None)
    }

    pub fn delete(&mut self, name: &str) -> Result<bool, PlayError> {
        let existed = self.store.delete(name)?;
        self.refresh_saved();
        Ok(existed)
    }

    /// Save the oracle. `None` when no checkpoint manager is attached.
    pub fn save_checkpoint(&mut self) -> Result<Option<PathBuf>, PlayError> {
        let Some(manager) = &self.checkpoints else {
            return Ok(None);
        };
        let metrics = CheckpointMetrics {
            x_win_rate: self.stats.x_win_rate(),
            current_loss: self.last_loss,
            games_trained: self.oracle.games_trained(),
            stats: self.stats,
            ..CheckpointMetrics::default()
        };
        let board = BoardParameters {
            size: self.board.size(),
            win_length: self.board.win_length(),
        };
        let path = manager.save_checkpoint(&self.oracle, board, &metrics, self.stats.games)?;
        info!(path = %path.display(), "checkpoint saved from play");
        Ok(Some(path))
    }

    fn refresh_saved(&mut self) {
        match self.store.names() {
            Ok(names) => self.saved = names,
            Err(e) => {
                warn!(error = %e, path = %self.store.path().display(), "cannot list saved boards");
                self.message = Some(e.to_string());
            }
        }
    }
}

fn rejection_message(reason: Rejection, m: &Move, board: &Board) -> String {
    match reason {
        Rejection::OutOfBounds => format!(
            "({}, {}) is off the {}x{} board",
            m.x,
            m.y,
            board.size(),
            board.size()
        ),
        Rejection::Occupied => format!("({}, {}) is already taken", m.x, m.y),
        Rejection::WrongPlayer => format!("It is {}'s turn", board.current_player().name()),
        Rejection::GameOver => "Game over! Press 'r' to restart.".to_string(),
    }
}

fn autosave_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("play-{millis}")
}
