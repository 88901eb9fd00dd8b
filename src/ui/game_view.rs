use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, InputMode};
use super::board_widget;
use crate::game::{GameStatus, Player};
use crate::oracle::ScoringOracle;

const RECENT_MOVES: usize = 10;

pub fn render<O: ScoringOracle>(frame: &mut Frame, app: &App<O>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Board and side panel
            Constraint::Length(3), // Message or input
            Constraint::Length(4), // Controls
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_main(frame, app, chunks[1]);
    render_message(frame, app, chunks[2]);
    render_controls(frame, app.mode(), chunks[3]);
}

fn player_color(player: Player) -> Color {
    match player {
        Player::X => Color::Cyan,
        Player::O => Color::Magenta,
    }
}

fn render_header<O: ScoringOracle>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let board = app.board();
    let (status, color) = match board.status() {
        GameStatus::Ongoing => (
            format!("Current Player: {}", board.current_player().name()),
            player_color(board.current_player()),
        ),
        GameStatus::Won(p) => (format!("{} wins", p.name()), player_color(p)),
        GameStatus::Draw => ("Draw".to_string(), Color::Yellow),
    };
    let oracle = app.oracle();
    let trained = format!("{}: {} games trained", oracle.name(), oracle.games_trained());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(status, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw("  |  "),
        Span::raw(format!("{}x{}, {} in a row", board.size(), board.size(), board.win_length())),
        Span::raw("  |  "),
        Span::raw(trained),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Gomoku"));

    frame.render_widget(header, area);
}

fn render_main<O: ScoringOracle>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let board_width = (app.board().size() * 3 + 2) as u16;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Min(20)])
        .split(area);

    let (x, y) = app.cursor();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Board ({x}, {y})"));
    let inner = block.inner(cols[0]);
    frame.render_widget(block, cols[0]);
    board_widget::render_board_compact(frame, &app.view(), inner);

    match app.mode() {
        InputMode::Picker { selected } => render_picker(frame, app.saved_names(), *selected, cols[1]),
        _ => render_moves(frame, app, cols[1]),
    }
}

fn render_picker(frame: &mut Frame, names: &[String], selected: usize, area: Rect) {
    let lines: Vec<Line> = if names.is_empty() {
        vec![Line::styled("No saved boards", Style::default().fg(Color::DarkGray))]
    } else {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                if i == selected {
                    Line::styled(
                        format!("> {name}"),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Line::raw(format!("  {name}"))
                }
            })
            .collect()
    };

    let picker = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Saved boards ({})", names.len())),
    );
    frame.render_widget(picker, area);
}

fn render_moves<O: ScoringOracle>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let moves = app.board().moves();
    let skip = moves.len().saturating_sub(RECENT_MOVES);
    let mut lines: Vec<Line> = moves
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, m)| {
            Line::from(vec![
                Span::raw(format!("{:>3}. ", i + 1)),
                Span::styled(m.player.name(), Style::default().fg(player_color(m.player))),
                Span::raw(format!(" ({}, {})", m.x, m.y)),
            ])
        })
        .collect();

    let stats = app.stats();
    lines.push(Line::raw(""));
    lines.push(Line::raw(format!(
        "Trained games: {}  X {}  O {}  draws {}",
        stats.games, stats.x_wins, stats.o_wins, stats.draws
    )));
    lines.push(Line::raw(format!("Saved boards: {}", app.saved_names().len())));

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Moves"));
    frame.render_widget(panel, area);
}

fn render_message<O: ScoringOracle>(frame: &mut Frame, app: &App<O>, area: Rect) {
    let (text, color) = match app.mode() {
        InputMode::Coordinates(input) => (format!("Move (x y): {input}_"), Color::Cyan),
        InputMode::SaveName(input) => (format!("Save as: {input}_"), Color::Cyan),
        _ => (app.message().unwrap_or("").to_string(), Color::Yellow),
    };

    let msg_widget = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, mode: &InputMode, area: Rect) {
    let lines = match mode {
        InputMode::Board => vec![
            Line::from("Arrows: Move  |  Enter: Place  |  M: Type coordinates  |  R: Restart  |  Q: Quit"),
            Line::from("W: Save as  |  B: Saved boards  |  T: Train  |  S: Scores  |  C: Checkpoint"),
        ],
        InputMode::Coordinates(_) | InputMode::SaveName(_) => {
            vec![Line::from("Enter: Confirm  |  Backspace: Delete  |  Esc: Cancel")]
        }
        InputMode::Picker { .. } => {
            vec![Line::from("Up/Down: Select  |  Enter/L: Load  |  D: Delete  |  Esc: Back")]
        }
    };

    let controls = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    frame.render_widget(controls, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::game::{Board, Move};
    use crate::oracle::TrainReport;
    use crate::store::BoardStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    struct Untrained;

    impl ScoringOracle for Untrained {
        fn name(&self) -> &str {
            "Untrained"
        }

        fn is_trained(&self) -> bool {
            false
        }

        fn score(&self, _board: &Board, _candidate: &Move) -> f32 {
            0.5
        }

        fn train(&mut self, _board: &Board) -> Result<TrainReport, OracleError> {
            Ok(TrainReport::default())
        }
    }

    fn screen(app: &App<Untrained>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_render_board_and_moves() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path().join("boards.json"));
        let mut app = App::new(Board::new(5, 4, Player::X), Untrained, store);
        app.submit_coordinates("3 4");

        let text = screen(&app);
        assert!(text.contains("Gomoku"));
        assert!(text.contains("Current Player: O"));
        assert!(text.contains("5x5, 4 in a row"));
        assert!(text.contains("1. X (3, 4)"));
        assert!(text.contains("Board (3, 4)"));
    }

    #[test]
    fn test_render_picker_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path().join("boards.json"));
        store.save("first", &Board::new(5, 4, Player::X)).unwrap();
        let mut app = App::new(Board::new(5, 4, Player::X), Untrained, store);

        app.handle_key(KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE));
        let text = screen(&app);
        assert!(text.contains("Saved boards (1)"));
        assert!(text.contains("> first"));

        app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('m'), KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE));
        assert!(screen(&app).contains("Move (x y): 2_"));
    }
}
