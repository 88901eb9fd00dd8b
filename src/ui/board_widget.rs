use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::game::{Board, Move, Player};

/// Read-only picture of a board for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView {
    pub size: usize,
    pub cells: Vec<Option<Player>>,
    pub current_player: Player,
    pub winner: Option<Player>,
    /// Row-major mask of cells on the winning line.
    pub winning: Vec<bool>,
    /// Optional per-cell candidate scores, row-major.
    pub scores: Option<Vec<Option<f32>>>,
    /// Highlighted cell for interactive play.
    pub cursor: Option<(usize, usize)>,
}

impl BoardView {
    pub fn from_board(board: &Board) -> Self {
        let size = board.size();
        let mut winning = vec![false; size * size];
        for m in board.winning_moves() {
            winning[m.y * size + m.x] = true;
        }
        BoardView {
            size,
            cells: board.cells().to_vec(),
            current_player: board.current_player(),
            winner: board.winner(),
            winning,
            scores: None,
            cursor: None,
        }
    }

    /// Attach oracle scores for the given candidates.
    pub fn with_scores(mut self, candidates: &[Move], scores: &[f32]) -> Self {
        let mut grid = vec![None; self.size * self.size];
        for (m, &s) in candidates.iter().zip(scores) {
            grid[m.y * self.size + m.x] = Some(s);
        }
        self.scores = Some(grid);
        self
    }

    pub fn with_cursor(mut self, x: usize, y: usize) -> Self {
        self.cursor = Some((x, y));
        self
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Player> {
        self.cells[y * self.size + x]
    }

    pub fn is_winning(&self, x: usize, y: usize) -> bool {
        self.winning[y * self.size + x]
    }

    fn score(&self, x: usize, y: usize) -> Option<f32> {
        self.scores.as_ref().and_then(|s| s[y * self.size + x])
    }
}

fn player_color(player: Player) -> Color {
    match player {
        Player::X => Color::Cyan,
        Player::O => Color::Magenta,
    }
}

/// Map a score in [0, 1] to a shade from dim to bright green.
fn score_color(score: f32) -> Color {
    let level = (score.clamp(0.0, 1.0) * 200.0) as u8;
    Color::Rgb(0, 55 + level, 0)
}

/// Render a compact board (no borders) into the given area. Winning marks are
/// bold and reversed; empty cells show their score shade when scores exist.
/// The cursor cell is drawn with a yellow background.
pub fn render_board_compact(frame: &mut Frame, view: &BoardView, area: Rect) {
    let mut lines = Vec::with_capacity(view.size);

    for y in 0..view.size {
        let mut spans = Vec::with_capacity(view.size);
        for x in 0..view.size {
            let span = match view.cell(x, y) {
                Some(p) => {
                    let mut style = Style::default().fg(player_color(p));
                    if view.is_winning(x, y) {
                        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                    }
                    Span::styled(format!(" {} ", p.mark()), style)
                }
                None if view.cursor == Some((x, y)) => Span::raw(" + "),
                None => match view.score(x, y) {
                    Some(s) => Span::styled(" \u{00b7} ", Style::default().fg(score_color(s))),
                    None => Span::styled(" . ", Style::default().fg(Color::DarkGray)),
                },
            };
            let span = if view.cursor == Some((x, y)) {
                span.patch_style(Style::default().bg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                span
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_marks_winning_line() {
        let mut board = Board::new(3, 3, Player::X);
        for (x, y, p) in [
            (0, 0, Player::X),
            (0, 1, Player::O),
            (1, 0, Player::X),
            (1, 1, Player::O),
            (2, 0, Player::X),
        ] {
            board.add_move(Move::new(x, y, p));
        }
        let view = BoardView::from_board(&board);

        assert_eq!(view.winner, Some(Player::X));
        assert!(view.is_winning(0, 0) && view.is_winning(1, 0) && view.is_winning(2, 0));
        assert!(!view.is_winning(0, 1));
        assert_eq!(view.cell(1, 1), Some(Player::O));
        assert_eq!(view.cell(2, 2), None);
    }

    #[test]
    fn test_with_scores_places_by_coordinate() {
        let board = Board::new(2, 2, Player::O);
        let candidates = [Move::new(1, 0, Player::O), Move::new(0, 1, Player::O)];
        let view = BoardView::from_board(&board).with_scores(&candidates, &[0.25, 0.75]);

        assert_eq!(view.score(1, 0), Some(0.25));
        assert_eq!(view.score(0, 1), Some(0.75));
        assert_eq!(view.score(0, 0), None);
        assert_eq!(view.current_player, Player::O);
    }

    #[test]
    fn test_cursor_is_drawn_on_empty_cell() {
        use ratatui::{backend::TestBackend, Terminal};

        let mut board = Board::new(3, 3, Player::X);
        board.add_move(Move::new(0, 0, Player::X));
        let view = BoardView::from_board(&board).with_cursor(2, 1);

        let mut terminal = Terminal::new(TestBackend::new(9, 3)).unwrap();
        terminal
            .draw(|f| render_board_compact(f, &view, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let cell = |x: u16, y: u16| &buffer.content[buffer.index_of(x, y)];
        assert_eq!(cell(1, 0).symbol(), "x");
        assert_eq!(cell(7, 1).symbol(), "+");
        assert_eq!(cell(7, 1).bg, Color::Yellow);
        assert_eq!(cell(4, 1).symbol(), ".");
    }

    #[test]
    fn test_score_color_is_monotonic() {
        assert_eq!(score_color(-1.0), Color::Rgb(0, 55, 0));
        assert_eq!(score_color(1.0), Color::Rgb(0, 255, 0));
    }
}
