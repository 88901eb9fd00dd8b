use std::fmt;

use super::{GameStatus, Move, Placement, Player, Rejection};

/// Largest supported side length. Keeps `size * size` cell tables allocatable.
pub const MAX_BOARD_SIZE: usize = 1024;

/// Line directions checked by win detection: horizontal, vertical, and both diagonals.
const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Square five-in-a-row board.
///
/// Moves are kept in play order alongside a `size × size` occupancy table so
/// that owner lookups during win detection and move generation are O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    win_length: usize,
    cells: Vec<Option<Player>>,
    moves: Vec<Move>,
    placed: [usize; 2],
    current_player: Player,
    winner: Option<Player>,
    winning_moves: Vec<Move>,
}

impl Board {
    /// Create an empty board.
    ///
    /// # Panics
    ///
    /// Panics if `size` or `win_length` is zero, or `size` exceeds
    /// [`MAX_BOARD_SIZE`].
    pub fn new(size: usize, win_length: usize, starting_player: Player) -> Self {
        assert!(
            (1..=MAX_BOARD_SIZE).contains(&size),
            "board size must be between 1 and {MAX_BOARD_SIZE}"
        );
        assert!(win_length >= 1, "win length must be at least 1");
        Board {
            size,
            win_length,
            cells: vec![None; size * size],
            moves: Vec::new(),
            placed: [0, 0],
            current_player: starting_player,
            winner: None,
            winning_moves: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    /// Moves in play order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Marks forming the winning line, ordered along the line. Empty unless won.
    pub fn winning_moves(&self) -> &[Move] {
        &self.winning_moves
    }

    /// Occupancy table in row-major order (`y * size + x`).
    pub fn cells(&self) -> &[Option<Player>] {
        &self.cells
    }

    /// Owner of the cell at `(x, y)`, `None` if empty or out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<Player> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.cells[y * self.size + x]
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn is_full(&self) -> bool {
        self.moves.len() == self.size * self.size
    }

    pub fn is_winning_move(&self, x: usize, y: usize) -> bool {
        self.winning_moves.iter().any(|m| m.x == x && m.y == y)
    }

    pub fn status(&self) -> GameStatus {
        if let Some(p) = self.winner {
            GameStatus::Won(p)
        } else if self.is_full() {
            GameStatus::Draw
        } else {
            GameStatus::Ongoing
        }
    }

    /// Check whether `m` would be accepted by `add_move`.
    pub fn is_valid_move(&self, m: &Move) -> bool {
        self.rejection(m).is_none()
    }

    /// Place a move for the current player.
    ///
    /// Illegal moves leave the board untouched and report why; they never
    /// panic or return an error, so a self-play loop can simply retry.
    pub fn add_move(&mut self, m: Move) -> Placement {
        if let Some(reason) = self.rejection(&m) {
            return Placement::Rejected(reason);
        }

        self.occupy(m);
        self.current_player = m.player.other();

        match self.find_line(&m) {
            Some(line) => {
                self.winner = Some(m.player);
                self.winning_moves = line;
                Placement::Won(m.player)
            }
            None => Placement::Placed,
        }
    }

    /// Reset to an empty, ongoing game with `starting_player` to move.
    pub fn restart(&mut self, starting_player: Player) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.moves.clear();
        self.placed = [0, 0];
        self.current_player = starting_player;
        self.winner = None;
        self.winning_moves.clear();
    }

    /// Re-derive the winner from the whole board, e.g. after loading.
    ///
    /// Each move is used as a seed in play order and the first one that sits
    /// on a complete line wins. This is not necessarily the move that ended
    /// the game historically.
    pub fn rescan_winner(&mut self) -> Option<Player> {
        self.winner = None;
        self.winning_moves.clear();

        for i in 0..self.moves.len() {
            let seed = self.moves[i];
            if let Some(line) = self.find_line(&seed) {
                self.winner = Some(seed.player);
                self.winning_moves = line;
                break;
            }
        }

        self.winner
    }

    /// Find a run of at least `win_length` marks through `seed`.
    ///
    /// Directions are tried in `DIRECTIONS` order and the first complete run
    /// is returned, ordered from its negative end to its positive end.
    pub fn find_line(&self, seed: &Move) -> Option<Vec<Move>> {
        if self.get(seed.x, seed.y) != Some(seed.player) {
            return None;
        }
        // Not enough marks on the board to form a line
        if self.placed[player_index(seed.player)] < self.win_length {
            return None;
        }

        for (dx, dy) in DIRECTIONS {
            let mut line = self.walk(seed, -dx, -dy);
            line.reverse();
            line.push(*seed);
            line.extend(self.walk(seed, dx, dy));

            if line.len() >= self.win_length {
                return Some(line);
            }
        }
        None
    }

    /// Contiguous marks of the seed's player starting next to the seed.
    fn walk(&self, seed: &Move, dx: i64, dy: i64) -> Vec<Move> {
        let size = self.size as i64;
        let mut run = Vec::new();
        let mut x = seed.x as i64 + dx;
        let mut y = seed.y as i64 + dy;

        while x >= 0 && x < size && y >= 0 && y < size {
            let (ux, uy) = (x as usize, y as usize);
            if self.cells[uy * self.size + ux] != Some(seed.player) {
                break;
            }
            run.push(Move::new(ux, uy, seed.player));
            x += dx;
            y += dy;
        }
        run
    }

    fn rejection(&self, m: &Move) -> Option<Rejection> {
        if !self.in_bounds(m.x, m.y) {
            Some(Rejection::OutOfBounds)
        } else if self.winner.is_some() {
            Some(Rejection::GameOver)
        } else if self.get(m.x, m.y).is_some() {
            Some(Rejection::Occupied)
        } else if m.player != self.current_player {
            Some(Rejection::WrongPlayer)
        } else {
            None
        }
    }

    /// Record a move without any turn or result bookkeeping. The caller
    /// guarantees the cell is in bounds and empty.
    pub(super) fn occupy(&mut self, m: Move) {
        self.cells[m.y * self.size + m.x] = Some(m.player);
        self.placed[player_index(m.player)] += 1;
        self.moves.push(m);
    }

    pub(super) fn set_current_player(&mut self, player: Player) {
        self.current_player = player;
    }

    pub(super) fn set_result(&mut self, winner: Option<Player>, winning_moves: Vec<Move>) {
        self.winner = winner;
        self.winning_moves = winning_moves;
    }
}

fn player_index(player: Player) -> usize {
    match player {
        Player::X => 0,
        Player::O => 1,
    }
}

impl fmt::Display for Board {
    /// ASCII grid; marks on the winning line are upper-case.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.size {
            write!(f, "{:>2}", x % 100)?;
        }
        writeln!(f)?;

        for y in 0..self.size {
            write!(f, "{:>3}", y % 1000)?;
            for x in 0..self.size {
                let symbol = match self.get(x, y) {
                    Some(p) if self.is_winning_move(x, y) => p.mark().to_ascii_uppercase(),
                    Some(p) => p.mark(),
                    None => '.',
                };
                write!(f, " {symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
