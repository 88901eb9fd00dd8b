use serde::{Deserialize, Serialize};

use super::{Board, Move, Player, MAX_BOARD_SIZE};
use crate::error::SnapshotError;

/// Serializable record of a board, as kept by the saved-boards store.
///
/// `winner` and `winning_moves` are stored as they were at play time. Older
/// records without `winning_moves` have their result re-derived on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: usize,
    pub win_length: usize,
    pub moves: Vec<Move>,
    #[serde(default)]
    pub current_player: Option<Player>,
    #[serde(default)]
    pub winner: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_moves: Option<Vec<Move>>,
}

impl Board {
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            size: self.size(),
            win_length: self.win_length(),
            moves: self.moves().to_vec(),
            current_player: Some(self.current_player()),
            winner: self.winner(),
            winning_moves: Some(self.winning_moves().to_vec()),
        }
    }

    /// Rebuild a board from a snapshot.
    ///
    /// Moves are placed directly rather than replayed through `add_move`, so
    /// turn order in the record is not enforced; bounds and uniqueness are.
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Board, SnapshotError> {
        if !(1..=MAX_BOARD_SIZE).contains(&snapshot.size) {
            return Err(SnapshotError::InvalidSize(snapshot.size));
        }
        if snapshot.win_length == 0 {
            return Err(SnapshotError::InvalidWinLength(snapshot.win_length));
        }

        let starting = snapshot
            .moves
            .first()
            .map(|m| m.player)
            .unwrap_or(Player::X);
        let mut board = Board::new(snapshot.size, snapshot.win_length, starting);

        for m in &snapshot.moves {
            if !board.in_bounds(m.x, m.y) {
                return Err(SnapshotError::OutOfBounds {
                    x: m.x,
                    y: m.y,
                    size: snapshot.size,
                });
            }
            if board.get(m.x, m.y).is_some() {
                return Err(SnapshotError::DuplicateCoordinate { x: m.x, y: m.y });
            }
            board.occupy(*m);
        }

        let current = snapshot
            .current_player
            .or_else(|| snapshot.moves.last().map(|m| m.player.other()))
            .unwrap_or(Player::X);
        board.set_current_player(current);

        match &snapshot.winning_moves {
            Some(line) => {
                validate_line(&board, snapshot.winner, line)?;
                board.set_result(snapshot.winner, line.clone());
            }
            None => {
                let derived = board.rescan_winner();
                if snapshot.winner.is_some() && derived != snapshot.winner {
                    return Err(SnapshotError::WinnerMismatch {
                        recorded: snapshot.winner,
                        derived,
                    });
                }
            }
        }

        Ok(board)
    }
}

impl TryFrom<&BoardSnapshot> for Board {
    type Error = SnapshotError;

    fn try_from(snapshot: &BoardSnapshot) -> Result<Self, Self::Error> {
        Board::from_snapshot(snapshot)
    }
}

/// A stored winning line must belong to the stored winner and sit on the board.
fn validate_line(board: &Board, winner: Option<Player>, line: &[Move]) -> Result<(), SnapshotError> {
    match winner {
        None if line.is_empty() => Ok(()),
        None => Err(SnapshotError::LineWithoutWinner),
        Some(_) if line.is_empty() => Err(SnapshotError::WinnerWithoutLine),
        Some(w) => {
            for m in line {
                if m.player != w || board.get(m.x, m.y) != Some(w) {
                    return Err(SnapshotError::LineNotOnBoard { x: m.x, y: m.y });
                }
            }
            Ok(())
        }
    }
}
