use serde::{Deserialize, Serialize};

use super::Player;

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

impl GameOutcome {
    pub fn winner(self) -> Option<Player> {
        match self {
            GameOutcome::Winner(p) => Some(p),
            GameOutcome::Draw => None,
        }
    }

    /// Training label: 1.0 when X won, 0.0 when O won, 0.5 for a draw.
    pub fn x_value(self) -> f32 {
        match self {
            GameOutcome::Winner(p) => p.value(),
            GameOutcome::Draw => 0.5,
        }
    }
}

/// Where a board sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Won(Player),
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    pub fn outcome(self) -> Option<GameOutcome> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Won(p) => Some(GameOutcome::Winner(p)),
            GameStatus::Draw => Some(GameOutcome::Draw),
        }
    }
}

/// Why a submitted move was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    Occupied,
    WrongPlayer,
    GameOver,
}

/// What `Board::add_move` did with a submitted move.
///
/// Illegal submissions are not errors: the board is left untouched and the
/// reason is reported here so callers that care can check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Rejected(Rejection),
    Placed,
    Won(Player),
}

impl Placement {
    pub fn is_accepted(self) -> bool {
        !matches!(self, Placement::Rejected(_))
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            Placement::Won(p) => Some(p),
            _ => None,
        }
    }
}
