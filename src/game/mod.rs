//! Core five-in-a-row game logic: board state machine with win detection,
//! players and moves, legal move generation, and serializable snapshots.

mod board;
pub mod generator;
mod moves;
mod player;
mod snapshot;
mod state;

pub use board::{Board, MAX_BOARD_SIZE};
pub use moves::Move;
pub use player::Player;
pub use snapshot::BoardSnapshot;
pub use state::{GameOutcome, GameStatus, Placement, Rejection};
