//! Legal move enumeration and the uniform random fallback policy.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::{Board, Move};

/// Every unoccupied cell paired with the player to move, in row-major order.
///
/// The order is deterministic for a given board so that tests and seeded
/// self-play runs are reproducible. A finished game still yields its empty
/// cells; callers check the board status first.
pub fn possible_moves(board: &Board) -> Vec<Move> {
    let size = board.size();
    let player = board.current_player();
    let mut moves = Vec::with_capacity(size * size - board.move_count());

    for y in 0..size {
        for x in 0..size {
            if board.get(x, y).is_none() {
                moves.push(Move::new(x, y, player));
            }
        }
    }
    moves
}

/// Pick one candidate uniformly at random, `None` when there are none.
pub fn random_item<'a, T, R: Rng + ?Sized>(rng: &mut R, candidates: &'a [T]) -> Option<&'a T> {
    candidates.choose(rng)
}
