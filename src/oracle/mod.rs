//! Move-scoring oracles: the trait the self-play driver talks to and the
//! neural value-network implementation.

pub mod encoding;
mod network;
mod value_net;

use std::path::Path;

use crate::error::OracleError;
use crate::game::{Board, Move};

pub use network::{ValueNetwork, ValueNetworkConfig};
pub use value_net::{OracleConfig, ValueNetOracle, ValueNetTrainingState};

/// Summary of one training call on a finished game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainReport {
    /// Loss of the final optimisation step.
    pub loss: f32,
    pub iterations: usize,
    /// Positions extracted from the game.
    pub samples: usize,
}

/// Scores candidate moves and learns from finished games.
pub trait ScoringOracle {
    fn name(&self) -> &str;

    /// Whether the oracle has learned anything yet. Untrained oracles are
    /// bypassed in favour of uniform random play.
    fn is_trained(&self) -> bool;

    /// Score `candidate` on `board`. Higher is better for the candidate's player.
    fn score(&self, board: &Board, candidate: &Move) -> f32;

    fn score_all(&self, board: &Board, candidates: &[Move]) -> Vec<f32> {
        candidates.iter().map(|m| self.score(board, m)).collect()
    }

    /// Learn from a finished game. Blocks until training completes.
    fn train(&mut self, board: &Board) -> Result<TrainReport, OracleError>;

    /// Reject boards this oracle cannot score.
    fn check_board(&self, _board: &Board) -> Result<(), OracleError> {
        Ok(())
    }

    fn games_trained(&self) -> usize {
        0
    }

    fn save_to_dir(&self, _dir: &Path) -> Result<(), OracleError> {
        Ok(())
    }

    fn load_from_dir(&mut self, _dir: &Path) -> Result<(), OracleError> {
        Ok(())
    }
}
