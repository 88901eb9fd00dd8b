use std::path::PathBuf;

use crate::game::{Player, Rejection};

/// A coordinate string that is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    #[error("coordinate '{0}' is not a non-negative integer")]
    NotANumber(String),
}

/// A persisted board that cannot be turned back into a valid `Board`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("board size must be between 1 and {max} (got {0})", max = crate::game::MAX_BOARD_SIZE)]
    InvalidSize(usize),

    #[error("win length must be at least 1 (got {0})")]
    InvalidWinLength(usize),

    #[error("move ({x}, {y}) is outside a {size}x{size} board")]
    OutOfBounds { x: usize, y: usize, size: usize },

    #[error("two moves share coordinate ({x}, {y})")]
    DuplicateCoordinate { x: usize, y: usize },

    #[error("recorded winner {recorded:?} does not match board ({derived:?})")]
    WinnerMismatch {
        recorded: Option<Player>,
        derived: Option<Player>,
    },

    #[error("winning moves recorded without a winner")]
    LineWithoutWinner,

    #[error("winner recorded without winning moves")]
    WinnerWithoutLine,

    #[error("winning move ({x}, {y}) is not a mark of the winner")]
    LineNotOnBoard { x: usize, y: usize },
}

/// Errors from the saved-boards store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse store {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no saved board named '{0}'")]
    NotFound(String),

    #[error("saved board '{name}' is malformed: {source}")]
    InvalidEntry {
        name: String,
        source: serde_json::Error,
    },

    #[error("saved board '{name}' is corrupt: {source}")]
    Corrupt {
        name: String,
        source: SnapshotError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a scoring oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle expects a {expected}x{expected} board, got {actual}x{actual}")]
    BoardSizeMismatch { expected: usize, actual: usize },

    #[error("cannot train on a game that has not finished")]
    UnfinishedGame,

    #[error("failed to save or load weights: {0}")]
    Weights(String),

    #[error("invalid training state: {0}")]
    TrainingState(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that stop a self-play run.
#[derive(Debug, thiserror::Error)]
pub enum SelfPlayError {
    #[error("board rejected generated move ({x}, {y}): {reason:?}")]
    IllegalMove {
        x: usize,
        y: usize,
        reason: Rejection,
    },

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors raised by the interactive board and the saved-boards picker.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("board name must not be empty")]
    EmptyName,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::OutOfBounds { x: 9, y: 2, size: 3 };
        assert_eq!(err.to_string(), "move (9, 2) is outside a 3x3 board");
    }

    #[test]
    fn test_selfplay_error_display() {
        let err = SelfPlayError::IllegalMove {
            x: 1,
            y: 2,
            reason: Rejection::Occupied,
        };
        assert_eq!(
            err.to_string(),
            "board rejected generated move (1, 2): Occupied"
        );
    }

    #[test]
    fn test_store_error_wraps_snapshot_error() {
        let err = StoreError::Corrupt {
            name: "game-1".to_string(),
            source: SnapshotError::DuplicateCoordinate { x: 0, y: 0 },
        };
        assert_eq!(
            err.to_string(),
            "saved board 'game-1' is corrupt: two moves share coordinate (0, 0)"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("board.size must be >= 1".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: board.size must be >= 1"
        );
    }
}
