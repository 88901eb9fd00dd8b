use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::checkpoint::metadata::{BoardParameters, CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;
use crate::oracle::ScoringOracle;

const METADATA_FILE: &str = "metadata.json";
const LATEST_LINK: &str = "latest";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 3,
        }
    }
}

/// A checkpoint directory and its parsed metadata.
#[derive(Debug)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Self {
        fs::create_dir_all(&config.checkpoint_dir).ok();
        CheckpointManager { config }
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.config.checkpoint_dir
    }

    /// Write oracle state and metadata into `checkpoint_<game>`, then point
    /// `latest` at it and prune.
    pub fn save_checkpoint<O: ScoringOracle + ?Sized>(
        &self,
        oracle: &O,
        board: BoardParameters,
        metrics: &CheckpointMetrics,
        game: usize,
    ) -> Result<PathBuf, CheckpointError> {
        let dir_name = format!("checkpoint_{:07}", game);
        let tmp_dir = self.config.checkpoint_dir.join(format!("{}.tmp", dir_name));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        oracle.save_to_dir(&tmp_dir)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = CheckpointMetadata {
            game,
            timestamp,
            oracle: oracle.name().to_string(),
            board,
            metrics: metrics.clone(),
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        self.update_latest_symlink(&dir_name)?;
        self.prune_old_checkpoints()?;

        debug!(path = %final_dir.display(), game, "checkpoint written");
        Ok(final_dir)
    }

    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata: read_metadata(&dir.join(METADATA_FILE))?,
        })
    }

    pub fn load_latest(&self) -> Result<CheckpointData, CheckpointError> {
        let latest_link = self.config.checkpoint_dir.join(LATEST_LINK);
        if !latest_link.exists() {
            return Err(CheckpointError::NoLatestSymlink(
                self.config.checkpoint_dir.clone(),
            ));
        }
        let resolved = fs::read_link(&latest_link)?;
        let target = if resolved.is_relative() {
            self.config.checkpoint_dir.join(resolved)
        } else {
            resolved
        };
        self.load_checkpoint(&target)
    }

    /// Load the latest checkpoint's weights and training state into `oracle`.
    pub fn restore_latest<O: ScoringOracle + ?Sized>(
        &self,
        oracle: &mut O,
    ) -> Result<CheckpointData, CheckpointError> {
        let data = self.load_latest()?;
        oracle.load_from_dir(&data.path)?;
        Ok(data)
    }

    /// List all checkpoints sorted by game number (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointData>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("checkpoint_") || name.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata = read_metadata(&meta_path)?;
                results.push(CheckpointData { path, metadata });
            }
        }
        results.sort_by_key(|c| c.metadata.game);
        Ok(results)
    }

    /// Keep the union of the last N and the best N by lowest oracle loss.
    /// Checkpoints without a recorded loss never count as best.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let total = checkpoints.len();
        let mut keep: HashSet<usize> =
            (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_loss: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.metadata.metrics.current_loss.map(|loss| (i, loss)))
            .filter(|(_, loss)| !loss.is_nan())
            .collect();
        by_loss.sort_by(|a, b| a.1.total_cmp(&b.1));
        keep.extend(by_loss.iter().take(self.config.keep_best_n).map(|(i, _)| *i));

        for (i, checkpoint) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                fs::remove_dir_all(&checkpoint.path)?;
            }
        }
        Ok(())
    }

    fn update_latest_symlink(&self, dir_name: &str) -> Result<(), CheckpointError> {
        let link_path = self.config.checkpoint_dir.join(LATEST_LINK);
        if link_path.symlink_metadata().is_ok() {
            fs::remove_file(&link_path)?;
        }
        std::os::unix::fs::symlink(dir_name, &link_path)?;
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Board, Move, Player};
    use crate::oracle::{OracleConfig, ValueNetOracle};

    const BOARD: BoardParameters = BoardParameters {
        size: 3,
        win_length: 3,
    };

    fn test_metrics(loss: f32) -> CheckpointMetrics {
        CheckpointMetrics {
            x_win_rate: 0.6,
            draw_rate: 0.1,
            average_game_length: 7.0,
            current_loss: Some(loss),
            games_trained: 40,
            ..CheckpointMetrics::default()
        }
    }

    fn manager(dir: &Path, keep_last_n: usize, keep_best_n: usize) -> CheckpointManager {
        CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.to_path_buf(),
            keep_last_n,
            keep_best_n,
        })
    }

    fn oracle() -> ValueNetOracle {
        ValueNetOracle::new(
            OracleConfig {
                hidden_layers: vec![4],
                max_iterations: 5,
                seed: Some(1),
                ..OracleConfig::default()
            },
            3,
        )
    }

    #[test]
    fn test_save_and_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);

        let mut trained = oracle();
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
        trained.train(&board).unwrap();

        let path = manager
            .save_checkpoint(&trained, BOARD, &test_metrics(0.05), 10)
            .unwrap();
        assert!(path.join("metadata.json").exists());
        assert!(path.join("training_state.json").exists());
        assert!(path.join("value_network.mpk").exists());

        let mut restored = oracle();
        let data = manager.restore_latest(&mut restored).unwrap();
        assert_eq!(data.metadata.game, 10);
        assert_eq!(data.metadata.oracle, "ValueNet");
        assert_eq!(data.metadata.board, BOARD);
        assert_eq!(restored.games_trained(), 1);
        assert!(restored.is_trained());
    }

    #[test]
    fn test_latest_symlink_follows_newest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);
        let oracle = oracle();

        manager.save_checkpoint(&oracle, BOARD, &test_metrics(0.1), 100).unwrap();
        manager.save_checkpoint(&oracle, BOARD, &test_metrics(0.1), 200).unwrap();

        assert_eq!(manager.load_latest().unwrap().metadata.game, 200);
    }

    #[test]
    fn test_list_checkpoints_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 10, 10);
        let oracle = oracle();

        for game in [300, 100, 200] {
            manager.save_checkpoint(&oracle, BOARD, &test_metrics(0.1), game).unwrap();
        }

        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|c| c.metadata.game)
            .collect();
        assert_eq!(games, vec![100, 200, 300]);
    }

    #[test]
    fn test_pruning_keeps_last_and_lowest_loss() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 2, 1);
        let oracle = oracle();

        let losses = [0.5, 0.01, 0.3, 0.2, 0.4];
        for (i, &loss) in losses.iter().enumerate() {
            manager
                .save_checkpoint(&oracle, BOARD, &test_metrics(loss), (i + 1) * 10)
                .unwrap();
        }

        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|c| c.metadata.game)
            .collect();
        assert_eq!(games, vec![20, 40, 50]);
    }

    #[test]
    fn test_pruning_never_keeps_untrained_checkpoint_as_best() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 1, 1);
        let oracle = oracle();

        let untrained = CheckpointMetrics {
            current_loss: None,
            ..test_metrics(0.0)
        };
        manager.save_checkpoint(&oracle, BOARD, &untrained, 0).unwrap();
        for (game, loss) in [(10, 0.4), (20, 0.3), (30, 0.5)] {
            manager
                .save_checkpoint(&oracle, BOARD, &test_metrics(loss), game)
                .unwrap();
        }

        let games: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|c| c.metadata.game)
            .collect();
        assert_eq!(games, vec![20, 30]);
    }

    #[test]
    fn test_load_latest_without_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), 5, 3);

        let err = manager.load_latest().unwrap_err();
        assert!(
            matches!(err, CheckpointError::NoLatestSymlink(_)),
            "expected NoLatestSymlink, got: {err}"
        );
    }

    #[test]
    fn test_metadata_without_stats_parses() {
        let json = r#"{
            "game": 50,
            "timestamp": 1700000000,
            "oracle": "ValueNet",
            "board": { "size": 16, "win_length": 5 },
            "metrics": {
                "x_win_rate": 0.5,
                "draw_rate": 0.0,
                "average_game_length": 61.0,
                "current_loss": 0.08,
                "games_trained": 900
            }
        }"#;

        let meta: CheckpointMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.game, 50);
        assert_eq!(meta.metrics.stats.games, 0);
        assert_eq!(meta.metrics.current_loss, Some(0.08));
    }
}
