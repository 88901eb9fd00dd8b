use std::path::{Path, PathBuf};

use tracing::warn;

use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;
use crate::game::{Board, Player, MAX_BOARD_SIZE};
use crate::oracle::OracleConfig;
use crate::training::selfplay::SelfPlayConfig;

/// Board geometry and the player who opens the first game.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub size: usize,
    pub win_length: usize,
    pub starting_player: Player,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            size: 16,
            win_length: 5,
            starting_player: Player::X,
        }
    }
}

impl BoardConfig {
    pub fn build(&self) -> Board {
        Board::new(self.size, self.win_length, self.starting_player)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("saved_boards.json"),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub oracle: OracleConfig,
    pub selfplay: SelfPlayConfig,
    pub checkpoint: CheckpointManagerConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Validation(msg.into()))
        }

        if !(1..=MAX_BOARD_SIZE).contains(&self.board.size) {
            return Err(ConfigError::Validation(format!(
                "board.size must be between 1 and {MAX_BOARD_SIZE}"
            )));
        }
        // A win_length above size is legal: every game ends in a draw.
        if self.board.win_length == 0 {
            return invalid("board.win_length must be >= 1");
        }

        if self.oracle.learning_rate <= 0.0 {
            return invalid("oracle.learning_rate must be > 0");
        }
        if self.oracle.max_iterations == 0 {
            return invalid("oracle.max_iterations must be > 0");
        }
        if self.oracle.error_threshold < 0.0 {
            return invalid("oracle.error_threshold must be >= 0");
        }
        if self.oracle.batch_size == 0 {
            return invalid("oracle.batch_size must be > 0");
        }
        if self.oracle.replay_capacity < self.oracle.batch_size {
            return invalid("oracle.replay_capacity must be >= oracle.batch_size");
        }
        if self.oracle.hidden_layers.contains(&0) {
            return invalid("oracle.hidden_layers entries must be > 0");
        }

        if self.selfplay.num_games == 0 {
            return invalid("selfplay.num_games must be > 0");
        }
        if self.selfplay.live_update_interval == 0 {
            return invalid("selfplay.live_update_interval must be > 0");
        }

        if self.checkpoint.keep_last_n == 0 {
            return invalid("checkpoint.keep_last_n must be >= 1");
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
        assert_eq!(config.board.size, 16);
        assert_eq!(config.board.win_length, 5);
        assert_eq!(config.oracle.hidden_layers, vec![15, 15]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[board]
size = 9
starting_player = "o"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.board.size, 9);
        assert_eq!(config.board.win_length, 5);
        assert_eq!(config.board.starting_player, Player::O);
        assert_eq!(config.selfplay, SelfPlayConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_board_config_builds_board() {
        let board = BoardConfig {
            size: 7,
            win_length: 4,
            starting_player: Player::O,
        }
        .build();
        assert_eq!(board.size(), 7);
        assert_eq!(board.win_length(), 4);
        assert_eq!(board.current_player(), Player::O);
    }

    #[test]
    fn test_validation_rejects_zero_size() {
        let mut config = AppConfig::default();
        config.board.size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_accepts_unreachable_win_length() {
        let mut config = AppConfig::default();
        config.board.size = 4;
        config.board.win_length = 5;
        config.validate().expect("win_length above size only forces draws");
    }

    #[test]
    fn test_validation_rejects_oversized_board() {
        let mut config = AppConfig::default();
        config.board.size = MAX_BOARD_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.oracle.learning_rate = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_replay_capacity_lt_batch() {
        let mut config = AppConfig::default();
        config.oracle.replay_capacity = 10;
        config.oracle.batch_size = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_hidden_layer() {
        let mut config = AppConfig::default();
        config.oracle.hidden_layers = vec![15, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_games() {
        let mut config = AppConfig::default();
        config.selfplay.num_games = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_live_update_interval() {
        let mut config = AppConfig::default();
        config.selfplay.live_update_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[selfplay]
num_games = 500
autosave = true

[oracle]
hidden_layers = [32]
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.selfplay.num_games, 500);
        assert!(config.selfplay.autosave);
        assert_eq!(config.oracle.hidden_layers, vec![32]);
        assert_eq!(config.board, BoardConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[board]\nwin_length = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}
