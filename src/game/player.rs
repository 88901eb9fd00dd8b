use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    X,
    O,
}

impl Player {
    /// Get the other player
    pub fn other(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Numeric feature fed to the oracle: 1.0 for X, 0.0 for O.
    pub fn value(self) -> f32 {
        match self {
            Player::X => 1.0,
            Player::O => 0.0,
        }
    }

    /// Get player name for display
    pub fn name(self) -> &'static str {
        match self {
            Player::X => "X",
            Player::O => "O",
        }
    }

    /// Single-character mark used by text renderings.
    pub fn mark(self) -> char {
        match self {
            Player::X => 'x',
            Player::O => 'o',
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Player {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "x" | "X" => Ok(Player::X),
            "o" | "O" => Ok(Player::O),
            other => Err(format!("unknown player '{other}' (expected 'x' or 'o')")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(Player::X.other(), Player::O);
        assert_eq!(Player::O.other(), Player::X);
    }

    #[test]
    fn test_player_value() {
        assert_eq!(Player::X.value(), 1.0);
        assert_eq!(Player::O.value(), 0.0);
    }

    #[test]
    fn test_player_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Player::X).unwrap(), "\"x\"");
        let p: Player = serde_json::from_str("\"o\"").unwrap();
        assert_eq!(p, Player::O);
    }

    #[test]
    fn test_player_from_str() {
        assert_eq!("X".parse::<Player>().unwrap(), Player::X);
        assert_eq!(" o ".parse::<Player>().unwrap(), Player::O);
        assert!("z".parse::<Player>().is_err());
    }
}
