use serde::{Deserialize, Serialize};

use super::Player;
use crate::error::CoordinateError;

/// A single mark placed by one player. Bounds are checked by the board, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub x: usize,
    pub y: usize,
    pub player: Player,
}

impl Move {
    pub fn new(x: usize, y: usize, player: Player) -> Self {
        Move { x, y, player }
    }

    /// Parse decimal coordinates as they arrive from a UI or a text command.
    pub fn parse(x: &str, y: &str, player: Player) -> Result<Self, CoordinateError> {
        Ok(Move {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
            player,
        })
    }

    /// Numeric player feature for the oracle.
    pub fn player_value(&self) -> f32 {
        self.player.value()
    }

    pub fn coords(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

fn parse_coordinate(raw: &str) -> Result<usize, CoordinateError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| CoordinateError::NotANumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_parses() {
        let m = Move::parse(" 3", "12 ", Player::O).unwrap();
        assert_eq!(m, Move::new(3, 12, Player::O));
    }

    #[test]
    fn test_parse_rejects_negative() {
        let err = Move::parse("-1", "0", Player::X).unwrap_err();
        assert_eq!(err, CoordinateError::NotANumber("-1".to_string()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Move::parse("a", "0", Player::X).is_err());
        assert!(Move::parse("1", "", Player::X).is_err());
    }

    #[test]
    fn test_player_value() {
        assert_eq!(Move::new(0, 0, Player::X).player_value(), 1.0);
        assert_eq!(Move::new(0, 0, Player::O).player_value(), 0.0);
    }
}
