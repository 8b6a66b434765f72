//! The two sides of a game.

use serde::{Deserialize, Serialize};

/// Represents a player in the game.
///
/// * `Player1` - Moves first, drawn as `o`.
/// * `Player2` - Moves second, drawn as `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    Player1 = 0,
    Player2 = 1,
}

impl Player {
    /// Both players in move order.
    pub const ALL: [Player; 2] = [Player::Player1, Player::Player2];

    /// Converts the player to its board character.
    ///
    /// # Returns
    ///
    /// * `'o'` for `Player::Player1`
    /// * `'x'` for `Player::Player2`
    pub fn to_char(self) -> char {
        match self {
            Player::Player1 => 'o',
            Player::Player2 => 'x',
        }
    }

    /// Parses a board character back into a player.
    pub fn from_char(c: char) -> Option<Player> {
        match c {
            'o' | 'O' => Some(Player::Player1),
            'x' | 'X' => Some(Player::Player2),
            _ => None,
        }
    }

    /// Returns the opposing player.
    #[inline(always)]
    pub fn other(self) -> Player {
        match self {
            Player::Player1 => Player::Player2,
            Player::Player2 => Player::Player1,
        }
    }

    /// Index of this player into per-player arrays.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::Player1 => write!(f, "player 1"),
            Player::Player2 => write!(f, "player 2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other() {
        assert_eq!(Player::Player1.other(), Player::Player2);
        assert_eq!(Player::Player2.other(), Player::Player1);
        assert_eq!(Player::Player1.other().other(), Player::Player1);
    }

    #[test]
    fn test_char_round_trip() {
        for player in Player::ALL {
            assert_eq!(Player::from_char(player.to_char()), Some(player));
        }
        assert_eq!(Player::from_char('.'), None);
    }
}
