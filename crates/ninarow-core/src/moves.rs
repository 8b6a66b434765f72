//! Moves and move lists.

use std::cmp::Ordering;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::bitboard::MAX_CELLS;
use crate::player::Player;

/// Represents a single move.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// The cell where the piece is placed.
    pub position: usize,
    /// Heuristic value of the move, from the mover's point of view.
    pub value: f64,
    /// The player making the move.
    pub player: Player,
}

impl Move {
    /// Creates a new move.
    ///
    /// # Arguments
    ///
    /// * `position` - The cell where the piece is placed
    /// * `value` - Evaluation of the move (higher = better for `player`)
    /// * `player` - The player making the move
    #[inline]
    pub fn new(position: usize, value: f64, player: Player) -> Move {
        Move {
            position,
            value,
            player,
        }
    }

    /// Row of the move on a board of the given width.
    #[inline]
    pub fn row(&self, width: usize) -> usize {
        self.position / width
    }

    /// Column of the move on a board of the given width.
    #[inline]
    pub fn col(&self, width: usize) -> usize {
        self.position % width
    }

    /// Orders moves best first: higher value, then lower position.
    pub fn ranking(a: &Move, b: &Move) -> Ordering {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.position.cmp(&b.position))
    }
}

/// Fixed-capacity list holding at most one move per cell.
pub type MoveList = ArrayVec<Move, MAX_CELLS>;

/// Sorts moves best first, breaking ties by lowest position.
pub fn sort_moves(moves: &mut [Move]) {
    moves.sort_by(Move::ranking);
}
