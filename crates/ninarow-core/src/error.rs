//! Error types for board manipulation, heuristic construction and search.

use thiserror::Error;

/// Errors reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NInARowError {
    /// A move that cannot be placed on the board.
    #[error("invalid move at position {position}: {reason}")]
    InvalidMove { position: usize, reason: String },

    /// A position outside the grid.
    #[error("position {position} is outside a board of {size} cells")]
    OutOfBounds { position: usize, size: usize },

    /// Malformed heuristic parameters.
    #[error("invalid heuristic weights: {0}")]
    InvalidWeights(String),

    /// The search node budget would be exceeded by an expansion.
    #[error("search tree exhausted its budget of {budget} nodes")]
    TreeExhausted { budget: usize },

    /// A search was started on a board where no move can be made.
    #[error("no legal moves available on the root board")]
    NoLegalMoves,

    /// Board dimensions that the bitboard representation cannot hold.
    #[error("invalid board geometry: {0}")]
    InvalidGeometry(String),

    /// A board state breaking the occupancy or alternation invariants.
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    /// A feature whose patterns are inconsistent.
    #[error("invalid feature: {0}")]
    InvalidFeature(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl NInARowError {
    pub(crate) fn invalid_move(position: usize, reason: impl Into<String>) -> Self {
        NInARowError::InvalidMove {
            position,
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors a search recovers from by reporting the best move so far.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NInARowError::TreeExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, NInARowError>;
