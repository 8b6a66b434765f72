//! Heuristic features.
//!
//! A [`HeuristicFeature`] describes a tactical motif as a set of cells the
//! player must hold (`pieces`) and a set of cells that must stay empty
//! (`spaces`). Every predicate exists in two shapes: a canonical one taking
//! occupancy counts, and a board adapter that derives those counts with a
//! couple of population counts and delegates. Batched evaluation
//! ([`FeatureEvaluator`](crate::feature_evaluator::FeatureEvaluator)) computes
//! the counts once per board and feeds them to the canonical shape.

use std::fmt;

use crate::board::Board;
use crate::error::{NInARowError, Result};
use crate::pattern::Pattern;
use crate::player::Player;

/// How a feature's counts map onto presence, completion and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeaturePolicy {
    /// All of `pieces` held and at least `min_space_occupancy` of `spaces`
    /// empty. Completion means exactly one piece is missing; removal means the
    /// spaces are at their minimum so one opposing piece breaks the motif.
    Exact,
    /// An uncontested line: `pieces` and `spaces` are the same cells and the
    /// motif needs `piece_count` of them held with the rest still empty.
    OpenLine,
}

/// Occupancy counts of one feature on one board, for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureCounts {
    /// Cells of `pieces` held by the player.
    pub player: usize,
    /// Cells of `pieces` held by the opponent.
    pub opponent: usize,
    /// Empty cells of `spaces`.
    pub spaces: usize,
}

/// A detectable motif used to score positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeuristicFeature {
    pieces: Pattern,
    spaces: Pattern,
    min_space_occupancy: usize,
    piece_count: usize,
    policy: FeaturePolicy,
}

impl HeuristicFeature {
    /// Creates an [`FeaturePolicy::Exact`] feature.
    ///
    /// # Arguments
    ///
    /// * `pieces` - Cells the player must hold.
    /// * `spaces` - Cells that should be empty.
    /// * `min_space_occupancy` - How many of `spaces` must be empty.
    ///
    /// # Errors
    ///
    /// [`NInARowError::InvalidFeature`] if the patterns overlap, `pieces` is
    /// empty, or more empty cells are required than `spaces` has.
    pub fn new(pieces: Pattern, spaces: Pattern, min_space_occupancy: usize) -> Result<Self> {
        if pieces.is_empty() {
            return Err(NInARowError::InvalidFeature(
                "a feature needs at least one piece".to_string(),
            ));
        }
        if !pieces.is_disjoint(spaces) {
            return Err(NInARowError::InvalidFeature(format!(
                "piece pattern {pieces} and space pattern {spaces} overlap"
            )));
        }
        if min_space_occupancy > spaces.len() {
            return Err(NInARowError::InvalidFeature(format!(
                "{min_space_occupancy} empty cells required but only {} spaces given",
                spaces.len()
            )));
        }
        Ok(HeuristicFeature {
            pieces,
            spaces,
            min_space_occupancy,
            piece_count: pieces.len(),
            policy: FeaturePolicy::Exact,
        })
    }

    /// Creates an [`FeaturePolicy::OpenLine`] feature: `required` pieces on an
    /// otherwise empty `line`.
    pub fn open_line(line: Pattern, required: usize) -> Result<Self> {
        if required == 0 || required > line.len() {
            return Err(NInARowError::InvalidFeature(format!(
                "cannot require {required} pieces on a line of {} cells",
                line.len()
            )));
        }
        Ok(HeuristicFeature {
            pieces: line,
            spaces: line,
            min_space_occupancy: line.len() - required,
            piece_count: required,
            policy: FeaturePolicy::OpenLine,
        })
    }

    #[inline]
    pub fn pieces(&self) -> Pattern {
        self.pieces
    }

    #[inline]
    pub fn spaces(&self) -> Pattern {
        self.spaces
    }

    #[inline]
    pub fn min_space_occupancy(&self) -> usize {
        self.min_space_occupancy
    }

    /// Number of pieces the motif requires.
    #[inline]
    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    #[inline]
    pub fn policy(&self) -> FeaturePolicy {
        self.policy
    }

    /// Cells of `pieces` held by `player`.
    #[inline]
    pub fn count_pieces(&self, board: &Board, player: Player) -> usize {
        self.pieces.count(board, player)
    }

    /// Empty cells of `spaces`.
    #[inline]
    pub fn count_spaces(&self, board: &Board) -> usize {
        self.spaces.count_spaces(board)
    }

    /// All three counts for `player` in one go.
    #[inline]
    pub fn counts(&self, board: &Board, player: Player) -> FeatureCounts {
        FeatureCounts {
            player: self.count_pieces(board, player),
            opponent: self.count_pieces(board, player.other()),
            spaces: self.count_spaces(board),
        }
    }

    /// Returns `true` if the motif is fully present.
    pub fn contained_in_counts(&self, player_piece_count: usize, open_space_count: usize) -> bool {
        match self.policy {
            FeaturePolicy::Exact => {
                player_piece_count == self.piece_count
                    && open_space_count >= self.min_space_occupancy
            }
            FeaturePolicy::OpenLine => {
                player_piece_count >= self.piece_count
                    && player_piece_count + open_space_count == self.pieces.len()
            }
        }
    }

    /// Board adapter for [`contained_in_counts`](Self::contained_in_counts).
    pub fn contained_in(&self, board: &Board, player: Player) -> bool {
        self.contained_in_counts(self.count_pieces(board, player), self.count_spaces(board))
    }

    /// Returns `true` if the player can still complete the motif.
    pub fn can_be_completed_counts(
        &self,
        player_piece_count: usize,
        opponent_piece_count: usize,
        open_space_count: usize,
    ) -> bool {
        match self.policy {
            FeaturePolicy::Exact => {
                player_piece_count + 1 == self.piece_count
                    && opponent_piece_count == 0
                    && open_space_count >= self.min_space_occupancy
            }
            FeaturePolicy::OpenLine => {
                player_piece_count < self.piece_count
                    && opponent_piece_count == 0
                    && open_space_count >= self.piece_count - player_piece_count
            }
        }
    }

    /// Board adapter for [`can_be_completed_counts`](Self::can_be_completed_counts).
    pub fn can_be_completed(&self, board: &Board, player: Player) -> bool {
        let counts = self.counts(board, player);
        self.can_be_completed_counts(counts.player, counts.opponent, counts.spaces)
    }

    /// Returns `true` if the opponent can break the motif by taking one of
    /// its open cells.
    pub fn can_be_removed_counts(&self, player_piece_count: usize, open_space_count: usize) -> bool {
        match self.policy {
            FeaturePolicy::Exact => {
                player_piece_count == self.piece_count
                    && open_space_count == self.min_space_occupancy
            }
            FeaturePolicy::OpenLine => {
                open_space_count >= 1 && player_piece_count + open_space_count == self.pieces.len()
            }
        }
    }

    /// Board adapter for [`can_be_removed_counts`](Self::can_be_removed_counts).
    pub fn can_be_removed(&self, board: &Board, player: Player) -> bool {
        self.can_be_removed_counts(self.count_pieces(board, player), self.count_spaces(board))
    }

    /// Cells of `pieces` that `player` still has to occupy.
    #[inline]
    pub fn missing_pieces(&self, board: &Board, player: Player) -> Pattern {
        board.missing_pieces(self.pieces, player)
    }
}

impl fmt::Display for HeuristicFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({:?})",
            self.pieces, self.spaces, self.min_space_occupancy, self.policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Direction, Geometry};

    fn geometry() -> Geometry {
        Geometry::new(3, 3, 3).unwrap()
    }

    /// Two corners held with the three cells of the bottom row and centre as spaces:
    /// ```text
    /// P.P
    /// .S.
    /// S.S
    /// ```
    fn corner_feature() -> HeuristicFeature {
        HeuristicFeature::new(
            Pattern::from_positions([0, 2]),
            Pattern::from_positions([4, 6, 8]),
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_overlap() {
        let err = HeuristicFeature::new(
            Pattern::from_positions([0, 1]),
            Pattern::from_positions([1, 2]),
            1,
        );
        assert!(matches!(err, Err(NInARowError::InvalidFeature(_))));
        assert!(HeuristicFeature::new(Pattern::EMPTY, Pattern::from_positions([1]), 0).is_err());
        assert!(
            HeuristicFeature::new(Pattern::from_positions([0]), Pattern::from_positions([1]), 2)
                .is_err()
        );
        assert!(HeuristicFeature::open_line(Pattern::from_positions([0, 1, 2]), 4).is_err());
    }

    #[test]
    fn test_exact_feature_progression() {
        let g = geometry();
        let feature = corner_feature();
        let mut board = Board::new(&g);

        board.apply_move(0, Player::Player1).unwrap();
        assert!(!feature.contained_in(&board, Player::Player1));
        assert!(feature.can_be_completed(&board, Player::Player1));
        assert!(!feature.can_be_completed(&board, Player::Player2));
        assert_eq!(
            feature.missing_pieces(&board, Player::Player1),
            Pattern::from_positions([2])
        );
        assert_eq!(
            feature.missing_pieces(&board, Player::Player2),
            Pattern::from_positions([0, 2])
        );

        // Player 2 encroaches on the second corner.
        let mut blocked = board;
        blocked.apply_move(2, Player::Player2).unwrap();
        assert!(!feature.can_be_completed(&blocked, Player::Player1));

        board.apply_move(1, Player::Player2).unwrap();
        board.apply_move(2, Player::Player1).unwrap();
        assert!(feature.contained_in(&board, Player::Player1));
        assert!(!feature.contained_in(&board, Player::Player2));
        assert!(!feature.can_be_removed(&board, Player::Player1));

        // One space covered: still present, and now one more block removes it.
        board.apply_move(6, Player::Player2).unwrap();
        assert!(feature.contained_in(&board, Player::Player1));
        assert!(feature.can_be_removed(&board, Player::Player1));

        board.apply_move(3, Player::Player1).unwrap();
        board.apply_move(8, Player::Player2).unwrap();
        assert!(!feature.contained_in(&board, Player::Player1));
        assert!(!feature.can_be_removed(&board, Player::Player1));
    }

    #[test]
    fn test_open_line_two_of_three() {
        let g = geometry();
        let line = Pattern::line(&g, 0, Direction::Horizontal).unwrap();
        let feature = HeuristicFeature::open_line(line, 3).unwrap();
        let board = Board::from_cells(&g, "oo. x.. ...").unwrap();

        assert!(feature.can_be_completed(&board, Player::Player1));
        assert!(feature.can_be_removed(&board, Player::Player1));
        assert!(!feature.contained_in(&board, Player::Player1));
        assert!(!feature.can_be_completed(&board, Player::Player2));
    }

    #[test]
    fn test_open_line_counts() {
        let g = geometry();
        let line = Pattern::line(&g, 0, Direction::Vertical).unwrap();
        let feature = HeuristicFeature::open_line(line, 3).unwrap();

        assert!(feature.contained_in_counts(3, 0));
        assert!(!feature.contained_in_counts(2, 0));
        assert!(feature.can_be_completed_counts(1, 0, 2));
        assert!(!feature.can_be_completed_counts(1, 1, 1));
        assert!(!feature.can_be_completed_counts(3, 0, 0));
        assert!(feature.can_be_removed_counts(0, 3));
        assert!(!feature.can_be_removed_counts(1, 1));
        assert!(!feature.can_be_removed_counts(3, 0));
    }

    #[test]
    fn test_open_line_presence_with_extra_pieces() {
        let g = geometry();
        let line = Pattern::line(&g, 0, Direction::Horizontal).unwrap();
        let feature = HeuristicFeature::open_line(line, 2).unwrap();

        assert!(feature.contained_in_counts(2, 1));
        assert!(feature.contained_in_counts(3, 0));
        assert!(!feature.contained_in_counts(1, 2));
        // Two held and the third cell taken by the opponent.
        assert!(!feature.contained_in_counts(2, 0));
        assert!(!feature.can_be_completed_counts(2, 0, 1));

        let full = Board::from_cells(&g, "ooo xx. ...").unwrap();
        assert!(feature.contained_in(&full, Player::Player1));
        let blocked = Board::from_cells(&g, "oox x.. o..").unwrap();
        assert!(!feature.contained_in(&blocked, Player::Player1));
    }

    #[test]
    fn test_exact_counts() {
        let feature = corner_feature();
        assert!(feature.contained_in_counts(2, 3));
        assert!(feature.contained_in_counts(2, 2));
        assert!(!feature.contained_in_counts(2, 1));
        assert!(feature.can_be_completed_counts(1, 0, 2));
        assert!(!feature.can_be_completed_counts(1, 1, 3));
        assert!(feature.can_be_removed_counts(2, 2));
        assert!(!feature.can_be_removed_counts(2, 3));
    }

    #[test]
    fn test_board_and_count_shapes_agree() {
        let g = geometry();
        let boards = ["oo. x.. ...", "o.x .o. x..", "oxo .x. o..", "........."];
        let line = Pattern::line(&g, 2, Direction::AntiDiagonal).unwrap();
        let features = [
            corner_feature(),
            HeuristicFeature::open_line(line, 2).unwrap(),
            HeuristicFeature::open_line(line, 3).unwrap(),
        ];
        for text in boards {
            let board = Board::from_cells(&g, text).unwrap();
            for feature in &features {
                for player in Player::ALL {
                    let c = feature.counts(&board, player);
                    assert_eq!(
                        feature.contained_in(&board, player),
                        feature.contained_in_counts(c.player, c.spaces)
                    );
                    assert_eq!(
                        feature.can_be_completed(&board, player),
                        feature.can_be_completed_counts(c.player, c.opponent, c.spaces)
                    );
                    assert_eq!(
                        feature.can_be_removed(&board, player),
                        feature.can_be_removed_counts(c.player, c.spaces)
                    );
                }
            }
        }
    }
}
