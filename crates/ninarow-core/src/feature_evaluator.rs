//! Batched feature counting.
//!
//! The heuristic asks the same three questions of every feature for every
//! board it scores. [`FeatureEvaluator`] keeps the feature patterns in two flat
//! arrays so one pass over them yields the counts for all features at once.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::feature::{FeatureCounts, HeuristicFeature};
use crate::player::Player;

/// Flat storage of registered feature patterns.
#[derive(Debug, Clone, Default)]
pub struct FeatureEvaluator {
    pieces: Vec<Bitboard>,
    spaces: Vec<Bitboard>,
}

impl FeatureEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a feature and returns its index in the count vectors.
    pub fn register_feature(&mut self, feature: &HeuristicFeature) -> usize {
        self.pieces.push(feature.pieces().bits());
        self.spaces.push(feature.spaces().bits());
        self.pieces.len() - 1
    }

    /// Number of registered features.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Counts for every feature from `player`'s point of view.
    pub fn query(&self, board: &Board, player: Player) -> Vec<FeatureCounts> {
        let own = board.pieces(player);
        let opponent = board.pieces(player.other());
        let empty = board.spaces();
        self.pieces
            .iter()
            .zip(&self.spaces)
            .map(|(&p, &s)| FeatureCounts {
                player: (p & own).count() as usize,
                opponent: (p & opponent).count() as usize,
                spaces: (s & empty).count() as usize,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::pattern::Pattern;

    #[test]
    fn test_matches_per_feature_counts() {
        let g = Geometry::new(4, 9, 4).unwrap();
        let features: Vec<HeuristicFeature> = g
            .lines()
            .iter()
            .map(|&line| HeuristicFeature::open_line(line, 3).unwrap())
            .chain([HeuristicFeature::new(
                Pattern::from_positions([0, 10]),
                Pattern::from_positions([20, 30]),
                1,
            )
            .unwrap()])
            .collect();

        let mut evaluator = FeatureEvaluator::new();
        for (i, feature) in features.iter().enumerate() {
            assert_eq!(evaluator.register_feature(feature), i);
        }
        assert_eq!(evaluator.len(), features.len());

        let board = Board::from_cells(
            &g,
            "o..x.....
             .o..x....
             ..o......
             .........",
        )
        .unwrap();

        for player in Player::ALL {
            let counts = evaluator.query(&board, player);
            for (i, feature) in features.iter().enumerate() {
                assert_eq!(counts[i].player, feature.count_pieces(&board, player));
                assert_eq!(counts[i].spaces, feature.count_spaces(&board));
                assert_eq!(counts[i], feature.counts(&board, player));
            }
        }
    }

    #[test]
    fn test_empty_evaluator() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let evaluator = FeatureEvaluator::new();
        assert!(evaluator.is_empty());
        assert!(evaluator.query(&Board::new(&g), Player::Player1).is_empty());
    }
}
