//! Heuristic evaluation and move ranking.
//!
//! A [`Heuristic`] combines weighted feature groups, a centre preference and a
//! handful of global search parameters. It is immutable once built and is
//! shared between searches behind an `Arc`; all random state lives in the
//! caller's [`SearchContext`].
//!
//! # Parameter vector
//!
//! [`Heuristic::from_parameters`] reads a flat vector laid out as
//!
//! ```text
//! [stopping_thresh, pruning_thresh, gamma, lapse_rate, opp_scale,
//!  exploration_constant, center_weight,
//!  weight_act[0..G], weight_pass[0..G], drop_rate[0..G]]
//! ```
//!
//! where `G` is the number of feature groups (see [`crate::feature_set`]).

use std::sync::{PoisonError, RwLock};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::error::{NInARowError, Result};
use crate::feature::HeuristicFeature;
use crate::feature_evaluator::FeatureEvaluator;
use crate::feature_set::default_feature_groups;
use crate::geometry::Geometry;
use crate::moves::{Move, MoveList, sort_moves};
use crate::player::Player;
use crate::search::search_context::SearchContext;
use crate::search::search_result::SearchResult;
use crate::search::tree::GameTree;

/// Number of scalar parameters preceding the per-group weights.
pub const GLOBAL_PARAMETER_COUNT: usize = 7;

/// Weights shared by every feature of one group.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureGroupWeight {
    /// Reward for holding a feature on one's own turn.
    pub weight_act: f64,
    /// Penalty for the opponent holding a feature.
    pub weight_pass: f64,
    /// Probability of dropping each feature of the group for one search.
    pub drop_rate: f64,
}

impl FeatureGroupWeight {
    pub fn new(weight_act: f64, weight_pass: f64, drop_rate: f64) -> Self {
        FeatureGroupWeight {
            weight_act,
            weight_pass,
            drop_rate,
        }
    }

    #[inline]
    pub fn diff_act_pass(&self) -> f64 {
        self.weight_act - self.weight_pass
    }
}

/// Scalar parameters of a heuristic and its search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicParameters {
    /// Consecutive repeats of the best root move after which a search stops.
    pub stopping_thresh: f64,
    /// Moves further than this from the best move are not expanded.
    pub pruning_thresh: f64,
    /// A search stops after `floor(1 / gamma) + 1` expansions.
    pub gamma: f64,
    /// Probability of playing a random move instead of the search result.
    pub lapse_rate: f64,
    /// Relative weight of the active player's features versus the opponent's.
    pub opp_scale: f64,
    pub exploration_constant: f64,
    /// Weight of the preference for cells near the centre.
    pub center_weight: f64,
}

impl Default for HeuristicParameters {
    fn default() -> Self {
        HeuristicParameters {
            stopping_thresh: 10000.0,
            pruning_thresh: 2.0,
            gamma: 0.02,
            lapse_rate: 0.05,
            opp_scale: 1.0,
            exploration_constant: 1.0,
            center_weight: 0.8,
        }
    }
}

impl HeuristicParameters {
    fn validate(&self) -> Result<()> {
        let values = [
            self.stopping_thresh,
            self.pruning_thresh,
            self.gamma,
            self.lapse_rate,
            self.opp_scale,
            self.exploration_constant,
            self.center_weight,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(NInARowError::InvalidWeights(format!(
                "non-finite global parameter in {values:?}"
            )));
        }
        if self.gamma <= 0.0 {
            return Err(NInARowError::InvalidWeights(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.lapse_rate) {
            return Err(NInARowError::InvalidWeights(format!(
                "lapse rate {} is not a probability",
                self.lapse_rate
            )));
        }
        if self.opp_scale <= -1.0 {
            return Err(NInARowError::InvalidWeights(format!(
                "opponent scale must exceed -1, got {}",
                self.opp_scale
            )));
        }
        Ok(())
    }

    /// Maximum number of expansions of one search.
    pub fn iteration_limit(&self) -> usize {
        (1.0 / self.gamma) as usize + 1
    }
}

/// Rule combining feature contributions into one score.
///
/// Applies to [`Heuristic::evaluate`] and to every move value produced by
/// [`Heuristic::get_moves`], so it shapes pruning and the node values of a
/// search tree as well.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// Plain sum of weighted contributions.
    #[default]
    WeightedSum,
    /// `tanh(scale * sum)`, bounding scores to `(-1, 1)`.
    Tanh { scale: f64 },
}

impl Aggregation {
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Aggregation::WeightedSum => value,
            Aggregation::Tanh { scale } => (scale * value).tanh(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RegisteredFeature {
    feature: HeuristicFeature,
    group: usize,
}

/// A weighted feature heuristic for one board geometry.
#[derive(Debug)]
pub struct Heuristic {
    geometry: Geometry,
    params: HeuristicParameters,
    c_self: f64,
    c_opp: f64,
    groups: Vec<FeatureGroupWeight>,
    features: Vec<RegisteredFeature>,
    evaluator: FeatureEvaluator,
    vtile: Vec<f64>,
    aggregation: Aggregation,
    outcomes: RwLock<FxHashMap<Board, f64>>,
}

impl Heuristic {
    fn with_groups(
        geometry: &Geometry,
        params: HeuristicParameters,
        groups: Vec<FeatureGroupWeight>,
    ) -> Result<Heuristic> {
        params.validate()?;
        for (i, group) in groups.iter().enumerate() {
            let values = [group.weight_act, group.weight_pass, group.drop_rate];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(NInARowError::InvalidWeights(format!(
                    "non-finite weight in feature group {i}"
                )));
            }
            if !(0.0..=1.0).contains(&group.drop_rate) {
                return Err(NInARowError::InvalidWeights(format!(
                    "drop rate {} of feature group {i} is not a probability",
                    group.drop_rate
                )));
            }
        }

        let (center_row, center_col) = (
            (geometry.height() as f64 - 1.0) / 2.0,
            (geometry.width() as f64 - 1.0) / 2.0,
        );
        let vtile = (0..geometry.size())
            .map(|i| {
                let dr = geometry.row(i) as f64 - center_row;
                let dc = geometry.col(i) as f64 - center_col;
                1.0 / (dr * dr + dc * dc).sqrt().max(0.5)
            })
            .collect();

        Ok(Heuristic {
            geometry: *geometry,
            params,
            c_self: 2.0 * params.opp_scale / (1.0 + params.opp_scale),
            c_opp: 2.0 / (1.0 + params.opp_scale),
            groups,
            features: Vec::new(),
            evaluator: FeatureEvaluator::new(),
            vtile,
            aggregation: Aggregation::default(),
            outcomes: RwLock::new(FxHashMap::default()),
        })
    }

    /// Builds a heuristic from `(feature, weight)` pairs.
    ///
    /// Each feature becomes its own group with equal active and passive weight
    /// and no dropout. The centre preference is off, so [`evaluate`](Self::evaluate)
    /// is exactly the weighted count of features held.
    ///
    /// # Errors
    ///
    /// [`NInARowError::InvalidWeights`] if the list is empty or a weight is not
    /// finite.
    pub fn create(
        geometry: &Geometry,
        feature_weight_pairs: Vec<(HeuristicFeature, f64)>,
    ) -> Result<Heuristic> {
        if feature_weight_pairs.is_empty() {
            return Err(NInARowError::InvalidWeights(
                "a heuristic needs at least one feature".to_string(),
            ));
        }
        let params = HeuristicParameters {
            center_weight: 0.0,
            ..HeuristicParameters::default()
        };
        let groups = feature_weight_pairs
            .iter()
            .map(|&(_, w)| FeatureGroupWeight::new(w, w, 0.0))
            .collect();
        let mut heuristic = Heuristic::with_groups(geometry, params, groups)?;
        for (group, (feature, _)) in feature_weight_pairs.into_iter().enumerate() {
            heuristic.add_feature(group, feature)?;
        }
        Ok(heuristic)
    }

    /// Builds a heuristic over the default feature registry from a flat
    /// parameter vector.
    pub fn from_parameters(geometry: &Geometry, params: &[f64]) -> Result<Heuristic> {
        let groups = default_feature_groups(geometry)?;
        Heuristic::from_parameters_with_groups(geometry, params, groups)
    }

    /// Builds a heuristic from a flat parameter vector and explicit feature
    /// groups; the vector must hold three weights per group. One extra
    /// trailing group is accepted when both of its weights are zero.
    pub fn from_parameters_with_groups(
        geometry: &Geometry,
        params: &[f64],
        feature_groups: Vec<Vec<HeuristicFeature>>,
    ) -> Result<Heuristic> {
        if params.len() < GLOBAL_PARAMETER_COUNT || (params.len() - GLOBAL_PARAMETER_COUNT) % 3 != 0
        {
            return Err(NInARowError::InvalidWeights(format!(
                "expected {GLOBAL_PARAMETER_COUNT} + 3k parameters, got {}",
                params.len()
            )));
        }
        let num_groups = (params.len() - GLOBAL_PARAMETER_COUNT) / 3;
        let defined = feature_groups.len();
        let packs = &params[GLOBAL_PARAMETER_COUNT..];
        // A trailing group with zero weights contributes nothing and is skipped.
        let unused_trailing_group = num_groups == defined + 1
            && packs[defined] == 0.0
            && packs[defined + num_groups] == 0.0;
        if num_groups != defined && !unused_trailing_group {
            return Err(NInARowError::InvalidWeights(format!(
                "parameters describe {num_groups} feature groups but {defined} are defined"
            )));
        }

        let global = HeuristicParameters {
            stopping_thresh: params[0],
            pruning_thresh: params[1],
            gamma: params[2],
            lapse_rate: params[3],
            opp_scale: params[4],
            exploration_constant: params[5],
            center_weight: params[6],
        };
        let groups = (0..defined)
            .map(|j| {
                FeatureGroupWeight::new(packs[j], packs[j + num_groups], packs[j + 2 * num_groups])
            })
            .collect();

        let mut heuristic = Heuristic::with_groups(geometry, global, groups)?;
        for (group, features) in feature_groups.into_iter().enumerate() {
            for feature in features {
                heuristic.add_feature(group, feature)?;
            }
        }
        debug!(
            groups = defined,
            features = heuristic.features.len(),
            "heuristic created"
        );
        Ok(heuristic)
    }

    /// Replaces the aggregation rule.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Heuristic {
        self.aggregation = aggregation;
        self
    }

    /// Adds a feature to an existing group.
    pub fn add_feature(&mut self, group: usize, feature: HeuristicFeature) -> Result<()> {
        if group >= self.groups.len() {
            return Err(NInARowError::InvalidWeights(format!(
                "feature added to group {group} but only {} groups exist",
                self.groups.len()
            )));
        }
        if !self
            .geometry
            .full_mask()
            .contains_all(feature.pieces().bits() | feature.spaces().bits())
        {
            return Err(NInARowError::InvalidFeature(format!(
                "feature {feature} does not fit the board"
            )));
        }
        self.evaluator.register_feature(&feature);
        self.features.push(RegisteredFeature { feature, group });
        Ok(())
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn parameters(&self) -> &HeuristicParameters {
        &self.params
    }

    #[inline]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn feature_group_weights(&self) -> &[FeatureGroupWeight] {
        &self.groups
    }

    /// Registered features with their group index, in registration order.
    pub fn features(&self) -> impl Iterator<Item = (&HeuristicFeature, usize)> {
        self.features.iter().map(|f| (&f.feature, f.group))
    }

    /// Drop rate of each registered feature, in registration order.
    pub fn feature_drop_rates(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.iter().map(|f| self.groups[f.group].drop_rate)
    }

    /// Centre preference of a cell.
    #[inline]
    pub fn center_value(&self, position: usize) -> f64 {
        self.vtile[position]
    }

    /// Raw weighted sum from the active player's point of view.
    fn active_value(&self, board: &Board, enabled: impl Fn(usize) -> bool) -> f64 {
        let player = board.active_player();
        let other = player.other();
        let mut val = 0.0;
        for i in board.pieces(player) {
            val += self.params.center_weight * self.vtile[i];
        }
        for i in board.pieces(other) {
            val -= self.params.center_weight * self.vtile[i];
        }

        let counts = self.evaluator.query(board, player);
        for (i, registered) in self.features.iter().enumerate() {
            if !enabled(i) {
                continue;
            }
            let c = counts[i];
            let weights = &self.groups[registered.group];
            if registered.feature.contained_in_counts(c.player, c.spaces) {
                val += weights.weight_act;
            } else if registered.feature.contained_in_counts(c.opponent, c.spaces) {
                val -= weights.weight_pass;
            }
        }
        val
    }

    /// Scores `board` for `player`; higher is better for `player`.
    ///
    /// Every feature takes part. Features held by the player to move count
    /// with their active weight, features held by the other side with their
    /// passive weight.
    pub fn evaluate(&self, board: &Board, player: Player) -> f64 {
        let active = self.active_value(board, |_| true);
        let value = if board.active_player() == player {
            active
        } else {
            -active
        };
        self.aggregation.apply(value)
    }

    /// Player 1's score of `board` with the context's dropout applied.
    pub(crate) fn evaluate_for_search(&self, board: &Board, ctx: &SearchContext) -> f64 {
        let active = self.active_value(board, |i| ctx.feature_enabled(i));
        let value = if board.active_player() == Player::Player1 {
            active
        } else {
            -active
        };
        self.aggregation.apply(value)
    }

    /// Values every empty cell as a move for the active player.
    ///
    /// The value of a move is the change in the heuristic it causes, weighted
    /// towards `eval_player`'s features by the opponent scale and passed
    /// through the aggregation rule. Moves are returned best first, ties
    /// broken by lowest position.
    pub fn get_moves(&self, board: &Board, eval_player: Player, ctx: &mut SearchContext) -> MoveList {
        let player = board.active_player();
        let (c_act, c_pass) = if player == eval_player {
            (self.c_self, self.c_opp)
        } else {
            (self.c_opp, self.c_self)
        };

        let counts = self.evaluator.query(board, player);
        let mut delta = 0.0;
        for (i, registered) in self.features.iter().enumerate() {
            if !ctx.feature_enabled(i) {
                continue;
            }
            let c = counts[i];
            let diff = self.groups[registered.group].diff_act_pass();
            if registered.feature.contained_in_counts(c.player, c.spaces) {
                delta -= c_pass * diff;
            } else if registered.feature.contained_in_counts(c.opponent, c.spaces) {
                delta -= c_act * diff;
            }
        }

        let mut candidates: Vec<Option<Move>> = vec![None; self.geometry.size()];
        let spaces = board.spaces();
        for i in spaces {
            let value = delta + self.params.center_weight * self.vtile[i] + ctx.move_noise();
            candidates[i] = Some(Move::new(i, value, player));
        }

        for (i, registered) in self.features.iter().enumerate() {
            if !ctx.feature_enabled(i) {
                continue;
            }
            let c = counts[i];
            let feature = &registered.feature;
            let weights = &self.groups[registered.group];

            if feature.can_be_completed_counts(c.player, c.opponent, c.spaces) {
                let missing = feature.missing_pieces(board, player);
                if missing.len() == 1 {
                    if let Some(mv) = missing.bits().lsb().and_then(|p| candidates[p].as_mut()) {
                        mv.value += c_pass * weights.weight_pass;
                    }
                }
            }

            let removable = feature.can_be_removed_counts(c.player, c.spaces);
            let opponent_removable = feature.can_be_removed_counts(c.opponent, c.spaces);
            if removable || opponent_removable {
                for p in feature.spaces().bits() & spaces {
                    if let Some(mv) = candidates[p].as_mut() {
                        if removable {
                            mv.value -= c_pass * weights.weight_pass;
                        }
                        if opponent_removable {
                            mv.value += c_act * weights.weight_act;
                        }
                    }
                }
            }
        }

        let mut moves: MoveList = candidates
            .into_iter()
            .flatten()
            .map(|mut mv| {
                mv.value = self.aggregation.apply(mv.value);
                mv
            })
            .collect();
        sort_moves(&mut moves);
        moves
    }

    /// Moves whose value lies within the pruning threshold of the best move.
    pub fn get_pruned_moves(
        &self,
        board: &Board,
        eval_player: Player,
        ctx: &mut SearchContext,
    ) -> MoveList {
        let mut moves = self.get_moves(board, eval_player, ctx);
        if let Some(best) = moves.first().map(|m| m.value) {
            let keep = moves
                .iter()
                .skip(1)
                .take_while(|m| (best - m.value).abs() < self.params.pruning_thresh)
                .count()
                + 1;
            moves.truncate(keep);
        }
        moves
    }

    /// A uniformly random empty cell for the active player.
    pub fn get_random_move(&self, board: &Board, ctx: &mut SearchContext) -> Option<Move> {
        let spaces = board.spaces();
        if spaces.is_empty() {
            return None;
        }
        let index = ctx.random_index(spaces.count() as usize);
        spaces
            .iter()
            .nth(index)
            .map(|p| Move::new(p, 0.0, board.active_player()))
    }

    /// Picks the move to play from a finished search tree.
    ///
    /// With noise enabled the heuristic lapses with probability `lapse_rate`
    /// and plays a random move instead.
    pub fn select_move(&self, tree: &GameTree, ctx: &mut SearchContext) -> Result<Move> {
        if ctx.lapse(self.params.lapse_rate) {
            let board = tree.board(tree.root());
            return self
                .get_random_move(board, ctx)
                .ok_or(NInARowError::NoLegalMoves);
        }
        tree.best_move()
    }

    /// Post-search notification.
    ///
    /// Records the exact value of the root when the search proved the outcome
    /// of the game. Each board is recorded at most once.
    pub fn complete_search(&self, result: &SearchResult) {
        let Some(value) = result.proven_value else {
            return;
        };
        let mut outcomes = self.outcomes.write().unwrap_or_else(PoisonError::into_inner);
        outcomes.entry(result.root).or_insert(value);
    }

    /// Exact value recorded for `board` by a previous search, from player 1's
    /// point of view.
    pub fn recorded_outcome(&self, board: &Board) -> Option<f64> {
        self.outcomes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(board)
            .copied()
    }

    /// Number of boards with a recorded outcome.
    pub fn recorded_outcome_count(&self) -> usize {
        self.outcomes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_set::DEFAULT_GROUP_COUNT;
    use crate::geometry::Direction;
    use crate::pattern::Pattern;

    fn four_by_nine() -> Geometry {
        Geometry::new(4, 9, 4).unwrap()
    }

    fn default_params() -> Vec<f64> {
        let mut params = vec![10000.0, 2.0, 0.02, 0.05, 1.0, 1.0, 0.8];
        let weights = [1.0, 0.4, 3.5, 5.0];
        for _ in 0..2 {
            for _ in 0..4 {
                params.extend(weights);
            }
        }
        params.extend([0.2; DEFAULT_GROUP_COUNT]);
        params
    }

    #[test]
    fn test_parameter_vector_layout() {
        let h = Heuristic::from_parameters(&four_by_nine(), &default_params()).unwrap();
        assert_eq!(h.parameters().pruning_thresh, 2.0);
        assert_eq!(h.parameters().iteration_limit(), 51);
        assert_eq!(h.feature_group_weights().len(), DEFAULT_GROUP_COUNT);
        assert_eq!(h.feature_group_weights()[2], FeatureGroupWeight::new(3.5, 3.5, 0.2));
        assert_eq!(h.feature_group_weights()[7].weight_act, 5.0);
    }

    #[test]
    fn test_rejects_malformed_parameters() {
        let g = four_by_nine();
        assert!(matches!(
            Heuristic::from_parameters(&g, &[1.0; 6]),
            Err(NInARowError::InvalidWeights(_))
        ));
        assert!(Heuristic::from_parameters(&g, &[1.0; 11]).is_err());
        // Right shape, wrong number of groups for the default registry.
        assert!(Heuristic::from_parameters(&g, &[0.5; 10]).is_err());

        let mut params = default_params();
        params[10] = f64::NAN;
        assert!(Heuristic::from_parameters(&g, &params).is_err());

        let mut params = default_params();
        params[2] = 0.0;
        assert!(Heuristic::from_parameters(&g, &params).is_err());

        let mut params = default_params();
        *params.last_mut().unwrap() = 1.5;
        assert!(Heuristic::from_parameters(&g, &params).is_err());
    }

    fn with_trailing_group(params: &[f64], weight_act: f64, weight_pass: f64) -> Vec<f64> {
        let block = GLOBAL_PARAMETER_COUNT;
        let mut out = params[..block + DEFAULT_GROUP_COUNT].to_vec();
        out.push(weight_act);
        out.extend_from_slice(&params[block + DEFAULT_GROUP_COUNT..block + 2 * DEFAULT_GROUP_COUNT]);
        out.push(weight_pass);
        out.extend_from_slice(&params[block + 2 * DEFAULT_GROUP_COUNT..]);
        out.push(0.2);
        out
    }

    #[test]
    fn test_accepts_unused_trailing_group() {
        let g = four_by_nine();
        let params = default_params();
        let extended = with_trailing_group(&params, 0.0, 0.0);
        assert_eq!(extended.len(), 58);

        let plain = Heuristic::from_parameters(&g, &params).unwrap();
        let h = Heuristic::from_parameters(&g, &extended).unwrap();
        assert_eq!(h.feature_group_weights(), plain.feature_group_weights());

        let board = Board::from_cells(&g, "oo.x..... ......... ......... .........").unwrap();
        for player in [Player::Player1, Player::Player2] {
            assert_eq!(h.evaluate(&board, player), plain.evaluate(&board, player));
        }

        for (act, pass) in [(1.0, 0.0), (0.0, 0.5)] {
            assert!(matches!(
                Heuristic::from_parameters(&g, &with_trailing_group(&params, act, pass)),
                Err(NInARowError::InvalidWeights(_))
            ));
        }
    }

    #[test]
    fn test_create_rejects_bad_weights() {
        let g = Geometry::new(3, 3, 3).unwrap();
        assert!(Heuristic::create(&g, vec![]).is_err());

        let line = Pattern::line(&g, 0, Direction::Horizontal).unwrap();
        let feature = HeuristicFeature::open_line(line, 3).unwrap();
        assert!(matches!(
            Heuristic::create(&g, vec![(feature, f64::INFINITY)]),
            Err(NInARowError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_evaluate_is_weighted_feature_count() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let pairs = g
            .lines()
            .iter()
            .map(|&line| (HeuristicFeature::open_line(line, 2).unwrap(), 1.5))
            .collect();
        let h = Heuristic::create(&g, pairs).unwrap();

        // Player 1 to move and holding the open top row; both columns under
        // player 1's pieces are contested and player 2 holds nothing.
        let board = Board::from_cells(&g, "oo. x.. .x.").unwrap();
        assert_eq!(board.active_player(), Player::Player1);
        assert_eq!(h.evaluate(&board, Player::Player1), 1.5);
        assert_eq!(h.evaluate(&board, Player::Player2), -1.5);
    }

    #[test]
    fn test_evaluate_is_antisymmetric() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let board = Board::from_cells(
            &g,
            "....o....
             ...ox....
             ...x.o...
             .........",
        )
        .unwrap();
        let p1 = h.evaluate(&board, Player::Player1);
        let p2 = h.evaluate(&board, Player::Player2);
        assert!((p1 + p2).abs() < 1e-12);
    }

    #[test]
    fn test_aggregation_tanh() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let line = Pattern::line(&g, 0, Direction::Horizontal).unwrap();
        let h = Heuristic::create(&g, vec![(HeuristicFeature::open_line(line, 2).unwrap(), 2.0)])
            .unwrap()
            .with_aggregation(Aggregation::Tanh { scale: 0.5 });
        let board = Board::from_cells(&g, "oo. x.. .x.").unwrap();
        assert_eq!(board.active_player(), Player::Player1);
        // Player 1 to move and holding the feature.
        let expected = (0.5f64 * 2.0).tanh();
        assert!((h.evaluate(&board, Player::Player1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_aggregation_shapes_move_values_and_pruning() {
        let g = four_by_nine();
        let plain = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let squashed = Heuristic::from_parameters(&g, &default_params())
            .unwrap()
            .with_aggregation(Aggregation::Tanh { scale: 1e-9 });
        let board = Board::from_cells(
            &g,
            ".ooo.....
             .........
             xx.......
             x........",
        )
        .unwrap();

        let mut ctx = SearchContext::new(0, false);
        ctx.begin_search(&plain);
        let plain_moves = plain.get_moves(&board, Player::Player1, &mut ctx);
        let plain_pruned = plain.get_pruned_moves(&board, Player::Player1, &mut ctx);
        let squashed_moves = squashed.get_moves(&board, Player::Player1, &mut ctx);
        let squashed_pruned = squashed.get_pruned_moves(&board, Player::Player1, &mut ctx);

        for mv in &squashed_moves {
            let raw = plain_moves
                .iter()
                .find(|m| m.position == mv.position)
                .unwrap();
            assert!((mv.value - (1e-9 * raw.value).tanh()).abs() < 1e-18);
        }
        assert!(plain_pruned.len() < plain_moves.len());
        assert_eq!(squashed_pruned.len(), board.count_spaces());
    }

    #[test]
    fn test_get_moves_covers_empty_cells_sorted() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let board = Board::from_cells(
            &g,
            "....o....
             ....x....
             .........
             .........",
        )
        .unwrap();
        let mut ctx = SearchContext::new(0, false);
        ctx.begin_search(&h);
        let moves = h.get_moves(&board, Player::Player1, &mut ctx);
        assert_eq!(moves.len(), 34);
        assert!(moves.iter().all(|m| m.player == Player::Player1));
        assert!(moves.windows(2).all(|w| Move::ranking(&w[0], &w[1]).is_le()));
    }

    #[test]
    fn test_get_moves_blocks_three_in_a_row() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        // Player 2 threatens to complete the bottom row segment at column 3.
        let board = Board::from_cells(
            &g,
            "o...o....
             .........
             .....o...
             xxx......",
        )
        .unwrap();
        let mut ctx = SearchContext::new(0, false);
        ctx.begin_search(&h);
        let moves = h.get_moves(&board, Player::Player1, &mut ctx);
        assert_eq!(moves[0].position, g.position(3, 3).unwrap());
    }

    #[test]
    fn test_get_moves_takes_the_win() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let board = Board::from_cells(
            &g,
            ".ooo.....
             .........
             xx.......
             x........",
        )
        .unwrap();
        let mut ctx = SearchContext::new(0, false);
        ctx.begin_search(&h);
        let moves = h.get_moves(&board, Player::Player1, &mut ctx);
        let best = moves[0].position;
        assert!(best == 0 || best == 4, "unexpected best move {best}");
    }

    #[test]
    fn test_pruned_moves_within_threshold() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let board = Board::new(&g);
        let mut ctx = SearchContext::new(0, false);
        ctx.begin_search(&h);
        let all = h.get_moves(&board, Player::Player1, &mut ctx);
        let pruned = h.get_pruned_moves(&board, Player::Player1, &mut ctx);
        assert!(!pruned.is_empty());
        assert!(pruned.len() <= all.len());
        let best = pruned[0].value;
        assert!(pruned.iter().all(|m| (best - m.value).abs() < 2.0 || m.value == best));
        if let Some(next) = all.get(pruned.len()) {
            assert!((best - next.value).abs() >= 2.0);
        }
    }

    #[test]
    fn test_noise_is_seeded() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        let board = Board::new(&g);
        let run = |seed| {
            let mut ctx = SearchContext::new(seed, true);
            ctx.begin_search(&h);
            h.get_moves(&board, Player::Player1, &mut ctx)
                .iter()
                .map(|m| m.position)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_random_move_is_empty_cell() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let line = Pattern::line(&g, 0, Direction::Horizontal).unwrap();
        let h = Heuristic::create(&g, vec![(HeuristicFeature::open_line(line, 3).unwrap(), 1.0)])
            .unwrap();
        let board = Board::from_cells(&g, "oxo oxx xo.").unwrap();
        let mut ctx = SearchContext::new(5, true);
        let mv = h.get_random_move(&board, &mut ctx).unwrap();
        assert_eq!(mv.position, 8);
        assert_eq!(mv.player, Player::Player1);
        assert!(h.get_random_move(&Board::from_cells(&g, "oxo oxx xox").unwrap(), &mut ctx).is_none());
    }

    #[test]
    fn test_center_values() {
        let g = four_by_nine();
        let h = Heuristic::from_parameters(&g, &default_params()).unwrap();
        // Cells (1, 4) and (2, 4) sit half a row from the centre.
        assert_eq!(h.center_value(g.position(1, 4).unwrap()), 2.0);
        assert_eq!(h.center_value(g.position(2, 4).unwrap()), 2.0);
        assert!(h.center_value(0) < h.center_value(g.position(1, 3).unwrap()));

        let odd = Geometry::new(3, 3, 3).unwrap();
        let line = Pattern::line(&odd, 0, Direction::Horizontal).unwrap();
        let h = Heuristic::create(&odd, vec![(HeuristicFeature::open_line(line, 3).unwrap(), 1.0)])
            .unwrap();
        assert_eq!(h.center_value(4), 2.0);
    }
}
