//! Best-first game tree search.
//!
//! A [`Search`] repeatedly selects the leaf at the end of the principal
//! variation, expands it with the heuristic's pruned move list and
//! backpropagates the result. A [`StoppingRule`] decides when enough has been
//! seen; the node, depth and time budgets of [`SearchOptions`] cap the work
//! regardless of the rule.

pub mod options;
pub mod search_context;
pub mod search_result;
pub mod tree;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::board::Board;
use crate::error::{NInARowError, Result};
use crate::heuristic::Heuristic;
use crate::moves::Move;
use crate::player::Player;
use crate::search::options::SearchOptions;
use crate::search::search_context::SearchContext;
use crate::search::search_result::{SearchResult, SearchStats, StopReason};
use crate::search::tree::GameTree;

/// Decides when a search has expanded enough nodes.
pub trait StoppingRule: Default {
    /// Returns the reason to stop, if any, before the next expansion.
    fn should_stop(&self, tree: &GameTree, heuristic: &Heuristic) -> Option<StopReason>;

    /// Observes the tree after each successful expansion.
    fn on_node_expansion(&mut self, _tree: &GameTree) {}
}

/// Expands until the value of the root is proven.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestFirst;

impl StoppingRule for BestFirst {
    fn should_stop(&self, tree: &GameTree, _heuristic: &Heuristic) -> Option<StopReason> {
        tree.node(tree.root())
            .determined()
            .then_some(StopReason::Determined)
    }
}

/// Best-first search bounded by the heuristic's `gamma` and
/// `stopping_thresh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NInARowBestFirst {
    best_position: Option<usize>,
    repetitions: usize,
    iterations: usize,
}

impl NInARowBestFirst {
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Consecutive expansions after which the best root move was unchanged.
    #[inline]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }
}

impl StoppingRule for NInARowBestFirst {
    fn should_stop(&self, tree: &GameTree, heuristic: &Heuristic) -> Option<StopReason> {
        let params = heuristic.parameters();
        if tree.node(tree.root()).determined() {
            Some(StopReason::Determined)
        } else if self.iterations >= params.iteration_limit() {
            Some(StopReason::IterationLimit)
        } else if self.repetitions as f64 >= params.stopping_thresh {
            Some(StopReason::Repetitions)
        } else {
            None
        }
    }

    fn on_node_expansion(&mut self, tree: &GameTree) {
        let best = tree.best_move().ok().map(|m| m.position);
        if best.is_some() && best == self.best_position {
            self.repetitions += 1;
        } else {
            self.repetitions = 0;
        }
        self.best_position = best;
        self.iterations += 1;
    }
}

/// Lifecycle of a [`Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Expanding,
    Completed,
}

/// A best-first search from one board.
#[derive(Debug)]
pub struct Search<R: StoppingRule = NInARowBestFirst> {
    heuristic: Arc<Heuristic>,
    board: Board,
    options: SearchOptions,
    ctx: SearchContext,
    rule: R,
    tree: Option<GameTree>,
    state: SearchState,
    started: Option<Instant>,
    iterations: usize,
    stop_reason: Option<StopReason>,
    result: Option<SearchResult>,
}

/// The search used by the default model.
pub type NInARowBestFirstSearch = Search<NInARowBestFirst>;

/// A search that only stops once the root is proven or a budget runs out.
pub type BestFirstSearch = Search<BestFirst>;

impl<R: StoppingRule> Search<R> {
    pub fn new(heuristic: Arc<Heuristic>, board: Board, options: SearchOptions) -> Search<R> {
        Search {
            heuristic,
            board,
            ctx: SearchContext::new(options.seed, options.noise),
            options,
            rule: R::default(),
            tree: None,
            state: SearchState::Idle,
            started: None,
            iterations: 0,
            stop_reason: None,
            result: None,
        }
    }

    /// Replaces the seed of the search's random generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.options.seed = seed;
        self.ctx = SearchContext::new(seed, self.options.noise);
        self
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    #[inline]
    pub fn heuristic(&self) -> &Arc<Heuristic> {
        &self.heuristic
    }

    #[inline]
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// The tree built so far; `None` before the search begins.
    #[inline]
    pub fn tree(&self) -> Option<&GameTree> {
        self.tree.as_ref()
    }

    /// Number of successful expansions.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Draws the per-search random state and creates the root node.
    ///
    /// # Errors
    /// [`NInARowError::NoLegalMoves`] if the game on the board is over.
    pub fn begin_search(&mut self) -> Result<()> {
        if self.board.game_has_ended() {
            return Err(NInARowError::NoLegalMoves);
        }
        self.ctx.begin_search(&self.heuristic);
        let val = self.heuristic.evaluate_for_search(&self.board, &self.ctx);
        self.tree = Some(GameTree::new(self.board, val, self.options.node_budget));
        self.rule = R::default();
        self.iterations = 0;
        self.stop_reason = None;
        self.result = None;
        self.started = Some(Instant::now());
        self.state = SearchState::Expanding;
        debug!(
            player = %self.board.active_player(),
            dropped_features = self.ctx.dropped_features(),
            root_value = val,
            "search started"
        );
        Ok(())
    }

    /// Performs one expansion.
    ///
    /// Returns the reason the search stopped once no further expansion will
    /// happen, `None` while it keeps going.
    pub fn advance_search(&mut self) -> Result<Option<StopReason>> {
        match self.state {
            SearchState::Idle => self.begin_search()?,
            SearchState::Completed => return Ok(self.stop_reason),
            SearchState::Expanding => {}
        }
        if let Some(reason) = self.stop_reason {
            return Ok(Some(reason));
        }
        let Some(tree) = self.tree.as_mut() else {
            return Err(NInARowError::NoLegalMoves);
        };

        let reason = if let Some(reason) = self.rule.should_stop(tree, &self.heuristic) {
            Some(reason)
        } else if self
            .options
            .time_limit()
            .zip(self.started)
            .is_some_and(|(limit, started)| started.elapsed() >= limit)
        {
            Some(StopReason::TimeLimit)
        } else {
            let leaf = tree.select();
            let node = tree.node(leaf);
            if self.options.max_depth.is_some_and(|d| node.depth() >= d) {
                Some(StopReason::DepthLimit)
            } else {
                let eval_player = self.board.active_player();
                let moves = self
                    .heuristic
                    .get_pruned_moves(node.board(), eval_player, &mut self.ctx);
                if moves.is_empty() {
                    Some(StopReason::Stalled)
                } else {
                    match tree.expand(leaf, &moves) {
                        Ok(()) => {
                            self.iterations += 1;
                            self.rule.on_node_expansion(tree);
                            trace!(
                                iteration = self.iterations,
                                depth = tree.node(leaf).depth(),
                                children = moves.len(),
                                nodes = tree.node_count(),
                                "node expanded"
                            );
                            None
                        }
                        Err(NInARowError::TreeExhausted { budget }) => {
                            warn!(budget, nodes = tree.node_count(), "node budget exhausted");
                            Some(StopReason::NodeBudget)
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        };

        if let Some(reason) = reason {
            if reason == StopReason::TimeLimit || reason == StopReason::DepthLimit {
                warn!(%reason, nodes = tree.node_count(), "search stopped by a budget");
            }
            self.stop_reason = Some(reason);
        }
        Ok(reason)
    }

    /// Runs the search to the end and picks the move to play.
    ///
    /// When not even the root could be expanded, the move ranked first by the
    /// heuristic is chosen, subject to the same lapse as a full search.
    /// Completing an already
    /// completed search returns the same result again.
    ///
    /// # Errors
    /// [`NInARowError::NoLegalMoves`] if the game on the board is over.
    pub fn complete_search(&mut self) -> Result<SearchResult> {
        if self.state == SearchState::Completed
            && let Some(result) = &self.result
        {
            return Ok(result.clone());
        }
        if self.state == SearchState::Idle {
            self.begin_search()?;
        }
        let stop_reason = loop {
            if let Some(reason) = self.advance_search()? {
                break reason;
            }
        };
        let tree = self.tree.as_ref().ok_or(NInARowError::NoLegalMoves)?;
        let root = tree.node(tree.root());
        let mover = self.board.active_player();

        let (best_move, score) = if root.is_leaf() {
            let mv = if self.ctx.lapse(self.heuristic.parameters().lapse_rate) {
                self.heuristic.get_random_move(&self.board, &mut self.ctx)
            } else {
                let moves = self.heuristic.get_moves(&self.board, mover, &mut self.ctx);
                moves.first().copied()
            };
            let mv = mv.ok_or(NInARowError::NoLegalMoves)?;
            (mv, mv.value)
        } else {
            let mv = self.heuristic.select_move(tree, &mut self.ctx)?;
            let score = if mover == Player::Player1 {
                mv.value
            } else {
                -mv.value
            };
            (Move::new(mv.position, score, mover), score)
        };

        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        let result = SearchResult {
            root: self.board,
            best_move,
            score,
            proven_value: root.determined().then_some(root.pess() as f64),
            stop_reason,
            stats: SearchStats::from_tree(tree, self.iterations, elapsed),
        };

        self.ctx.complete_search();
        self.heuristic.complete_search(&result);
        self.state = SearchState::Completed;
        self.result = Some(result.clone());
        debug!(
            best_move = result.best_move.position,
            score = result.score,
            %stop_reason,
            nodes = result.stats.node_count,
            iterations = result.stats.iterations,
            "search completed"
        );
        Ok(result)
    }
}
