//! Search result types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::board::Board;
use crate::moves::Move;
use crate::player::Player;
use crate::search::tree::GameTree;

/// Why a search stopped expanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The game-theoretic value of the root is known.
    Determined,
    /// The expansion limit derived from `gamma` was reached.
    IterationLimit,
    /// The best root move stayed the same for `stopping_thresh` expansions.
    Repetitions,
    NodeBudget,
    DepthLimit,
    TimeLimit,
    /// The principal variation ends in a node with nothing left to expand.
    Stalled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::Determined => "determined",
            StopReason::IterationLimit => "iteration limit",
            StopReason::Repetitions => "repetitions",
            StopReason::NodeBudget => "node budget",
            StopReason::DepthLimit => "depth limit",
            StopReason::TimeLimit => "time limit",
            StopReason::Stalled => "stalled",
        };
        f.write_str(name)
    }
}

/// Shape of the tree a search built.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SearchStats {
    pub node_count: usize,
    pub num_leaves: usize,
    pub num_internal_nodes: usize,
    pub mean_depth: f64,
    pub average_branching_factor: f64,
    pub depth_of_pv: usize,
    /// Number of successful expansions.
    pub iterations: usize,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn from_tree(tree: &GameTree, iterations: usize, elapsed: Duration) -> Self {
        SearchStats {
            node_count: tree.node_count(),
            num_leaves: tree.num_leaves(),
            num_internal_nodes: tree.num_internal_nodes(),
            mean_depth: tree.mean_depth(),
            average_branching_factor: tree.average_branching_factor(),
            depth_of_pv: tree.depth_of_pv(),
            iterations,
            elapsed,
        }
    }
}

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// The position searched.
    #[serde(skip)]
    pub root: Board,
    /// The move to play.
    pub best_move: Move,
    /// Value of `best_move` from the point of view of the player to move.
    pub score: f64,
    /// Exact game-theoretic value of the root when the search proved it,
    /// positive when player 1 wins.
    pub proven_value: Option<f64>,
    pub stop_reason: StopReason,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Returns `true` if the chosen move is known to win for the mover.
    pub fn is_proven_win(&self) -> bool {
        match self.proven_value {
            Some(v) if self.root.active_player() == Player::Player1 => v > 0.0,
            Some(v) => v < 0.0,
            None => false,
        }
    }
}
