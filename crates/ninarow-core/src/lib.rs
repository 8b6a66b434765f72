//! Heuristic best-first search for N-in-a-row games.
//!
//! The crate models a board of up to 64 cells ([`Board`], [`Pattern`]),
//! scores positions with weighted tactical features ([`Heuristic`]) and
//! searches the game tree best first ([`search::Search`]). [`model`] builds
//! heuristics from fitted parameter vectors and replays recorded positions.

pub mod bitboard;
pub mod board;
pub mod error;
pub mod feature;
pub mod feature_evaluator;
pub mod feature_set;
pub mod geometry;
pub mod heuristic;
pub mod model;
pub mod moves;
pub mod pattern;
pub mod player;
pub mod search;

pub use board::Board;
pub use error::{NInARowError, Result};
pub use feature::HeuristicFeature;
pub use geometry::{Direction, Geometry};
pub use heuristic::{Aggregation, Heuristic};
pub use model::{DefaultModel, Model};
pub use moves::Move;
pub use pattern::Pattern;
pub use player::Player;
pub use search::options::SearchOptions;
pub use search::search_context::SearchContext;
pub use search::search_result::{SearchResult, StopReason};
pub use search::{BestFirstSearch, NInARowBestFirstSearch};
