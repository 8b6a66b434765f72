//! Model factories and the recorded-position oracle.
//!
//! A [`Model`] turns a parameter vector into a [`Heuristic`] and a heuristic
//! plus board into a ready-to-run search. [`DefaultModel`] works on the ten
//! parameters fitted against human play and expands them to the full
//! heuristic parameter vector with [`bads_parameters_to_model_parameters`].

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::board::Board;
use crate::error::{NInARowError, Result};
use crate::feature_set::KINDS_PER_DIRECTION;
use crate::geometry::{Direction, Geometry};
use crate::heuristic::Heuristic;
use crate::moves::Move;
use crate::player::Player;
use crate::search::NInARowBestFirstSearch;
use crate::search::options::SearchOptions;

/// Number of fitted parameters of the default model.
pub const FITTED_PARAMETER_COUNT: usize = 10;

/// Factory for heuristics and searches.
pub trait Model: Send + Sync {
    fn create_heuristic(&self, params: &[f64]) -> Result<Arc<Heuristic>>;

    fn create_search(&self, heuristic: Arc<Heuristic>, board: &Board)
    -> Result<NInARowBestFirstSearch>;
}

/// The model used for fitting against recorded games.
///
/// Fitted parameters, in order: `pruning_thresh`, `gamma`,
/// `feature_drop_rate`, `lapse_rate`, `pass_scale`, `center_weight` and the
/// weights of the connected two, unconnected two, open three and four in a
/// row motifs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultModel {
    geometry: Geometry,
    search_options: SearchOptions,
}

impl DefaultModel {
    pub const PARAMETER_NAMES: [&'static str; FITTED_PARAMETER_COUNT] = [
        "pruning_thresh",
        "gamma",
        "feature_drop_rate",
        "lapse_rate",
        "pass_scale",
        "center_weight",
        "w_connected_two",
        "w_unconnected_two",
        "w_open_n_minus_one",
        "w_n_in_a_row",
    ];
    /// Starting point of a fit.
    pub const X0: [f64; FITTED_PARAMETER_COUNT] =
        [2.0, 0.02, 0.2, 0.05, 1.2, 0.8, 1.0, 0.4, 3.5, 5.0];
    pub const LOWER_BOUNDS: [f64; FITTED_PARAMETER_COUNT] =
        [0.1, 0.001, 0.0, 0.0, 0.25, -10.0, -10.0, -10.0, -10.0, -10.0];
    pub const UPPER_BOUNDS: [f64; FITTED_PARAMETER_COUNT] =
        [10.0, 1.0, 1.0, 1.0, 4.0, 10.0, 10.0, 10.0, 10.0, 10.0];
    pub const PLAUSIBLE_LOWER_BOUNDS: [f64; FITTED_PARAMETER_COUNT] =
        [1.0, 0.1, 0.001, 0.001, 0.5, -5.0, -5.0, -5.0, -5.0, -5.0];
    pub const PLAUSIBLE_UPPER_BOUNDS: [f64; FITTED_PARAMETER_COUNT] =
        [9.99, 0.99, 0.5, 0.5, 2.0, 5.0, 5.0, 5.0, 5.0, 5.0];

    /// Creates a model with noise enabled, as used when matching human play.
    pub fn new(geometry: Geometry) -> Self {
        DefaultModel {
            geometry,
            search_options: SearchOptions::with_noise(0),
        }
    }

    #[must_use]
    pub fn with_search_options(mut self, search_options: SearchOptions) -> Self {
        self.search_options = search_options;
        self
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn search_options(&self) -> &SearchOptions {
        &self.search_options
    }

    /// Returns `true` if every parameter lies within the hard bounds.
    pub fn within_bounds(params: &[f64]) -> bool {
        params.len() == FITTED_PARAMETER_COUNT
            && params
                .iter()
                .zip(Self::LOWER_BOUNDS.iter().zip(&Self::UPPER_BOUNDS))
                .all(|(p, (lo, hi))| (lo..=hi).contains(&p))
    }
}

impl Model for DefaultModel {
    fn create_heuristic(&self, params: &[f64]) -> Result<Arc<Heuristic>> {
        let full = bads_parameters_to_model_parameters(params)?;
        Ok(Arc::new(Heuristic::from_parameters(&self.geometry, &full)?))
    }

    fn create_search(
        &self,
        heuristic: Arc<Heuristic>,
        board: &Board,
    ) -> Result<NInARowBestFirstSearch> {
        if board.geometry() != heuristic.geometry() {
            return Err(NInARowError::InvalidBoard(
                "board and heuristic geometries differ".to_string(),
            ));
        }
        Ok(NInARowBestFirstSearch::new(
            heuristic,
            *board,
            self.search_options,
        ))
    }
}

/// Expands the ten fitted parameters into a full heuristic parameter vector.
///
/// Motif weights are shared across the four directions; the passive weights
/// are the active ones scaled by `pass_scale` and every group gets the same
/// drop rate.
///
/// # Errors
/// [`NInARowError::InvalidWeights`] unless exactly ten values are given.
pub fn bads_parameters_to_model_parameters(params: &[f64]) -> Result<Vec<f64>> {
    if params.len() != FITTED_PARAMETER_COUNT {
        return Err(NInARowError::InvalidWeights(format!(
            "expected {FITTED_PARAMETER_COUNT} fitted parameters, got {}",
            params.len()
        )));
    }
    let directions = Direction::ALL.len();
    let weights = &params[6..6 + KINDS_PER_DIRECTION];

    let mut out = vec![10000.0, params[0], params[1], params[3], 1.0, 1.0, params[5]];
    for _ in 0..directions {
        out.extend_from_slice(weights);
    }
    for _ in 0..directions {
        out.extend(weights.iter().map(|w| w * params[4]));
    }
    out.extend(std::iter::repeat_n(params[2], directions * KINDS_PER_DIRECTION));
    Ok(out)
}

/// A move observed in a recorded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRecord {
    /// Position before the move.
    pub board: Board,
    /// Cell that was played.
    pub position: usize,
    pub player: Player,
}

/// The engine's answer for one [`PositionRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordOutcome {
    /// Move chosen by the engine.
    pub chosen: Move,
    /// Score of the chosen move for the player to move.
    pub score: f64,
    /// Whether the engine chose the recorded move.
    pub matches: bool,
}

/// Searches every record with the model and reports the engine's choices.
///
/// Records are searched in parallel, each with its own search seeded with
/// `seed + index`, so the outcome does not depend on the thread count.
///
/// # Errors
/// Fails on the first invalid parameter vector, record, or search error.
pub fn evaluate_records<M: Model>(
    model: &M,
    params: &[f64],
    records: &[PositionRecord],
    seed: u64,
) -> Result<Vec<RecordOutcome>> {
    let heuristic = model.create_heuristic(params)?;
    debug!(records = records.len(), "evaluating records");
    records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            if record.player != record.board.active_player() {
                return Err(NInARowError::invalid_move(
                    record.position,
                    format!("recorded move by {} out of turn", record.player),
                ));
            }
            record.board.geometry().check_position(record.position)?;
            let mut search = model
                .create_search(Arc::clone(&heuristic), &record.board)?
                .with_seed(seed.wrapping_add(index as u64));
            let result = search.complete_search()?;
            Ok(RecordOutcome {
                chosen: result.best_move,
                score: result.score,
                matches: result.best_move.position == record.position,
            })
        })
        .collect()
}
