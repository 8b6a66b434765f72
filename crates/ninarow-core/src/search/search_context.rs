//! Per-search random state.
//!
//! Everything random about a search lives here rather than in the shared
//! [`Heuristic`]: the generator, the per-feature dropout mask drawn when the
//! search begins, and the switch that turns noise on or off. Two searches with
//! the same seed therefore make identical choices even when they share one
//! heuristic across threads.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::heuristic::Heuristic;

/// The search context that holds random state during one search.
#[derive(Debug, Clone)]
pub struct SearchContext {
    rng: ChaCha20Rng,
    noise: bool,
    enabled_features: Vec<bool>,
}

impl SearchContext {
    /// Creates a context with no features dropped.
    ///
    /// # Arguments
    /// * `seed` - Seed of the search's random generator.
    /// * `noise` - Whether move noise, dropout and lapses are applied.
    pub fn new(seed: u64, noise: bool) -> SearchContext {
        SearchContext {
            rng: ChaCha20Rng::seed_from_u64(seed),
            noise,
            enabled_features: Vec::new(),
        }
    }

    #[inline]
    pub fn noise_enabled(&self) -> bool {
        self.noise
    }

    /// Draws the dropout mask for a new search over `heuristic`'s features.
    ///
    /// Each feature is disabled with its group's drop rate. Without noise all
    /// features stay enabled.
    pub fn begin_search(&mut self, heuristic: &Heuristic) {
        let drop_rates = heuristic.feature_drop_rates();
        self.enabled_features = if self.noise {
            drop_rates
                .map(|rate| !self.rng.random_bool(rate))
                .collect()
        } else {
            drop_rates.map(|_| true).collect()
        };
    }

    /// Re-enables every feature once a search completes.
    pub fn complete_search(&mut self) {
        self.enabled_features.iter_mut().for_each(|e| *e = true);
    }

    /// Whether feature `index` takes part in the current search.
    #[inline]
    pub fn feature_enabled(&self, index: usize) -> bool {
        self.enabled_features.get(index).copied().unwrap_or(true)
    }

    /// Number of features dropped for the current search.
    pub fn dropped_features(&self) -> usize {
        self.enabled_features.iter().filter(|e| !**e).count()
    }

    /// Standard normal noise, or zero when noise is off.
    #[inline]
    pub fn move_noise(&mut self) -> f64 {
        if self.noise {
            StandardNormal.sample(&mut self.rng)
        } else {
            0.0
        }
    }

    /// Returns `true` when a lapse with probability `rate` occurs.
    #[inline]
    pub fn lapse(&mut self, rate: f64) -> bool {
        self.noise && self.rng.random_bool(rate)
    }

    /// Uniform index in `0..len`; `len` must be non-zero.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}
