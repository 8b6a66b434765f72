use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Budgets and random state of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Maximum number of nodes below the root.
    pub node_budget: Option<usize>,
    /// Leaves at this depth are not expanded; the root has depth 1.
    pub max_depth: Option<usize>,
    /// Wall clock limit checked before each expansion.
    pub time_limit_ms: Option<u64>,
    pub seed: u64,
    /// Enables move noise, feature dropout and lapses.
    pub noise: bool,
}

impl SearchOptions {
    /// Deterministic options with a small node budget.
    #[must_use]
    pub fn for_testing() -> Self {
        SearchOptions {
            node_budget: Some(10_000),
            ..Default::default()
        }
    }

    /// Options with noise enabled and the given seed.
    #[must_use]
    pub fn with_noise(seed: u64) -> Self {
        SearchOptions {
            seed,
            noise: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_node_budget(mut self, node_budget: Option<usize>) -> Self {
        self.node_budget = node_budget;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit_ms = time_limit.map(|t| t.as_millis() as u64);
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            node_budget: Some(1_000_000),
            max_depth: None,
            time_limit_ms: None,
            seed: 0,
            noise: false,
        }
    }
}
