//! Configuration loaded from an optional TOML file.
//!
//! ```toml
//! params = [2.0, 0.02, 0.2, 0.05, 1.2, 0.8, 1.0, 0.4, 3.5, 5.0]
//!
//! [geometry]
//! height = 4
//! width = 9
//! win_length = 4
//!
//! [search]
//! node_budget = 100000
//! seed = 7
//! noise = true
//! ```
//!
//! Missing sections fall back to their defaults and command line flags
//! override whatever the file sets.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ninarow_core::model::FITTED_PARAMETER_COUNT;
use ninarow_core::{DefaultModel, Geometry, Heuristic, Model, SearchOptions};
use serde::Deserialize;
use tracing::{debug, info};

mod defaults {
    pub const HEIGHT: usize = 4;
    pub const WIDTH: usize = 9;
    pub const WIN_LENGTH: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub height: usize,
    pub width: usize,
    pub win_length: usize,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            height: defaults::HEIGHT,
            width: defaults::WIDTH,
            win_length: defaults::WIN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub search: SearchOptions,
    /// Either the ten fitted parameters of the default model or a full
    /// heuristic parameter vector.
    #[serde(default)]
    pub params: Option<Vec<f64>>,
}

impl Config {
    /// Reads the file at `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            debug!("no config file given, using built-in defaults");
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Config::parse(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    pub fn geometry(&self) -> Result<Geometry> {
        let GeometryConfig {
            height,
            width,
            win_length,
        } = self.geometry;
        Geometry::new(height, width, win_length).context("invalid board geometry")
    }

    /// The parameter vector in use, [`DefaultModel::X0`] unless configured.
    pub fn params(&self) -> &[f64] {
        self.params.as_deref().unwrap_or(&DefaultModel::X0)
    }

    /// Builds the heuristic for `geometry` from the configured parameters.
    ///
    /// Ten values go through the default model's expansion; anything else is
    /// taken as a full heuristic parameter vector.
    pub fn heuristic(&self, geometry: &Geometry) -> Result<Arc<Heuristic>> {
        let params = self.params();
        let heuristic = if params.len() == FITTED_PARAMETER_COUNT {
            DefaultModel::new(*geometry).create_heuristic(params)
        } else {
            Heuristic::from_parameters(geometry, params).map(Arc::new)
        };
        heuristic.with_context(|| format!("invalid parameter vector of length {}", params.len()))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(height) = overrides.height {
            self.geometry.height = height;
        }
        if let Some(width) = overrides.width {
            self.geometry.width = width;
        }
        if let Some(win_length) = overrides.win_length {
            self.geometry.win_length = win_length;
        }
        if let Some(budget) = overrides.node_budget {
            self.search.node_budget = Some(budget);
        }
        if overrides.unlimited_nodes {
            self.search.node_budget = None;
        }
        if let Some(depth) = overrides.max_depth {
            self.search.max_depth = Some(depth);
        }
        if let Some(ms) = overrides.time_limit_ms {
            self.search.time_limit_ms = Some(ms);
        }
        if let Some(seed) = overrides.seed {
            self.search.seed = seed;
        }
        if overrides.noise {
            self.search.noise = true;
        }
    }
}

/// Command line flags that take precedence over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    #[arg(long, global = true)]
    pub height: Option<usize>,

    #[arg(long, global = true)]
    pub width: Option<usize>,

    #[arg(long, global = true)]
    pub win_length: Option<usize>,

    #[arg(long, global = true)]
    pub node_budget: Option<usize>,

    #[arg(long, global = true, conflicts_with = "node_budget")]
    pub unlimited_nodes: bool,

    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    #[arg(long, global = true)]
    pub time_limit_ms: Option<u64>,

    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Enable move noise, feature dropout and lapses.
    #[arg(long, global = true)]
    pub noise: bool,
}
