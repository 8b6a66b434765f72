mod analyze;
mod config;
mod display;
mod selfplay;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use ninarow_core::DefaultModel;
use ninarow_core::model::{FITTED_PARAMETER_COUNT, bads_parameters_to_model_parameters};

use crate::config::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(version, about = "Best-first search engine for N-in-a-row games")]
struct Cli {
    #[command(subcommand)]
    command: SubCommands,

    /// TOML file with [geometry], [search] and params entries.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Search one position and report the chosen move.
    Analyze {
        /// Board cells row by row: `o` and `x` for pieces, `.` for empty
        /// cells. Whitespace is ignored.
        board: String,

        /// Print the search tree down to this depth.
        #[arg(long)]
        tree_depth: Option<usize>,
    },
    /// Let the engine play against itself.
    Selfplay {
        #[arg(short = 'n', long, default_value_t = 100)]
        games: u64,

        /// Play with noise off, so every game is identical.
        #[arg(long, default_value = "false")]
        deterministic: bool,
    },
    /// Show the default model's parameters and bounds.
    Params {
        /// Also print the configured parameters expanded to the full vector.
        #[arg(long, default_value = "false")]
        expand: bool,
    },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_params(config: &Config, expand: bool) -> Result<()> {
    println!(
        "{:<20} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "name".bold(),
        "x0".bold(),
        "lower".bold(),
        "upper".bold(),
        "p.lower".bold(),
        "p.upper".bold()
    );
    for (i, name) in DefaultModel::PARAMETER_NAMES.iter().enumerate() {
        println!(
            "{name:<20} {:>9} {:>9} {:>9} {:>9} {:>9}",
            DefaultModel::X0[i],
            DefaultModel::LOWER_BOUNDS[i],
            DefaultModel::UPPER_BOUNDS[i],
            DefaultModel::PLAUSIBLE_LOWER_BOUNDS[i],
            DefaultModel::PLAUSIBLE_UPPER_BOUNDS[i]
        );
    }
    if expand {
        let params = config.params();
        let full = if params.len() == FITTED_PARAMETER_COUNT {
            bads_parameters_to_model_parameters(params)?
        } else {
            params.to_vec()
        };
        println!();
        println!("{} ({} values)", "Expanded parameters".bold(), full.len());
        let line = full
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("[{line}]");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(&cli.overrides);

    match cli.command {
        SubCommands::Analyze { board, tree_depth } => analyze::run(&config, &board, tree_depth),
        SubCommands::Selfplay {
            games,
            deterministic,
        } => {
            let geometry = config.geometry()?;
            let heuristic = config.heuristic(&geometry)?;
            let mut options = config.search;
            options.noise = !deterministic;

            let progress = display::create_progress_bar(games);
            let summary = selfplay::run(heuristic, &geometry, options, games, &progress);
            progress.finish_and_clear();
            display::print_match_summary(&summary?);
            Ok(())
        }
        SubCommands::Params { expand } => print_params(&config, expand),
    }
}
