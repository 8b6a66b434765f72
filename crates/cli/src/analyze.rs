//! Single position analysis.

use anyhow::{Context, Result};
use ninarow_core::{Board, NInARowBestFirstSearch, SearchResult};

use crate::config::Config;
use crate::display;

pub struct Analysis {
    pub board: Board,
    pub result: SearchResult,
    /// Indented dump of the search tree, when requested.
    pub tree: Option<String>,
}

/// Parses `cells` and searches the position with the configured heuristic.
pub fn analyze(config: &Config, cells: &str, tree_depth: Option<usize>) -> Result<Analysis> {
    let geometry = config.geometry()?;
    let board = Board::from_cells(&geometry, cells).context("failed to parse board")?;
    let heuristic = config.heuristic(&geometry)?;

    let mut search = NInARowBestFirstSearch::new(heuristic, board, config.search);
    let result = search
        .complete_search()
        .context("search failed, is the game already over?")?;
    let tree = tree_depth.and_then(|depth| search.tree().map(|t| t.format_nodes(depth)));
    Ok(Analysis {
        board,
        result,
        tree,
    })
}

pub fn run(config: &Config, cells: &str, tree_depth: Option<usize>) -> Result<()> {
    let analysis = analyze(config, cells, tree_depth)?;
    display::print_analysis(&analysis.board, &analysis.result);
    if let Some(tree) = analysis.tree {
        println!();
        print!("{tree}");
    }
    Ok(())
}
