//! Engine-versus-engine games played in parallel.

use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use ninarow_core::{Board, Geometry, Heuristic, NInARowBestFirstSearch, Player, SearchOptions};
use rayon::prelude::*;
use tracing::{debug, info};

/// Seeds of consecutive games lie this far apart so no two searches share one.
const SEED_STRIDE: u64 = 1 << 16;

/// Outcome of one self-play game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub moves: Vec<usize>,
    pub winner: Option<Player>,
    pub nodes: usize,
    pub proven_wins: usize,
}

/// Totals over a self-play match.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchSummary {
    pub player1_wins: usize,
    pub player2_wins: usize,
    pub draws: usize,
    pub total_moves: usize,
    pub total_nodes: usize,
    pub proven_wins: usize,
}

impl MatchSummary {
    pub fn games(&self) -> usize {
        self.player1_wins + self.player2_wins + self.draws
    }

    pub fn mean_game_length(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            n => self.total_moves as f64 / n as f64,
        }
    }

    pub fn mean_nodes_per_move(&self) -> f64 {
        match self.total_moves {
            0 => 0.0,
            n => self.total_nodes as f64 / n as f64,
        }
    }

    fn add(mut self, game: &GameRecord) -> Self {
        match game.winner {
            Some(Player::Player1) => self.player1_wins += 1,
            Some(Player::Player2) => self.player2_wins += 1,
            None => self.draws += 1,
        }
        self.total_moves += game.moves.len();
        self.total_nodes += game.nodes;
        self.proven_wins += game.proven_wins;
        self
    }
}

/// Plays one game from the empty board, both sides using `heuristic`.
///
/// Every move gets its own search seeded from `options.seed`, the game index
/// and the ply.
pub fn play_game(
    heuristic: &Arc<Heuristic>,
    geometry: &Geometry,
    options: SearchOptions,
    game_index: u64,
) -> Result<GameRecord> {
    let mut board = Board::new(geometry);
    let mut record = GameRecord {
        moves: Vec::with_capacity(geometry.size()),
        winner: None,
        nodes: 0,
        proven_wins: 0,
    };
    let base_seed = options
        .seed
        .wrapping_add(game_index.wrapping_mul(SEED_STRIDE));

    while !board.game_has_ended() {
        let ply = record.moves.len() as u64;
        let mut search = NInARowBestFirstSearch::new(Arc::clone(heuristic), board, options)
            .with_seed(base_seed.wrapping_add(ply));
        let result = search
            .complete_search()
            .with_context(|| format!("search failed in game {game_index} at ply {ply}"))?;
        let mv = result.best_move;
        board
            .apply_move(mv.position, mv.player)
            .with_context(|| format!("engine played an illegal move in game {game_index}"))?;
        record.moves.push(mv.position);
        record.nodes += result.stats.node_count;
        if result.is_proven_win() {
            record.proven_wins += 1;
        }
    }
    record.winner = board.winner();
    debug!(
        game = game_index,
        moves = record.moves.len(),
        winner = ?record.winner,
        "game finished"
    );
    Ok(record)
}

/// Plays `games` games in parallel and sums up their outcomes.
pub fn run(
    heuristic: Arc<Heuristic>,
    geometry: &Geometry,
    options: SearchOptions,
    games: u64,
    progress: &ProgressBar,
) -> Result<MatchSummary> {
    info!(games, noise = options.noise, seed = options.seed, "starting self-play");
    let records = (0..games)
        .into_par_iter()
        .map(|index| {
            let record = play_game(&heuristic, geometry, options, index);
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(records.iter().fold(MatchSummary::default(), MatchSummary::add))
}
