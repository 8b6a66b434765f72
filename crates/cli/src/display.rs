//! Terminal output: boards, search reports and match summaries.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use ninarow_core::{Board, Player, SearchResult};

use crate::selfplay::MatchSummary;

const BAR_WIDTH: usize = 40;

fn piece(player: Player) -> ColoredString {
    let c = player.to_char().to_string();
    match player {
        Player::Player1 => c.bright_red().bold(),
        Player::Player2 => c.bright_blue().bold(),
    }
}

/// Renders `board` with row and column labels, marking `highlight` with `*`.
pub fn render_board(board: &Board, highlight: Option<usize>) -> String {
    let geometry = board.geometry();
    let width = geometry.width();
    let mut out = String::from("   ");
    for col in 0..width {
        out.push_str(&format!("{:>2}", col % 10));
    }
    out.push('\n');
    for row in 0..geometry.height() {
        out.push_str(&format!("{row:>2} "));
        for col in 0..width {
            let position = row * width + col;
            let cell = if board.pieces(Player::Player1).contains(position) {
                piece(Player::Player1)
            } else if board.pieces(Player::Player2).contains(position) {
                piece(Player::Player2)
            } else if highlight == Some(position) {
                "*".green().bold()
            } else {
                ".".dimmed()
            };
            out.push_str(&format!(" {cell}"));
        }
        out.push('\n');
    }
    out
}

pub fn print_analysis(board: &Board, result: &SearchResult) {
    let width = board.geometry().width();
    let mv = result.best_move;
    println!("{}", render_board(board, Some(mv.position)));
    println!(
        "{} {} (row {}, col {}) for {}",
        "Best move:".bold(),
        mv.position.to_string().green().bold(),
        mv.row(width),
        mv.col(width),
        piece(mv.player)
    );
    println!("{} {:.4}", "Score:    ".bold(), result.score);
    match result.proven_value {
        Some(value) if result.is_proven_win() => {
            println!("{} {} ({value})", "Outcome:  ".bold(), "proven win".green().bold())
        }
        Some(value) if value == 0.0 => {
            println!("{} {}", "Outcome:  ".bold(), "proven draw".yellow())
        }
        Some(value) => println!("{} {} ({value})", "Outcome:  ".bold(), "proven loss".red()),
        None => {}
    }

    let stats = &result.stats;
    println!("{} {}", "Stopped:  ".bold(), result.stop_reason);
    println!(
        "Nodes {} (leaves {}, internal {}), iterations {}, pv depth {}",
        stats.node_count,
        stats.num_leaves,
        stats.num_internal_nodes,
        stats.iterations,
        stats.depth_of_pv
    );
    println!(
        "Mean depth {:.2}, branching factor {:.2}, elapsed {:.3}s",
        stats.mean_depth,
        stats.average_branching_factor,
        stats.elapsed.as_secs_f64()
    );
}

pub fn create_progress_bar(total_games: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(total_games);
    let template = format!("{{spinner:.cyan}} [{{bar:{BAR_WIDTH}.cyan}}] {{pos}}/{{len}} ({{percent}}%) {{msg}}");
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        progress_bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    progress_bar
}

fn bar(label: &str, count: usize, total: usize, color: Color) {
    let ratio = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    println!(
        "{label:<10} {}{} {count:>5} ({:>5.1}%)",
        "█".repeat(filled).color(color),
        " ".repeat(BAR_WIDTH - filled),
        ratio * 100.0
    );
}

pub fn print_match_summary(summary: &MatchSummary) {
    let total = summary.games();
    println!("{}", "Self-play results".bold().underline());
    bar(
        &format!("{} wins", Player::Player1.to_char()),
        summary.player1_wins,
        total,
        Color::BrightRed,
    );
    bar(
        &format!("{} wins", Player::Player2.to_char()),
        summary.player2_wins,
        total,
        Color::BrightBlue,
    );
    bar("draws", summary.draws, total, Color::Yellow);
    println!(
        "Average game length {:.1} moves, {:.0} nodes per move, {} proven wins",
        summary.mean_game_length(),
        summary.mean_nodes_per_move(),
        summary.proven_wins
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ninarow_core::Geometry;

    #[test]
    fn test_render_board_marks_highlight() {
        colored::control::set_override(false);
        let g = Geometry::new(3, 3, 3).unwrap();
        let board = Board::from_cells(&g, "o.. .x. ...").unwrap();
        let rendered = render_board(&board, Some(8));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "    0 1 2");
        assert_eq!(lines[1], " 0  o . .");
        assert_eq!(lines[2], " 1  . x .");
        assert_eq!(lines[3], " 2  . . *");
    }
}
