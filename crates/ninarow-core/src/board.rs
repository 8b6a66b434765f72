//! N-in-a-row board representation using bitboards.

use std::fmt;

use crate::bitboard::Bitboard;
use crate::error::{NInARowError, Result};
use crate::geometry::Geometry;
use crate::moves::Move;
use crate::pattern::Pattern;
use crate::player::Player;

/// Represents a board with one bitboard per player.
///
/// Player 1 always moves first, so the number of player 1 pieces equals the
/// number of player 2 pieces or exceeds it by one. The active player is
/// derived from those counts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    geometry: Geometry,
    pieces: [Bitboard; 2],
}

impl Board {
    /// Creates an empty board.
    pub fn new(geometry: &Geometry) -> Board {
        Board {
            geometry: *geometry,
            pieces: [Bitboard::EMPTY; 2],
        }
    }

    /// Creates a `Board` from the pieces of each player.
    ///
    /// # Arguments
    /// * `player1` - Cells held by player 1.
    /// * `player2` - Cells held by player 2.
    ///
    /// # Errors
    /// [`NInARowError::InvalidBoard`] if the patterns overlap, leave the grid,
    /// or do not describe a position reachable by alternating play.
    pub fn from_patterns(geometry: &Geometry, player1: Pattern, player2: Pattern) -> Result<Board> {
        let full = geometry.full_mask();
        if !full.contains_all(player1.bits()) || !full.contains_all(player2.bits()) {
            return Err(NInARowError::InvalidBoard(
                "pieces lie outside the board".to_string(),
            ));
        }
        if !player1.is_disjoint(player2) {
            return Err(NInARowError::InvalidBoard(format!(
                "cells {} are occupied by both players",
                player1.intersection(player2)
            )));
        }
        let diff = player1.len() as isize - player2.len() as isize;
        if !(0..=1).contains(&diff) {
            return Err(NInARowError::InvalidBoard(format!(
                "player 1 has {} pieces and player 2 has {}",
                player1.len(),
                player2.len()
            )));
        }
        Ok(Board {
            geometry: *geometry,
            pieces: [player1.bits(), player2.bits()],
        })
    }

    /// Creates a `Board` from a string representation.
    ///
    /// The string lists the cells row by row starting at position 0.
    /// Characters are interpreted as:
    /// - `o` for player 1
    /// - `x` for player 2
    /// - `.`, `_` or `-` for empty cells
    ///
    /// Whitespace and `|` separators are ignored.
    ///
    /// # Errors
    /// [`NInARowError::Parse`] for unknown characters or a wrong cell count,
    /// and [`NInARowError::InvalidBoard`] for unreachable positions.
    pub fn from_cells(geometry: &Geometry, text: &str) -> Result<Board> {
        let mut player1 = Bitboard::EMPTY;
        let mut player2 = Bitboard::EMPTY;
        let mut position = 0;
        for c in text.chars().filter(|c| !c.is_whitespace() && *c != '|') {
            if position >= geometry.size() {
                return Err(NInARowError::Parse(format!(
                    "more than {} cells in board string",
                    geometry.size()
                )));
            }
            match c {
                '.' | '_' | '-' => {}
                _ => match Player::from_char(c) {
                    Some(Player::Player1) => player1 = player1.set(position),
                    Some(Player::Player2) => player2 = player2.set(position),
                    None => {
                        return Err(NInARowError::Parse(format!(
                            "unexpected character '{c}' in board string"
                        )));
                    }
                },
            }
            position += 1;
        }
        if position != geometry.size() {
            return Err(NInARowError::Parse(format!(
                "board string has {position} cells, expected {}",
                geometry.size()
            )));
        }
        Board::from_patterns(geometry, Pattern::new(player1), Pattern::new(player2))
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Removes every piece from the board.
    pub fn reset(&mut self) {
        self.pieces = [Bitboard::EMPTY; 2];
    }

    /// Cells held by `player`.
    #[inline(always)]
    pub fn pieces(&self, player: Player) -> Bitboard {
        self.pieces[player.index()]
    }

    /// Empty cells.
    #[inline(always)]
    pub fn spaces(&self) -> Bitboard {
        self.geometry.full_mask() & !(self.pieces[0] | self.pieces[1])
    }

    /// Number of pieces placed by both players.
    #[inline]
    pub fn num_pieces(&self) -> usize {
        (self.pieces[0] | self.pieces[1]).count() as usize
    }

    /// Number of pieces `player` has placed.
    #[inline]
    pub fn count_pieces(&self, player: Player) -> usize {
        self.pieces(player).count() as usize
    }

    /// Number of empty cells.
    #[inline]
    pub fn count_spaces(&self) -> usize {
        self.spaces().count() as usize
    }

    /// Number of cells of `pattern` held by `player`.
    #[inline]
    pub fn count_pieces_in(&self, pattern: Pattern, player: Player) -> usize {
        pattern.count(self, player)
    }

    /// Number of empty cells of `pattern`.
    #[inline]
    pub fn count_spaces_in(&self, pattern: Pattern) -> usize {
        pattern.count_spaces(self)
    }

    /// Cells of `pattern` that `player` does not hold yet.
    #[inline]
    pub fn missing_pieces(&self, pattern: Pattern, player: Player) -> Pattern {
        Pattern::new(pattern.bits() & !self.pieces(player))
    }

    /// The player whose turn it is.
    #[inline]
    pub fn active_player(&self) -> Player {
        if self.pieces[0].count() == self.pieces[1].count() {
            Player::Player1
        } else {
            Player::Player2
        }
    }

    /// Checks if a position is occupied by either player.
    ///
    /// # Errors
    /// [`NInARowError::OutOfBounds`] if the position is not on the board.
    pub fn contains(&self, position: usize) -> Result<bool> {
        self.geometry.check_position(position)?;
        Ok((self.pieces[0] | self.pieces[1]).contains(position))
    }

    /// Checks if a position is occupied by `player`.
    pub fn contains_move(&self, position: usize, player: Player) -> Result<bool> {
        self.geometry.check_position(position)?;
        Ok(self.pieces(player).contains(position))
    }

    /// Checks if a single position is empty.
    pub fn contains_space(&self, position: usize) -> Result<bool> {
        self.geometry.check_position(position)?;
        Ok(self.spaces().contains(position))
    }

    /// Checks if every position of `pattern` is empty.
    #[inline]
    pub fn contains_spaces(&self, pattern: Pattern) -> bool {
        self.spaces().contains_all(pattern.bits())
    }

    /// Places a piece for `player` at `position`.
    ///
    /// # Errors
    /// [`NInARowError::InvalidMove`] if the position is off the board, already
    /// occupied, or it is not `player`'s turn.
    pub fn apply_move(&mut self, position: usize, player: Player) -> Result<()> {
        if position >= self.geometry.size() {
            return Err(NInARowError::invalid_move(
                position,
                format!("outside a board of {} cells", self.geometry.size()),
            ));
        }
        if !self.spaces().contains(position) {
            return Err(NInARowError::invalid_move(position, "cell is occupied"));
        }
        if player != self.active_player() {
            return Err(NInARowError::invalid_move(
                position,
                format!("it is not {player}'s turn"),
            ));
        }
        self.pieces[player.index()] = self.pieces[player.index()].set(position);
        Ok(())
    }

    /// Returns a copy of the board with `mv` applied.
    pub fn with_move(&self, mv: &Move) -> Result<Board> {
        let mut next = *self;
        next.apply_move(mv.position, mv.player)?;
        Ok(next)
    }

    /// Takes back the last piece placed by `player`.
    ///
    /// # Errors
    /// [`NInARowError::InvalidMove`] if `player` did not make the last move or
    /// does not hold `position`.
    pub fn remove_move(&mut self, position: usize, player: Player) -> Result<()> {
        if player != self.active_player().other() || self.num_pieces() == 0 {
            return Err(NInARowError::invalid_move(
                position,
                format!("{player} did not make the last move"),
            ));
        }
        if !self.pieces(player).contains(position) {
            return Err(NInARowError::invalid_move(
                position,
                format!("cell is not held by {player}"),
            ));
        }
        self.pieces[player.index()] = self.pieces[player.index()].remove(position);
        Ok(())
    }

    /// Returns `true` if `player` holds a full line.
    #[inline]
    pub fn player_has_won(&self, player: Player) -> bool {
        self.geometry.contains_win(self.pieces(player))
    }

    /// The winning player, if any.
    pub fn winner(&self) -> Option<Player> {
        Player::ALL.into_iter().find(|&p| self.player_has_won(p))
    }

    /// Returns `true` if the board is full and nobody has won.
    pub fn game_is_drawn(&self) -> bool {
        self.spaces().is_empty() && self.winner().is_none()
    }

    /// Returns `true` once either player has won or the board is full.
    pub fn game_has_ended(&self) -> bool {
        self.spaces().is_empty() || self.winner().is_some()
    }

    /// Cells the active player may play; empty once the game has ended.
    pub fn legal_moves(&self) -> Bitboard {
        if self.game_has_ended() {
            Bitboard::EMPTY
        } else {
            self.spaces()
        }
    }

    /// Renders the board with the cells of `highlight` drawn as `#`.
    pub fn to_string_with_highlight(&self, highlight: Pattern) -> String {
        let width = self.geometry.width();
        let border = format!("+{}+\n", "-".repeat(width));
        let mut out = border.clone();
        for row in 0..self.geometry.height() {
            out.push('|');
            for col in 0..width {
                let position = row * width + col;
                let c = if highlight.contains(position) {
                    '#'
                } else if self.pieces[0].contains(position) {
                    Player::Player1.to_char()
                } else if self.pieces[1].contains(position) {
                    Player::Player2.to_char()
                } else {
                    ' '
                };
                out.push(c);
            }
            out.push_str("|\n");
        }
        out.push_str(&border);
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(Pattern::EMPTY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry::new(4, 9, 4).unwrap()
    }

    #[test]
    fn test_new_board() {
        let board = Board::new(&geometry());
        assert_eq!(board.num_pieces(), 0);
        assert_eq!(board.count_spaces(), 36);
        assert_eq!(board.active_player(), Player::Player1);
        assert!(!board.game_has_ended());
    }

    #[test]
    fn test_apply_move() {
        let mut board = Board::new(&geometry());
        board.apply_move(10, Player::Player1).unwrap();
        assert!(board.contains_move(10, Player::Player1).unwrap());
        assert!(!board.contains_move(10, Player::Player2).unwrap());
        assert!(board.contains(10).unwrap());
        assert!(!board.contains_space(10).unwrap());
        assert_eq!(board.active_player(), Player::Player2);
        assert_eq!(board.count_pieces(Player::Player1), 1);
        assert_eq!(board.count_spaces(), 35);
    }

    #[test]
    fn test_apply_move_errors() {
        let mut board = Board::new(&geometry());
        board.apply_move(0, Player::Player1).unwrap();

        let occupied = board.apply_move(0, Player::Player2);
        assert!(matches!(occupied, Err(NInARowError::InvalidMove { position: 0, .. })));

        let out_of_range = board.apply_move(36, Player::Player2);
        assert!(matches!(out_of_range, Err(NInARowError::InvalidMove { .. })));

        let wrong_turn = board.apply_move(1, Player::Player1);
        assert!(matches!(wrong_turn, Err(NInARowError::InvalidMove { .. })));

        // Failed moves leave the board untouched.
        assert_eq!(board.num_pieces(), 1);
    }

    #[test]
    fn test_queries_out_of_bounds() {
        let board = Board::new(&geometry());
        assert!(matches!(
            board.contains(36),
            Err(NInARowError::OutOfBounds { position: 36, size: 36 })
        ));
        assert!(board.contains_move(100, Player::Player1).is_err());
        assert!(board.contains_space(40).is_err());
    }

    #[test]
    fn test_remove_move() {
        let mut board = Board::new(&geometry());
        board.apply_move(4, Player::Player1).unwrap();
        board.apply_move(5, Player::Player2).unwrap();

        assert!(board.remove_move(4, Player::Player1).is_err());
        assert!(board.remove_move(6, Player::Player2).is_err());
        board.remove_move(5, Player::Player2).unwrap();
        assert_eq!(board.active_player(), Player::Player2);
        board.remove_move(4, Player::Player1).unwrap();
        assert_eq!(board, Board::new(&geometry()));
        assert!(board.remove_move(4, Player::Player2).is_err());
    }

    #[test]
    fn test_with_move_leaves_original() {
        let board = Board::new(&geometry());
        let next = board.with_move(&Move::new(3, 0.0, Player::Player1)).unwrap();
        assert_eq!(board.num_pieces(), 0);
        assert!(next.contains_move(3, Player::Player1).unwrap());
    }

    #[test]
    fn test_from_cells() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let board = Board::from_cells(&g, "o.x|...|..o").unwrap();
        assert!(board.contains_move(0, Player::Player1).unwrap());
        assert!(board.contains_move(2, Player::Player2).unwrap());
        assert!(board.contains_move(8, Player::Player1).unwrap());
        assert_eq!(board.active_player(), Player::Player2);

        assert!(matches!(Board::from_cells(&g, "o.x"), Err(NInARowError::Parse(_))));
        assert!(matches!(Board::from_cells(&g, "o.z......"), Err(NInARowError::Parse(_))));
        assert!(matches!(
            Board::from_cells(&g, "xx......."),
            Err(NInARowError::InvalidBoard(_))
        ));
    }

    #[test]
    fn test_from_patterns_validation() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let overlap = Board::from_patterns(
            &g,
            Pattern::from_positions([0, 1]),
            Pattern::from_positions([1]),
        );
        assert!(matches!(overlap, Err(NInARowError::InvalidBoard(_))));

        let outside = Board::from_patterns(&g, Pattern::from_positions([9]), Pattern::EMPTY);
        assert!(matches!(outside, Err(NInARowError::InvalidBoard(_))));

        let board = Board::from_patterns(
            &g,
            Pattern::from_positions([0, 4]),
            Pattern::from_positions([8]),
        )
        .unwrap();
        assert_eq!(board.num_pieces(), 3);
    }

    #[test]
    fn test_win_and_draw_detection() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let won = Board::from_cells(&g, "ooo xx. ...").unwrap();
        assert!(won.player_has_won(Player::Player1));
        assert_eq!(won.winner(), Some(Player::Player1));
        assert!(won.game_has_ended());
        assert!(!won.game_is_drawn());
        assert!(won.legal_moves().is_empty());

        let drawn = Board::from_cells(&g, "oxo xxo oox").unwrap();
        assert_eq!(drawn.winner(), None);
        assert!(drawn.game_is_drawn());
        assert!(drawn.game_has_ended());
    }

    #[test]
    fn test_missing_pieces() {
        let g = Geometry::new(3, 3, 3).unwrap();
        let board = Board::from_cells(&g, "o.o x.. x..").unwrap();
        let top_row = Pattern::from_positions([0, 1, 2]);
        assert_eq!(
            board.missing_pieces(top_row, Player::Player1),
            Pattern::from_positions([1])
        );
        assert!(board.contains_spaces(Pattern::from_positions([1, 4, 5])));
        assert!(!board.contains_spaces(top_row));
        assert_eq!(board.count_pieces_in(top_row, Player::Player1), 2);
        assert_eq!(board.count_spaces_in(top_row), 1);
    }

    #[test]
    fn test_reset() {
        let mut board = Board::from_cells(&Geometry::new(3, 3, 3).unwrap(), "o........").unwrap();
        board.reset();
        assert_eq!(board.num_pieces(), 0);
    }

    #[test]
    fn test_display() {
        let g = Geometry::new(2, 3, 2).unwrap();
        let board = Board::from_cells(&g, "o.. .x.").unwrap();
        assert_eq!(board.to_string(), "+---+\n|o  |\n| x |\n+---+\n");
        let highlighted = board.to_string_with_highlight(Pattern::from_positions([2]));
        assert_eq!(highlighted, "+---+\n|o #|\n| x |\n+---+\n");
    }
}
