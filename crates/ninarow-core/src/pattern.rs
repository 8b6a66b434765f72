//! Sets of board positions.
//!
//! A [`Pattern`] is an arbitrary set of cells. Winning lines, feature piece
//! sets and feature space sets are all patterns; the board answers occupancy
//! questions about them with a single mask and population count.

use std::fmt;

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::geometry::{Direction, Geometry};
use crate::player::Player;

/// An immutable set of board positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Pattern(Bitboard);

impl Pattern {
    /// The pattern with no positions.
    pub const EMPTY: Pattern = Pattern(Bitboard::EMPTY);

    #[inline(always)]
    pub const fn new(positions: Bitboard) -> Pattern {
        Pattern(positions)
    }

    /// Builds a pattern from a list of positions.
    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Pattern {
        Pattern(positions.into_iter().collect())
    }

    /// The line of `geometry.win_length()` cells starting at `start`, if it fits.
    pub fn line(geometry: &Geometry, start: usize, direction: Direction) -> Option<Pattern> {
        geometry
            .window(start, direction, geometry.win_length())
            .map(Pattern)
    }

    #[inline(always)]
    pub const fn bits(self) -> Bitboard {
        self.0
    }

    /// Number of positions in the pattern.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.0.count() as usize
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether `position` is one of the pattern's cells.
    #[inline(always)]
    pub const fn contains(self, position: usize) -> bool {
        self.0.contains(position)
    }

    /// Checks whether every cell of `other` is also in this pattern.
    #[inline(always)]
    pub const fn contains_pattern(self, other: Pattern) -> bool {
        self.0.contains_all(other.0)
    }

    /// Returns `true` if every cell is occupied by `player`.
    #[inline]
    pub fn contains_win(self, board: &Board, player: Player) -> bool {
        !self.is_empty() && board.pieces(player).contains_all(self.0)
    }

    /// Number of cells occupied by `player`.
    #[inline]
    pub fn count(self, board: &Board, player: Player) -> usize {
        (self.0 & board.pieces(player)).count() as usize
    }

    /// Number of cells shared with `other`.
    #[inline(always)]
    pub const fn count_overlap(self, other: Pattern) -> usize {
        (self.0.bits() & other.0.bits()).count_ones() as usize
    }

    /// Number of cells currently empty on `board`.
    #[inline]
    pub fn count_spaces(self, board: &Board) -> usize {
        (self.0 & board.spaces()).count() as usize
    }

    #[inline(always)]
    pub fn union(self, other: Pattern) -> Pattern {
        Pattern(self.0 | other.0)
    }

    #[inline(always)]
    pub fn intersection(self, other: Pattern) -> Pattern {
        Pattern(self.0 & other.0)
    }

    /// Cells of this pattern that are not in `other`.
    #[inline(always)]
    pub fn difference(self, other: Pattern) -> Pattern {
        Pattern(self.0 & !other.0)
    }

    #[inline(always)]
    pub fn is_disjoint(self, other: Pattern) -> bool {
        (self.0 & other.0).is_empty()
    }

    /// Iterates over the member positions in increasing order.
    pub fn positions(self) -> impl Iterator<Item = usize> {
        self.0.iter()
    }

    /// Topmost row touched by the pattern.
    pub fn min_row(self, geometry: &Geometry) -> Option<usize> {
        self.positions().map(|p| geometry.row(p)).min()
    }

    pub fn max_row(self, geometry: &Geometry) -> Option<usize> {
        self.positions().map(|p| geometry.row(p)).max()
    }

    pub fn min_col(self, geometry: &Geometry) -> Option<usize> {
        self.positions().map(|p| geometry.col(p)).min()
    }

    pub fn max_col(self, geometry: &Geometry) -> Option<usize> {
        self.positions().map(|p| geometry.col(p)).max()
    }

    /// Renders the pattern as a binary string, one character per cell,
    /// position 0 first.
    pub fn to_binary_string(self, geometry: &Geometry) -> String {
        (0..geometry.size())
            .map(|p| if self.contains(p) { '1' } else { '0' })
            .collect()
    }
}

impl From<Bitboard> for Pattern {
    fn from(bits: Bitboard) -> Self {
        Pattern(bits)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, p) in self.positions().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "}}")
    }
}
