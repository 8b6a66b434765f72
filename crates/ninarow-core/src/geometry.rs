//! Board dimensions and line geometry.
//!
//! A [`Geometry`] fixes the grid size and the number of pieces in a row needed
//! to win. It precomputes, for each of the four line directions, the set of
//! cells where a full line may start, which turns win detection into a handful
//! of shifts and masks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bitboard::{Bitboard, MAX_CELLS};
use crate::error::{NInARowError, Result};
use crate::pattern::Pattern;

/// The four directions a line can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Horizontal = 0,
    Vertical = 1,
    /// Down and to the right.
    Diagonal = 2,
    /// Down and to the left.
    AntiDiagonal = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Row and column step of one cell along this direction.
    #[inline]
    pub const fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::Diagonal => (1, 1),
            Direction::AntiDiagonal => (1, -1),
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Dimensions of an N-in-a-row board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    height: usize,
    width: usize,
    win_length: usize,
    line_starts: [Bitboard; 4],
}

impl Geometry {
    /// Creates a geometry after validating it fits the bitboard representation.
    ///
    /// # Arguments
    ///
    /// * `height` - Number of rows.
    /// * `width` - Number of columns.
    /// * `win_length` - Number of pieces in a row needed to win.
    ///
    /// # Errors
    ///
    /// [`NInARowError::InvalidGeometry`] when the board has more than 64 cells,
    /// when no line of `win_length` fits in either dimension, or when the board
    /// has fewer than `2 * win_length - 1` cells.
    pub fn new(height: usize, width: usize, win_length: usize) -> Result<Geometry> {
        if height == 0 || width == 0 {
            return Err(NInARowError::InvalidGeometry(format!(
                "board must have at least one row and column, got {height}x{width}"
            )));
        }
        let Some(size) = height.checked_mul(width) else {
            return Err(NInARowError::InvalidGeometry(format!(
                "{height}x{width} board has more than {MAX_CELLS} cells"
            )));
        };
        if size > MAX_CELLS {
            return Err(NInARowError::InvalidGeometry(format!(
                "{height}x{width} board has {size} cells, at most {MAX_CELLS} are supported"
            )));
        }
        if win_length == 0 || win_length > height.max(width) {
            return Err(NInARowError::InvalidGeometry(format!(
                "win length {win_length} does not fit a {height}x{width} board"
            )));
        }
        if size < 2 * win_length - 1 {
            return Err(NInARowError::InvalidGeometry(format!(
                "{height}x{width} board is too small for {win_length} in a row"
            )));
        }

        let mut geometry = Geometry {
            height,
            width,
            win_length,
            line_starts: [Bitboard::EMPTY; 4],
        };
        for direction in Direction::ALL {
            geometry.line_starts[direction.index()] = (0..size)
                .filter(|&start| geometry.line_fits(start, direction))
                .collect();
        }
        Ok(geometry)
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn win_length(&self) -> usize {
        self.win_length
    }

    /// Number of cells on the board.
    #[inline]
    pub const fn size(&self) -> usize {
        self.height * self.width
    }

    /// Bitboard with every cell of the board set.
    #[inline]
    pub const fn full_mask(&self) -> Bitboard {
        Bitboard::low_bits(self.size())
    }

    /// Returns an error unless `position` lies on the board.
    #[inline]
    pub fn check_position(&self, position: usize) -> Result<()> {
        if position < self.size() {
            Ok(())
        } else {
            Err(NInARowError::OutOfBounds {
                position,
                size: self.size(),
            })
        }
    }

    /// Converts a row and column into a position.
    pub fn position(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(NInARowError::OutOfBounds {
                position: row * self.width + col,
                size: self.size(),
            });
        }
        Ok(row * self.width + col)
    }

    #[inline]
    pub const fn row(&self, position: usize) -> usize {
        position / self.width
    }

    #[inline]
    pub const fn col(&self, position: usize) -> usize {
        position % self.width
    }

    /// Offset between consecutive cells of a line in `direction`.
    #[inline]
    pub const fn shift(&self, direction: Direction) -> usize {
        match direction {
            Direction::Horizontal => 1,
            Direction::Vertical => self.width,
            Direction::Diagonal => self.width + 1,
            Direction::AntiDiagonal => self.width - 1,
        }
    }

    /// Cells from which a line of `win_length` fits in `direction`.
    #[inline]
    pub const fn line_starts(&self, direction: Direction) -> Bitboard {
        self.line_starts[direction as usize]
    }

    /// Checks whether a window of `length` cells starting at `start` stays on
    /// the board in `direction`.
    pub fn window_fits(&self, start: usize, direction: Direction, length: usize) -> bool {
        if start >= self.size() || length == 0 {
            return false;
        }
        let (dr, dc) = direction.step();
        let span = length as isize - 1;
        let end_row = self.row(start) as isize + dr * span;
        let end_col = self.col(start) as isize + dc * span;
        end_row < self.height as isize && end_col >= 0 && end_col < self.width as isize
    }

    fn line_fits(&self, start: usize, direction: Direction) -> bool {
        self.window_fits(start, direction, self.win_length)
    }

    /// Positions of a window of `length` cells, or `None` if it leaves the board.
    pub fn window(&self, start: usize, direction: Direction, length: usize) -> Option<Bitboard> {
        if !self.window_fits(start, direction, length) {
            return None;
        }
        let shift = self.shift(direction);
        Some((0..length).map(|i| start + i * shift).collect())
    }

    /// Returns `true` if `pieces` holds `win_length` in a row in any direction.
    pub fn contains_win(&self, pieces: Bitboard) -> bool {
        Direction::ALL.iter().any(|&direction| {
            let shift = self.shift(direction);
            let mut runs = pieces & self.line_starts(direction);
            for i in 1..self.win_length {
                if runs.is_empty() {
                    break;
                }
                runs &= pieces.shift_down(i * shift);
            }
            !runs.is_empty()
        })
    }

    /// Enumerates every winning line on the board.
    ///
    /// Lines are ordered by direction (horizontal, vertical, diagonal,
    /// anti-diagonal) and then by start position.
    pub fn lines(&self) -> Arc<[Pattern]> {
        Direction::ALL
            .iter()
            .flat_map(|&direction| {
                self.line_starts(direction).iter().filter_map(move |start| {
                    self.window(start, direction, self.win_length).map(Pattern::new)
                })
            })
            .collect()
    }
}
