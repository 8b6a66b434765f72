//! Bitboard operations and types.
//!
//! This module provides a [`Bitboard`] type that represents a set of board cells
//! using a single `u64`, where bit `i` corresponds to the cell at position `i`
//! (positions are numbered row-major, `row * width + col`).

use serde::{Deserialize, Serialize};

/// Maximum number of cells a bitboard can represent.
pub const MAX_CELLS: usize = 64;

/// Newtype wrapper for a 64-bit cell set (bit 0 = top-left cell).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Bitboard(u64);

impl Bitboard {
    /// The empty set.
    pub const EMPTY: Bitboard = Bitboard(0);

    /// Creates a new bitboard from raw bits.
    ///
    /// # Arguments
    ///
    /// * `bits` - Raw 64-bit value where each bit represents a cell.
    ///
    /// # Returns
    ///
    /// A new `Bitboard` wrapping the given bits.
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Bitboard(bits)
    }

    /// Returns the raw 64-bit value.
    #[inline(always)]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Creates a bitboard with a single bit set at the given position.
    ///
    /// Positions at or beyond [`MAX_CELLS`] produce an empty bitboard.
    #[inline(always)]
    pub const fn from_position(position: usize) -> Self {
        if position >= MAX_CELLS {
            Bitboard(0)
        } else {
            Bitboard(1u64 << position)
        }
    }

    /// Returns a bitboard with the lowest `n` bits set.
    #[inline(always)]
    pub const fn low_bits(n: usize) -> Self {
        if n >= MAX_CELLS {
            Bitboard(u64::MAX)
        } else {
            Bitboard((1u64 << n) - 1)
        }
    }

    /// Returns a new bitboard with the bit at the given position set.
    ///
    /// # Arguments
    ///
    /// * `position` - The position to set.
    ///
    /// # Returns
    ///
    /// A new `Bitboard` with the specified position's bit set.
    #[inline(always)]
    pub const fn set(self, position: usize) -> Self {
        Bitboard(self.0 | Bitboard::from_position(position).0)
    }

    /// Returns a new bitboard with the bit at the given position removed.
    #[inline(always)]
    pub const fn remove(self, position: usize) -> Self {
        Bitboard(self.0 & !Bitboard::from_position(position).0)
    }

    /// Checks if the bitboard contains the bit at the given position.
    ///
    /// # Arguments
    ///
    /// * `position` - The position to check.
    ///
    /// # Returns
    ///
    /// `true` if the specified position's bit is set, `false` otherwise.
    #[inline(always)]
    pub const fn contains(self, position: usize) -> bool {
        self.0 & Bitboard::from_position(position).0 != 0
    }

    /// Checks if every bit of `other` is also set in `self`.
    #[inline(always)]
    pub const fn contains_all(self, other: Bitboard) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks if the bitboard has no bits set.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of set bits (population count).
    ///
    /// # Returns
    ///
    /// The number of bits set in the bitboard (0-64).
    #[inline(always)]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns a new bitboard with the least significant bit cleared.
    #[inline(always)]
    pub const fn clear_lsb(self) -> Self {
        Bitboard(self.0 & self.0.wrapping_sub(1))
    }

    /// Returns the position of the least significant set bit.
    ///
    /// # Returns
    ///
    /// `Some(position)` for the LSB, or `None` if the bitboard is empty.
    #[inline(always)]
    pub const fn lsb(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Shifts towards lower positions, producing an empty set once the shift
    /// reaches the width of the bitboard.
    #[inline(always)]
    pub const fn shift_down(self, amount: usize) -> Self {
        if amount >= MAX_CELLS {
            Bitboard(0)
        } else {
            Bitboard(self.0 >> amount)
        }
    }

    /// Shifts towards higher positions, dropping bits that leave the bitboard.
    #[inline(always)]
    pub const fn shift_up(self, amount: usize) -> Self {
        if amount >= MAX_CELLS {
            Bitboard(0)
        } else {
            Bitboard(self.0 << amount)
        }
    }

    /// Returns an iterator over the set positions in increasing order.
    #[inline(always)]
    pub fn iter(self) -> BitboardIterator {
        BitboardIterator::new(self)
    }
}

// Operator trait implementations

impl std::ops::BitAnd for Bitboard {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}

impl std::ops::BitOr for Bitboard {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}

impl std::ops::BitXor for Bitboard {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl std::ops::Not for Bitboard {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

impl std::ops::BitAndAssign for Bitboard {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl std::ops::BitOrAssign for Bitboard {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// Conversion trait implementations

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(bits: u64) -> Self {
        Bitboard(bits)
    }
}

impl From<Bitboard> for u64 {
    #[inline(always)]
    fn from(bb: Bitboard) -> Self {
        bb.0
    }
}

// Iterator support

impl IntoIterator for Bitboard {
    type Item = usize;
    type IntoIter = BitboardIterator;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        BitboardIterator::new(self)
    }
}

impl FromIterator<usize> for Bitboard {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(Bitboard::EMPTY, Bitboard::set)
    }
}

/// Iterator over the set positions of a [`Bitboard`], lowest first.
pub struct BitboardIterator {
    bitboard: Bitboard,
}

impl BitboardIterator {
    /// Creates a new `BitboardIterator`.
    ///
    /// # Arguments
    ///
    /// * `bitboard` - The bitboard to iterate over.
    #[inline(always)]
    pub fn new(bitboard: Bitboard) -> BitboardIterator {
        BitboardIterator { bitboard }
    }
}

impl Iterator for BitboardIterator {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let position = self.bitboard.lsb()?;
        self.bitboard = self.bitboard.clear_lsb();
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bitboard.count() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitboardIterator {}
