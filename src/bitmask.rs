//! 128-bit used-point bitmask for the correspondence backtracker (C4).
//!
//! Query sizes stay well under 64 points in practice, but the format leaves
//! room to grow; rather than bound the query to `u64`'s 64 bits, this is
//! modeled as two `u64` words, enough for up to 128 simultaneously-tracked
//! molecule points.

/// A 128-bit bitmask, stored as two `u64` words (bits `0..64` in `lo`, bits
/// `64..128` in `hi`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitmask128 {
    lo: u64,
    hi: u64,
}

impl Bitmask128 {
    /// The empty mask.
    #[must_use]
    pub const fn new() -> Self {
        Self { lo: 0, hi: 0 }
    }

    /// Returns a copy with bit `i` set. Panics if `i >= 128`.
    #[must_use]
    pub fn set(self, i: usize) -> Self {
        assert!(i < 128, "bit index {i} out of range");
        if i < 64 {
            Self { lo: self.lo | (1u64 << i), hi: self.hi }
        } else {
            Self { lo: self.lo, hi: self.hi | (1u64 << (i - 64)) }
        }
    }

    /// Returns a copy with bit `i` cleared. Panics if `i >= 128`.
    #[must_use]
    pub fn clear(self, i: usize) -> Self {
        assert!(i < 128, "bit index {i} out of range");
        if i < 64 {
            Self { lo: self.lo & !(1u64 << i), hi: self.hi }
        } else {
            Self { lo: self.lo, hi: self.hi & !(1u64 << (i - 64)) }
        }
    }

    /// Tests whether bit `i` is set. Panics if `i >= 128`.
    #[must_use]
    pub fn test(self, i: usize) -> bool {
        assert!(i < 128, "bit index {i} out of range");
        if i < 64 {
            self.lo & (1u64 << i) != 0
        } else {
            self.hi & (1u64 << (i - 64)) != 0
        }
    }

    /// Bitwise union of two masks.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self { lo: self.lo | other.lo, hi: self.hi | other.hi }
    }

    /// Whether no bits are set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    /// Count of set bits.
    #[must_use]
    pub fn count(self) -> u32 {
        self.lo.count_ones() + self.hi.count_ones()
    }
}
