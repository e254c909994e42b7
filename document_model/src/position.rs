//! Addresses into the document

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A caret address: top-level block index plus unit offset within that block.
///
/// Each character counts as one unit, and so does each inline object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }

    pub const fn zero() -> Self {
        Self {
            block: 0,
            offset: 0,
        }
    }
}

/// A text selection, always stored with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    start: Position,
    end: Position,
}

impl TextRange {
    /// Builds a range from two endpoints in either order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Block indices touched by this range
    pub fn blocks(&self) -> RangeInclusive<usize> {
        self.start.block..=self.end.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
        assert_eq!(Position::zero(), Position::new(0, 0));
    }

    #[test]
    fn test_range_normalizes_backwards_selection() {
        let range = TextRange::new(Position::new(3, 2), Position::new(1, 4));
        assert_eq!(range.start(), Position::new(1, 4));
        assert_eq!(range.end(), Position::new(3, 2));
        assert_eq!(range.blocks(), 1..=3);
        assert!(!range.is_collapsed());
    }

    #[test]
    fn test_collapsed_range() {
        let range = TextRange::collapsed(Position::new(0, 2));
        assert!(range.is_collapsed());
        assert_eq!(range.start(), range.end());
    }
}
