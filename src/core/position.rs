//! Board Coordinates
//!
//! Integer (x, y) positions on the 7x6 board.
//! Positions arrive from untrusted requests, so they are signed and may lie
//! off the board; `is_in_bounds` is the single place that decides.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Number of board columns (x in 0..=6).
pub const BOARD_WIDTH: i32 = 7;

/// Number of board rows (y in 0..=5).
pub const BOARD_HEIGHT: i32 = 6;

/// A board coordinate.
///
/// Implements Ord (x first, then y) for deterministic BTreeMap ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column, 0 = leftmost
    pub x: i32,
    /// Row, 0 = first player's back row
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check if this position lies on the board.
    #[inline]
    pub fn is_in_bounds(self) -> bool {
        (0..BOARD_WIDTH).contains(&self.x) && (0..BOARD_HEIGHT).contains(&self.y)
    }

    /// Manhattan distance to another position.
    #[inline]
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Check if `other` is exactly one orthogonal step away.
    #[inline]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Orthogonal neighbours that lie on the board.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        [(0, -1), (-1, 0), (1, 0), (0, 1)]
            .into_iter()
            .map(move |(dx, dy)| Position::new(self.x + dx, self.y + dy))
            .filter(|p| p.is_in_bounds())
    }

    /// Row-major index into board storage. Only meaningful when in bounds.
    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.y * BOARD_WIDTH + self.x) as usize
    }

    /// Inverse of `index`.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        let index = index as i32;
        Self::new(index % BOARD_WIDTH, index / BOARD_WIDTH)
    }

    /// Every on-board position in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..(BOARD_WIDTH * BOARD_HEIGHT) as usize).map(Position::from_index)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(Position::new(0, 0).is_in_bounds());
        assert!(Position::new(6, 5).is_in_bounds());
        assert!(!Position::new(7, 0).is_in_bounds());
        assert!(!Position::new(0, 6).is_in_bounds());
        assert!(!Position::new(-1, 0).is_in_bounds());
        assert!(!Position::new(0, -1).is_in_bounds());
        assert!(!Position::new(12, 1).is_in_bounds());
    }

    #[test]
    fn test_adjacency() {
        let origin = Position::new(3, 3);
        assert!(origin.is_adjacent(Position::new(3, 4)));
        assert!(origin.is_adjacent(Position::new(2, 3)));
        assert!(!origin.is_adjacent(origin));
        assert!(!origin.is_adjacent(Position::new(4, 4)));
        assert!(!origin.is_adjacent(Position::new(3, 5)));
    }

    #[test]
    fn test_neighbors_clipped_at_corner() {
        let corner: Vec<_> = Position::new(0, 0).neighbors().collect();
        assert_eq!(corner, vec![Position::new(1, 0), Position::new(0, 1)]);
        assert_eq!(Position::new(3, 3).neighbors().count(), 4);
    }

    #[test]
    fn test_index_roundtrip() {
        for (i, pos) in Position::all().enumerate() {
            assert_eq!(pos.index(), i);
            assert_eq!(Position::from_index(i), pos);
        }
        assert_eq!(Position::all().count(), 42);
    }
}
