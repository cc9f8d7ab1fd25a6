//! Traversal direction for index scans.

/// Direction in which a cursor walks an index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending key order (smallest first)
    #[default]
    Next,
    /// Descending key order (largest first)
    Prev,
}

impl Direction {
    /// Returns the direction that walks the other way.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Next => Direction::Prev,
            Direction::Prev => Direction::Next,
        }
    }

    /// Applies this direction to an ascending comparison result.
    #[inline]
    pub fn apply(self, ord: core::cmp::Ordering) -> core::cmp::Ordering {
        match self {
            Direction::Next => ord,
            Direction::Prev => ord.reverse(),
        }
    }
}
