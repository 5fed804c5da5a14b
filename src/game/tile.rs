//! Tile Definitions
//!
//! A tile is one numbered piece occupying a single grid cell.

use serde::{Serialize, Deserialize};

/// Board edge length (cells per row/column).
pub const GRID_SIZE: usize = 4;

/// Grid coordinate. `x` is the column, `y` is the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column (0 = left)
    pub x: i32,
    /// Row (0 = top)
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this position lies on the board.
    #[inline]
    pub fn in_bounds(self) -> bool {
        (0..GRID_SIZE as i32).contains(&self.x) && (0..GRID_SIZE as i32).contains(&self.y)
    }

    /// Offset by a unit vector.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Largest legal tile value. Tiles at this value no longer merge or double.
pub const MAX_TILE_VALUE: u32 = 1 << 30;

/// Check that a value is a legal tile value (power of two, 2 to 2^30).
#[inline]
pub fn is_tile_value(value: u32) -> bool {
    (2..=MAX_TILE_VALUE).contains(&value) && value.is_power_of_two()
}

/// A single occupied cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    /// Current position (always equal to the grid slot holding this tile)
    pub position: Position,

    /// Face value, a power of two >= 2
    pub value: u32,

    /// Position held before the current move
    pub previous_position: Option<Position>,

    /// Spawned this turn
    pub is_new: bool,

    /// Produced by a merge this turn; cannot merge again until the next move
    pub is_merged: bool,

    /// The two tiles consumed to produce this one (cleared every turn)
    pub merged_from: Vec<Tile>,
}

impl Tile {
    /// Create a freshly spawned tile.
    pub fn new(position: Position, value: u32) -> Self {
        debug_assert!(is_tile_value(value), "invalid tile value {}", value);
        Self {
            position,
            value,
            previous_position: None,
            is_new: true,
            is_merged: false,
            merged_from: Vec::new(),
        }
    }

    /// Build the product of merging `a` into `b`.
    ///
    /// The result sits at `b`'s position with double value and owns both sources.
    /// Callers check [`Tile::can_merge_with`] first, which keeps the doubled
    /// value within [`MAX_TILE_VALUE`].
    pub fn merged(a: Tile, b: Tile) -> Self {
        let position = b.position;
        let value = b.value.saturating_mul(2);
        Self {
            position,
            value,
            previous_position: None,
            is_new: false,
            is_merged: true,
            merged_from: vec![a, b],
        }
    }

    /// Two tiles may merge iff their values match, neither was already
    /// produced by a merge during this pass, and the result stays legal.
    #[inline]
    pub fn can_merge_with(&self, other: &Tile) -> bool {
        self.value == other.value
            && self.can_double()
            && !self.is_merged
            && !other.is_merged
    }

    /// Whether doubling this tile keeps it a legal value.
    #[inline]
    pub fn can_double(&self) -> bool {
        self.value < MAX_TILE_VALUE
    }

    /// Clear per-turn flags and remember the current position.
    pub fn prepare_for_move(&mut self) {
        self.merged_from.clear();
        self.is_merged = false;
        self.is_new = false;
        self.previous_position = Some(self.position);
    }

    /// Exponent of the value (2 -> 1, 2048 -> 11).
    #[inline]
    pub fn rank(&self) -> u32 {
        self.value.trailing_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(0, 0).in_bounds());
        assert!(Position::new(3, 3).in_bounds());
        assert!(!Position::new(-1, 0).in_bounds());
        assert!(!Position::new(0, 4).in_bounds());
        assert!(!Position::new(4, 4).in_bounds());
    }

    #[test]
    fn test_tile_values() {
        assert!(is_tile_value(2));
        assert!(is_tile_value(2048));
        assert!(!is_tile_value(0));
        assert!(!is_tile_value(1));
        assert!(!is_tile_value(6));
        assert!(is_tile_value(MAX_TILE_VALUE));
        assert!(!is_tile_value(1 << 31));
    }

    #[test]
    fn test_largest_tiles_do_not_merge() {
        let a = Tile::new(Position::new(0, 0), MAX_TILE_VALUE);
        let b = Tile::new(Position::new(1, 0), MAX_TILE_VALUE);
        assert!(!a.can_double());
        assert!(!a.can_merge_with(&b));

        let c = Tile::new(Position::new(0, 0), MAX_TILE_VALUE / 2);
        let d = Tile::new(Position::new(1, 0), MAX_TILE_VALUE / 2);
        assert!(c.can_merge_with(&d));
        assert!(is_tile_value(Tile::merged(c, d).value));
    }

    #[test]
    fn test_merged_tile() {
        let a = Tile::new(Position::new(1, 0), 4);
        let b = Tile::new(Position::new(0, 0), 4);
        let m = Tile::merged(a, b);

        assert_eq!(m.value, 8);
        assert_eq!(m.position, Position::new(0, 0));
        assert!(m.is_merged);
        assert_eq!(m.merged_from.len(), 2);
        assert_eq!(m.rank(), 3);
    }

    #[test]
    fn test_merged_tile_cannot_merge_again() {
        let m = Tile::merged(
            Tile::new(Position::new(1, 0), 2),
            Tile::new(Position::new(0, 0), 2),
        );
        let other = Tile::new(Position::new(1, 0), 4);

        assert!(!m.can_merge_with(&other));
        assert!(!other.can_merge_with(&m));
    }

    #[test]
    fn test_prepare_for_move() {
        let mut m = Tile::merged(
            Tile::new(Position::new(1, 2), 2),
            Tile::new(Position::new(0, 2), 2),
        );
        m.prepare_for_move();

        assert!(!m.is_merged);
        assert!(!m.is_new);
        assert!(m.merged_from.is_empty());
        assert_eq!(m.previous_position, Some(Position::new(0, 2)));
    }
}
