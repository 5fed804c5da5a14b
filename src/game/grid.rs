//! Grid / Tile Engine
//!
//! Owns the 4x4 board. Every cell holds at most one tile and every tile's
//! stored position equals the slot that holds it. Bad coordinates are never
//! an error: reads return `None` and writes are ignored.

use crate::game::tile::{Position, Tile, GRID_SIZE};

/// Fixed 4x4 board, indexed `cells[x][y]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    cells: [[Option<Tile>; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tile at `(x, y)`, or `None` when empty or out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        let pos = Position::new(x, y);
        if !pos.in_bounds() {
            return None;
        }
        self.cells[x as usize][y as usize].as_ref()
    }

    /// Tile at a position.
    #[inline]
    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        self.get(pos.x, pos.y)
    }

    /// Mutable tile at `(x, y)`.
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        let pos = Position::new(x, y);
        if !pos.in_bounds() {
            return None;
        }
        self.cells[x as usize][y as usize].as_mut()
    }

    /// Write a tile into `(x, y)` and stamp its position.
    ///
    /// Ignored when out of bounds. Occupancy is not checked: an existing
    /// tile in the cell is replaced.
    pub fn set(&mut self, x: i32, y: i32, mut tile: Tile) {
        let pos = Position::new(x, y);
        if !pos.in_bounds() {
            return;
        }
        tile.position = pos;
        self.cells[x as usize][y as usize] = Some(tile);
    }

    /// Remove and return the tile at `(x, y)`.
    pub fn take(&mut self, x: i32, y: i32) -> Option<Tile> {
        let pos = Position::new(x, y);
        if !pos.in_bounds() {
            return None;
        }
        self.cells[x as usize][y as usize].take()
    }

    /// Whether `pos` is on the board and unoccupied.
    #[inline]
    pub fn is_cell_available(&self, pos: Position) -> bool {
        pos.in_bounds() && self.tile_at(pos).is_none()
    }

    /// All unoccupied cells, row-major.
    pub fn empty_cells(&self) -> Vec<Position> {
        row_major()
            .filter(|pos| self.tile_at(*pos).is_none())
            .collect()
    }

    /// All tiles, row-major.
    pub fn occupied_tiles(&self) -> Vec<&Tile> {
        row_major()
            .filter_map(|pos| self.tile_at(pos))
            .collect()
    }

    /// Mutable access to every tile (no particular order).
    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells
            .iter_mut()
            .flat_map(|column| column.iter_mut())
            .filter_map(|cell| cell.as_mut())
    }

    /// Number of occupied cells.
    pub fn tile_count(&self) -> usize {
        self.occupied_tiles().len()
    }

    /// Highest tile value on the board (0 when empty).
    pub fn max_value(&self) -> u32 {
        self.occupied_tiles()
            .iter()
            .map(|t| t.value)
            .max()
            .unwrap_or(0)
    }

    /// Remove every tile.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Merge primitive: fold the tile at `from` into the tile at `into`.
    ///
    /// Succeeds only when both cells hold tiles of equal value and neither
    /// tile was produced by a merge during the current pass. On success the
    /// source is removed, the target is replaced by a tile of double value
    /// flagged `is_merged` and owning both sources, and the new value is
    /// returned. On rejection the grid is untouched.
    pub fn merge(&mut self, from: Position, into: Position) -> Option<u32> {
        if from == into {
            return None;
        }
        let mergeable = match (self.tile_at(from), self.tile_at(into)) {
            (Some(a), Some(b)) => a.can_merge_with(b),
            _ => false,
        };
        if !mergeable {
            return None;
        }

        let source = self.take(from.x, from.y)?;
        let target = self.take(into.x, into.y)?;
        let merged = Tile::merged(source, target);
        let value = merged.value;
        self.set(into.x, into.y, merged);
        Some(value)
    }

    /// Whether any two orthogonally adjacent tiles could merge.
    pub fn has_adjacent_match(&self) -> bool {
        row_major().any(|pos| {
            let Some(tile) = self.tile_at(pos) else {
                return false;
            };
            [pos.offset(1, 0), pos.offset(0, 1)]
                .into_iter()
                .filter_map(|n| self.tile_at(n))
                .any(|n| n.value == tile.value && tile.can_double())
        })
    }
}

/// Every board position, row-major (y outer, x inner).
pub fn row_major() -> impl Iterator<Item = Position> {
    (0..GRID_SIZE as i32).flat_map(|y| (0..GRID_SIZE as i32).map(move |x| Position::new(x, y)))
}

// =============================================================================
// TESTS
// =============================================================================
