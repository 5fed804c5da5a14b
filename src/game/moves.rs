//! Move Resolution
//!
//! Slides every tile toward one edge and merges equal neighbours using the
//! grid's merge primitive.
//!
//! Cells are visited starting from the edge the tiles move toward, so when
//! three equal tiles line up the pair nearest that edge merges first:
//! `[2, 2, 2, _]` moved left becomes `[4, 2, _, _]`. A tile produced by a
//! merge is never merged again within the same move.

use serde::{Serialize, Deserialize};

use crate::game::grid::Grid;
use crate::game::tile::{Position, GRID_SIZE};

/// Move direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward row 0
    Up = 0,
    /// Toward column 3
    Right = 1,
    /// Toward row 3
    Down = 2,
    /// Toward column 0
    Left = 3,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Unit vector `(dx, dy)`.
    #[inline]
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Get direction from index (0-3).
    pub fn from_index(index: u8) -> Option<Direction> {
        match index {
            0 => Some(Direction::Up),
            1 => Some(Direction::Right),
            2 => Some(Direction::Down),
            3 => Some(Direction::Left),
            _ => None,
        }
    }
}

/// One merge produced during a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Where the merged tile landed
    pub position: Position,
    /// Value of the merged tile
    pub value: u32,
}

/// Result of resolving one move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether any tile moved or merged
    pub moved: bool,
    /// Merges in resolution order
    pub merges: Vec<MergeEvent>,
    /// Sum of merged values (base points before multipliers)
    pub points: u32,
}

impl MoveOutcome {
    /// Number of merges this move.
    #[inline]
    pub fn merge_count(&self) -> u32 {
        self.merges.len() as u32
    }

    /// Highest value produced by a merge this move.
    pub fn best_merge(&self) -> Option<u32> {
        self.merges.iter().map(|m| m.value).max()
    }
}

/// Resolve a move in place.
pub fn resolve_move(grid: &mut Grid, direction: Direction) -> MoveOutcome {
    let mut outcome = MoveOutcome::default();

    for tile in grid.tiles_mut() {
        tile.prepare_for_move();
    }

    let (dx, dy) = direction.vector();
    for x in traversal(dx) {
        for y in traversal(dy) {
            let pos = Position::new(x, y);
            if grid.tile_at(pos).is_none() {
                continue;
            }

            let (farthest, next) = find_farthest(grid, pos, dx, dy);

            if let Some(value) = grid.merge(pos, next) {
                outcome.merges.push(MergeEvent { position: next, value });
                outcome.points = outcome.points.saturating_add(value);
                outcome.moved = true;
                continue;
            }

            if farthest != pos {
                if let Some(tile) = grid.take(pos.x, pos.y) {
                    grid.set(farthest.x, farthest.y, tile);
                    outcome.moved = true;
                }
            }
        }
    }

    outcome
}

/// Whether any move could change the board.
pub fn moves_available(grid: &Grid) -> bool {
    !grid.empty_cells().is_empty() || grid.has_adjacent_match()
}

/// Visit order along one axis: start at the edge tiles move toward.
fn traversal(delta: i32) -> Vec<i32> {
    let mut order: Vec<i32> = (0..GRID_SIZE as i32).collect();
    if delta == 1 {
        order.reverse();
    }
    order
}

/// Last free cell in the direction of travel, and the cell just past it.
fn find_farthest(grid: &Grid, start: Position, dx: i32, dy: i32) -> (Position, Position) {
    let mut previous = start;
    let mut cell = start.offset(dx, dy);
    while grid.is_cell_available(cell) {
        previous = cell;
        cell = cell.offset(dx, dy);
    }
    (previous, cell)
}

// =============================================================================
// TESTS
// =============================================================================
