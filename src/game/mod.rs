//! Game Logic Module
//!
//! Everything that decides what happens on the board. Deterministic for a
//! given seed and input sequence; time only advances through explicit ticks.
//!
//! ## Module Structure
//!
//! - `tile`: Tile value type and grid coordinates
//! - `grid`: 4x4 cell storage
//! - `moves`: Slide and merge resolution
//! - `skill`: Cooldown and active-window state machine
//! - `ability`: What each skill does to the board
//! - `session`: Score, counters and the move/skill entry points
//! - `events`: Game events for the UI and logs
//! - `theme`: Labels and colors

pub mod tile;
pub mod grid;
pub mod moves;
pub mod skill;
pub mod ability;
pub mod session;
pub mod events;
pub mod theme;

// Re-export key types
pub use tile::{Position, Tile, GRID_SIZE};
pub use grid::Grid;
pub use moves::{Direction, MoveOutcome};
pub use skill::{Millis, Skill, SkillBook, SkillTable};
pub use session::{GameSession, MoveReport};
pub use events::{GameEvent, GameEventData};
pub use theme::{theme_by_name, ClassicTheme, NezhaTheme, Theme};
