//! Skill Effects
//!
//! What each skill does to the board. Gating (cooldowns, active windows)
//! lives in [`crate::game::skill`]; this module only touches the grid.

use crate::game::grid::{row_major, Grid};
use crate::game::skill::{Skill, SkillBook};
use crate::game::tile::{Position, MAX_TILE_VALUE};

/// Tiles burned by one Fire Wheel.
pub const FIRE_WHEEL_BURN: usize = 2;

/// Merge point multiplier while the Red Sash is active.
pub const RED_SASH_MULTIPLIER: u32 = 2;

/// Board change made by an instant skill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkillEffect {
    /// Tiles removed from the board
    Burned(Vec<Position>),
    /// Tile whose value was doubled, with its new value
    Struck { position: Position, value: u32 },
    /// Timed skill: nothing happens to the board right away
    WindowOpened,
}

/// Check whether the skill has something to act on.
///
/// Fire Wheel needs more tiles than it burns so the board is never wiped;
/// Universe Ring needs a tile that can still double. Timed skills always apply.
pub fn can_apply(skill: Skill, grid: &Grid) -> bool {
    match skill {
        Skill::FireWheel => grid.tile_count() > FIRE_WHEEL_BURN,
        Skill::UniverseRing => weakest_value(grid).is_some_and(|v| v < MAX_TILE_VALUE),
        Skill::RedSash | Skill::ThreeHeads => true,
    }
}

/// Apply the skill's immediate effect to the grid.
///
/// Returns `None` (grid untouched) when [`can_apply`] is false.
pub fn apply_effect(skill: Skill, grid: &mut Grid) -> Option<SkillEffect> {
    if !can_apply(skill, grid) {
        return None;
    }
    let effect = match skill {
        Skill::FireWheel => SkillEffect::Burned(burn_weakest(grid, FIRE_WHEEL_BURN)),
        Skill::UniverseRing => {
            let (position, value) = strike_weakest(grid)?;
            SkillEffect::Struck { position, value }
        }
        Skill::RedSash | Skill::ThreeHeads => SkillEffect::WindowOpened,
    };
    Some(effect)
}

/// Remove up to `count` tiles holding the lowest value, row-major.
pub fn burn_weakest(grid: &mut Grid, count: usize) -> Vec<Position> {
    let Some(lowest) = weakest_value(grid) else {
        return Vec::new();
    };
    let targets: Vec<Position> = row_major()
        .filter(|pos| grid.tile_at(*pos).is_some_and(|t| t.value == lowest))
        .take(count)
        .collect();

    for pos in &targets {
        grid.take(pos.x, pos.y);
    }
    targets
}

/// Double the first lowest-valued tile, row-major.
pub fn strike_weakest(grid: &mut Grid) -> Option<(Position, u32)> {
    let lowest = weakest_value(grid).filter(|v| *v < MAX_TILE_VALUE)?;
    let pos = row_major().find(|pos| grid.tile_at(*pos).is_some_and(|t| t.value == lowest))?;
    let tile = grid.get_mut(pos.x, pos.y)?;
    tile.value = tile.value.saturating_mul(2);
    Some((pos, tile.value))
}

/// Merge point multiplier given the open windows.
#[inline]
pub fn score_multiplier(skills: &SkillBook) -> u32 {
    if skills.is_active(Skill::RedSash) {
        RED_SASH_MULTIPLIER
    } else {
        1
    }
}

/// Whether tile spawns are suppressed.
#[inline]
pub fn spawn_suppressed(skills: &SkillBook) -> bool {
    skills.is_active(Skill::ThreeHeads)
}

fn weakest_value(grid: &Grid) -> Option<u32> {
    grid.occupied_tiles().iter().map(|t| t.value).min()
}
