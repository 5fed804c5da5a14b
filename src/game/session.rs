//! Game Session
//!
//! Aggregates the grid, the skill book and the score counters, and drives
//! them from moves, ticks and skill requests.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::ability;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::grid::{row_major, Grid};
use crate::game::moves::{moves_available, resolve_move, Direction};
use crate::game::skill::{Millis, Skill, SkillBook};
use crate::game::tile::{Position, Tile};

/// Tiles placed at the start of a game.
pub const START_TILES: usize = 2;

/// Score needed per Nezha level.
pub const POINTS_PER_LEVEL: u32 = 1000;

/// Lowest tile value; `max_tile_value` never drops below it.
pub const MIN_TILE_VALUE: u32 = 2;

/// Result of a move request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveReport {
    /// Whether the board changed (and the move was counted)
    pub moved: bool,
    /// Merges made by this move
    pub merges: u32,
    /// Points awarded, after multipliers
    pub points: u32,
    /// Tile spawned after the move, if any
    pub spawned: Option<(Position, u32)>,
}

/// Complete state of one game.
#[derive(Clone, Debug)]
pub struct GameSession {
    pub(crate) config: GameConfig,
    pub(crate) grid: Grid,
    pub(crate) skills: SkillBook,
    pub(crate) rng: DeterministicRng,

    pub(crate) score: u32,
    pub(crate) high_score: u32,
    pub(crate) moves: u32,
    pub(crate) is_game_over: bool,
    pub(crate) is_paused: bool,
    pub(crate) is_won: bool,
    pub(crate) merge_count: u32,
    pub(crate) consecutive_merges: u32,
    pub(crate) max_tile_value: u32,
    pub(crate) nezha_level: u32,
    pub(crate) started_at: DateTime<Utc>,

    /// Events not yet drained by the UI
    pub(crate) pending_events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a session with an empty board. Call [`GameSession::new_game`]
    /// to place the starting tiles.
    pub fn new(config: GameConfig) -> Self {
        let rng = DeterministicRng::new(config.seed);
        Self {
            config,
            grid: Grid::new(),
            skills: SkillBook::new(),
            rng,
            score: 0,
            high_score: 0,
            moves: 0,
            is_game_over: false,
            is_paused: false,
            is_won: false,
            merge_count: 0,
            consecutive_merges: 0,
            max_tile_value: MIN_TILE_VALUE,
            nezha_level: 1,
            started_at: Utc::now(),
            pending_events: Vec::new(),
        }
    }

    /// Reset and place the starting tiles.
    pub fn new_game(&mut self) {
        self.reset();
        for _ in 0..START_TILES {
            self.spawn_tile();
        }
        info!(seed = self.config.seed, high_score = self.high_score, "new game");
    }

    /// Clear the board, score, counters and every skill; keep the high score.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.skills.reset();
        self.score = 0;
        self.moves = 0;
        self.is_game_over = false;
        self.is_paused = false;
        self.is_won = false;
        self.merge_count = 0;
        self.consecutive_merges = 0;
        self.max_tile_value = MIN_TILE_VALUE;
        self.nezha_level = 1;
        self.started_at = Utc::now();
        self.pending_events.clear();
        self.push_event(GameEventData::Reset);
        debug!("session reset");
    }

    /// Resolve a move.
    ///
    /// Ignored while paused or after game over. A move that changes nothing
    /// is not counted and spawns nothing.
    pub fn apply_move(&mut self, direction: Direction) -> MoveReport {
        if self.is_paused || self.is_game_over {
            return MoveReport::default();
        }

        let outcome = resolve_move(&mut self.grid, direction);
        if !outcome.moved {
            return MoveReport::default();
        }

        self.moves = self.moves.saturating_add(1);
        let points = outcome.points.saturating_mul(ability::score_multiplier(&self.skills));

        for merge in &outcome.merges {
            self.pending_events
                .push(GameEvent::tiles_merged(self.moves, merge.position, merge.value));
        }
        self.add_score(points);
        self.record_move_merges(outcome.merge_count());
        if let Some(best) = outcome.best_merge() {
            self.note_tile_value(best);
        }

        let spawned = if ability::spawn_suppressed(&self.skills) {
            None
        } else {
            self.spawn_tile()
        };

        self.push_event(GameEventData::Moved {
            direction,
            merges: outcome.merge_count(),
            points,
        });
        self.check_game_over();

        MoveReport {
            moved: true,
            merges: outcome.merge_count(),
            points,
            spawned,
        }
    }

    /// Add points; the high score and level follow immediately.
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.high_score = self.high_score.max(self.score);

        let level = self.score / POINTS_PER_LEVEL + 1;
        if level > self.nezha_level {
            self.nezha_level = level;
            info!(level, score = self.score, "level up");
            self.push_event(GameEventData::LevelUp { level });
        }
    }

    /// Update merge counters for one move: no merges breaks the streak.
    pub fn record_move_merges(&mut self, merges: u32) {
        self.merge_count = self.merge_count.saturating_add(merges);
        if merges == 0 {
            self.consecutive_merges = 0;
        } else {
            self.consecutive_merges = self.consecutive_merges.saturating_add(merges);
        }
    }

    /// Advance skill timers. Ignored while paused.
    pub fn tick(&mut self, delta: Millis) {
        if self.is_paused {
            return;
        }
        for skill in self.skills.tick(delta) {
            debug!(skill = skill.key(), "skill expired");
            self.pending_events.push(GameEvent::skill_expired(self.moves, skill));
        }
    }

    /// Use a skill with its configured timing.
    ///
    /// Returns `false` with no state change when paused, after game over,
    /// while the skill is cooling down, or when it has nothing to act on.
    pub fn activate_skill(&mut self, skill: Skill) -> bool {
        if self.is_paused || self.is_game_over {
            return false;
        }
        if !self.skills.is_available(skill) || !ability::can_apply(skill, &self.grid) {
            return false;
        }

        let timing = self.config.skills.get(skill);
        if !self.skills.activate(skill, timing.duration, timing.cooldown) {
            return false;
        }

        if let Some(ability::SkillEffect::Struck { value, .. }) =
            ability::apply_effect(skill, &mut self.grid)
        {
            self.note_tile_value(value);
        }

        info!(skill = skill.key(), uses = self.skills.usage_count(skill), "skill activated");
        self.pending_events.push(GameEvent::skill_activated(self.moves, skill));
        self.check_game_over();
        true
    }

    /// Pause the session.
    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    /// Resume the session.
    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    /// Flip the pause state; returns the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.is_paused = !self.is_paused;
        self.is_paused
    }

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Current score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Best score across resets.
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Moves made this game.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// No moves remain.
    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// Moves and ticks are ignored.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// The winning tile was reached this game.
    pub fn is_won(&self) -> bool {
        self.is_won
    }

    /// Merges made this game.
    pub fn merge_count(&self) -> u32 {
        self.merge_count
    }

    /// Merges across the current streak of merging moves.
    pub fn consecutive_merges(&self) -> u32 {
        self.consecutive_merges
    }

    /// Highest tile value seen this game.
    pub fn max_tile_value(&self) -> u32 {
        self.max_tile_value
    }

    /// `score / 1000 + 1`, never decreasing within a game.
    pub fn nezha_level(&self) -> u32 {
        self.nezha_level
    }

    /// When this game started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable board, for move controllers driving the engine directly.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Skill state.
    pub fn skills(&self) -> &SkillBook {
        &self.skills
    }

    /// Session configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed the spawn RNG started from.
    pub fn rng_seed(&self) -> u64 {
        self.config.seed
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.moves, self.config.seed, |hasher| {
            for pos in row_major() {
                match self.grid.tile_at(pos) {
                    Some(tile) => hasher.update_u32(tile.value),
                    None => hasher.update_u32(0),
                }
            }

            hasher.update_u32(self.score);
            hasher.update_u32(self.high_score);
            hasher.update_bool(self.is_game_over);
            hasher.update_bool(self.is_won);
            hasher.update_u32(self.merge_count);
            hasher.update_u32(self.consecutive_merges);
            hasher.update_u32(self.max_tile_value);
            hasher.update_u32(self.nezha_level);

            for skill in Skill::ALL {
                hasher.update_u64(self.skills.cooldown_remaining(skill));
                hasher.update_bool(self.skills.is_active(skill));
                hasher.update_u32(self.skills.usage_count(skill));
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Place a 2 (or sometimes a 4) in a random empty cell.
    fn spawn_tile(&mut self) -> Option<(Position, u32)> {
        let empty = self.grid.empty_cells();
        let position = *self.rng.choose(&empty)?;
        let value = if self.rng.chance(self.config.four_chance) { 4 } else { 2 };

        self.grid.set(position.x, position.y, Tile::new(position, value));
        self.note_tile_value(value);
        self.pending_events.push(GameEvent::tile_spawned(self.moves, position, value));
        Some((position, value))
    }

    /// Track the high-water tile and the sticky win flag.
    fn note_tile_value(&mut self, value: u32) {
        self.max_tile_value = self.max_tile_value.max(value);
        if value >= self.config.win_value && !self.is_won {
            self.is_won = true;
            info!(value, score = self.score, moves = self.moves, "game won");
            self.push_event(GameEventData::Won { value });
        }
    }

    fn check_game_over(&mut self) {
        if !self.is_game_over && !moves_available(&self.grid) {
            self.is_game_over = true;
            info!(score = self.score, moves = self.moves, "game over");
            self.push_event(GameEventData::GameOver { score: self.score });
        }
    }

    fn push_event(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::new(self.moves, data));
    }
}

// =============================================================================
// TESTS
// =============================================================================
