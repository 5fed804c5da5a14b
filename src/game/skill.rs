//! Skill / Cooldown State Machine
//!
//! Each skill is `Ready` (no cooldown left) or `Cooling`. Skills with a
//! non-zero duration additionally open an active window on activation.
//! The window closes on its own, independent of the cooldown timeline.
//!
//! Everything is driven by explicit [`SkillBook::tick`] calls: activation
//! queues a deactivation task tagged with a generation token, and each tick
//! sweeps the due tasks. A task only clears the window it was scheduled for,
//! so a reset or a newer activation is never undone by a stale task.

use serde::{Serialize, Deserialize};
use tracing::debug;

/// Duration in milliseconds.
pub type Millis = u64;

/// Number of skills.
pub const SKILL_COUNT: usize = 4;

/// The fixed set of skills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum Skill {
    /// Wind Fire Wheels: burn the weakest tiles off the board
    FireWheel = 0,
    /// Universe Ring: strike the weakest tile up one rank
    UniverseRing = 1,
    /// Red Armillary Sash: merge points doubled while active
    RedSash = 2,
    /// Three Heads Six Arms: no tiles spawn while active
    ThreeHeads = 3,
}

impl Skill {
    /// All skills in index order.
    pub const ALL: [Skill; SKILL_COUNT] = [
        Skill::FireWheel,
        Skill::UniverseRing,
        Skill::RedSash,
        Skill::ThreeHeads,
    ];

    /// Stable key used in snapshots.
    pub fn key(self) -> &'static str {
        match self {
            Skill::FireWheel => "fireWheel",
            Skill::UniverseRing => "universeRing",
            Skill::RedSash => "redSash",
            Skill::ThreeHeads => "threeHeads",
        }
    }

    /// Look a skill up by snapshot key.
    pub fn from_key(key: &str) -> Option<Skill> {
        Skill::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Index into per-skill arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Duration and cooldown for one skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTiming {
    /// Active window length (0 = instant skill)
    pub duration: Millis,
    /// Cooldown applied on activation
    pub cooldown: Millis,
}

/// Per-skill tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTable {
    timings: [SkillTiming; SKILL_COUNT],
}

impl Default for SkillTable {
    fn default() -> Self {
        Self {
            timings: [
                SkillTiming { duration: 0, cooldown: 8_000 },
                SkillTiming { duration: 0, cooldown: 15_000 },
                SkillTiming { duration: 5_000, cooldown: 20_000 },
                SkillTiming { duration: 8_000, cooldown: 30_000 },
            ],
        }
    }
}

impl SkillTable {
    /// Timing for a skill.
    #[inline]
    pub fn get(&self, skill: Skill) -> SkillTiming {
        self.timings[skill.index()]
    }

    /// Override the timing for a skill.
    pub fn set(&mut self, skill: Skill, timing: SkillTiming) {
        self.timings[skill.index()] = timing;
    }
}

/// Live state of one skill.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SkillState {
    /// Time until the skill can be used again (0 = ready)
    pub cooldown_remaining: Millis,
    /// Whether the active window is open
    pub is_active: bool,
    /// Times this skill was activated
    pub usage_count: u32,
    /// Generation of the currently open window
    active_generation: Option<u64>,
}

/// A queued end of an active window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingDeactivation {
    skill: Skill,
    generation: u64,
    expires_at: Millis,
}

/// Cooldowns, active windows and usage statistics for every skill.
#[derive(Clone, Debug, Default)]
pub struct SkillBook {
    states: [SkillState; SKILL_COUNT],
    /// Time accumulated through `tick`
    clock: Millis,
    /// Source of generation tokens; never rewinds, not even on reset
    next_generation: u64,
    pending: Vec<PendingDeactivation>,
    total_activations: u32,
}

impl SkillBook {
    /// Create a book with every skill ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to activate a skill.
    ///
    /// Returns `false` without touching any state while the skill is cooling
    /// down. Otherwise counts the use, starts the cooldown and, for a
    /// non-zero `duration`, opens the active window.
    pub fn activate(&mut self, skill: Skill, duration: Millis, cooldown: Millis) -> bool {
        if !self.is_available(skill) {
            return false;
        }

        let clock = self.clock;
        let generation = self.next_generation;
        let state = &mut self.states[skill.index()];
        state.usage_count = state.usage_count.saturating_add(1);
        state.cooldown_remaining = cooldown;
        self.total_activations = self.total_activations.saturating_add(1);

        if duration > 0 {
            self.next_generation += 1;
            state.is_active = true;
            state.active_generation = Some(generation);
            self.pending.push(PendingDeactivation {
                skill,
                generation,
                expires_at: clock.saturating_add(duration),
            });
        }

        debug!(skill = skill.key(), duration, cooldown, "skill activated");
        true
    }

    /// Advance time: decay every cooldown (floored at 0), then close any
    /// active window whose time is up. Returns the skills whose window closed.
    pub fn tick(&mut self, delta: Millis) -> Vec<Skill> {
        self.clock = self.clock.saturating_add(delta);

        for state in &mut self.states {
            state.cooldown_remaining = state.cooldown_remaining.saturating_sub(delta);
        }

        let clock = self.clock;
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|task| task.expires_at <= clock);
        self.pending = waiting;

        let mut expired = Vec::new();
        for task in due {
            let state = &mut self.states[task.skill.index()];
            if state.active_generation == Some(task.generation) {
                state.is_active = false;
                state.active_generation = None;
                debug!(skill = task.skill.key(), "skill window closed");
                expired.push(task.skill);
            }
        }
        expired
    }

    /// Whether the skill can be activated now.
    #[inline]
    pub fn is_available(&self, skill: Skill) -> bool {
        self.states[skill.index()].cooldown_remaining == 0
    }

    /// Remaining cooldown.
    #[inline]
    pub fn cooldown_remaining(&self, skill: Skill) -> Millis {
        self.states[skill.index()].cooldown_remaining
    }

    /// `cooldown_remaining / max_cooldown`, floored at 0.
    ///
    /// Not clamped above 1: a cooldown longer than `max_cooldown` (after
    /// retuning) yields a value over 1. A zero `max_cooldown` yields 0.
    pub fn cooldown_progress(&self, skill: Skill, max_cooldown: Millis) -> f64 {
        if max_cooldown == 0 {
            return 0.0;
        }
        (self.cooldown_remaining(skill) as f64 / max_cooldown as f64).max(0.0)
    }

    /// Whether the skill's active window is open.
    #[inline]
    pub fn is_active(&self, skill: Skill) -> bool {
        self.states[skill.index()].is_active
    }

    /// Times the skill was activated.
    #[inline]
    pub fn usage_count(&self, skill: Skill) -> u32 {
        self.states[skill.index()].usage_count
    }

    /// Activations across all skills.
    #[inline]
    pub fn total_activations(&self) -> u32 {
        self.total_activations
    }

    /// Time left in the skill's open window (0 when closed).
    pub fn active_remaining(&self, skill: Skill) -> Millis {
        let state = &self.states[skill.index()];
        let Some(generation) = state.active_generation else {
            return 0;
        };
        self.pending
            .iter()
            .find(|task| task.skill == skill && task.generation == generation)
            .map(|task| task.expires_at.saturating_sub(self.clock))
            .unwrap_or(0)
    }

    /// Read-only view of a skill's state.
    pub fn state(&self, skill: Skill) -> &SkillState {
        &self.states[skill.index()]
    }

    /// Clear all cooldowns, windows and usage counts, and drop every queued
    /// deactivation.
    pub fn reset(&mut self) {
        let next_generation = self.next_generation;
        *self = Self {
            next_generation,
            ..Self::default()
        };
    }

    /// Restore one skill from saved values.
    ///
    /// An active skill gets a fresh window of `active_remaining`; a window
    /// with nothing left closes on the next tick.
    pub fn restore(
        &mut self,
        skill: Skill,
        cooldown_remaining: Millis,
        is_active: bool,
        active_remaining: Millis,
        usage_count: u32,
    ) {
        self.pending.retain(|task| task.skill != skill);

        let state = &mut self.states[skill.index()];
        state.cooldown_remaining = cooldown_remaining;
        state.usage_count = usage_count;
        state.is_active = is_active;
        state.active_generation = None;

        if is_active {
            let generation = self.next_generation;
            self.next_generation += 1;
            state.active_generation = Some(generation);
            self.pending.push(PendingDeactivation {
                skill,
                generation,
                expires_at: self.clock.saturating_add(active_remaining),
            });
        }
    }

    /// Restore the global activation counter.
    pub fn set_total_activations(&mut self, total: u32) {
        self.total_activations = total;
    }
}

// =============================================================================
// TESTS
// =============================================================================
