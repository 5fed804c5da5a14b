//! Session Configuration
//!
//! Defaults suit the standard game; `from_env` lets a deployment override
//! the seed, save location and tuning without recompiling.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::game::skill::SkillTable;

/// Value of the winning tile.
pub const WIN_VALUE: u32 = 2048;

/// Percent chance that a spawned tile is a 4 instead of a 2.
pub const FOUR_CHANCE_PERCENT: u32 = 10;

/// Default snapshot file.
pub const DEFAULT_SAVE_PATH: &str = "nezha-save.json";

/// Configuration for a game session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// RNG seed for tile spawns
    pub seed: u64,
    /// Where the file store keeps the snapshot
    pub save_path: PathBuf,
    /// Tile value that wins the game
    pub win_value: u32,
    /// Percent chance a spawned tile is a 4
    pub four_chance: u32,
    /// Name of the theme used for labels
    pub theme: String,
    /// Per-skill duration and cooldown
    pub skills: SkillTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            win_value: WIN_VALUE,
            four_chance: FOUR_CHANCE_PERCENT,
            theme: "nezha".to_string(),
            skills: SkillTable::default(),
        }
    }
}

impl GameConfig {
    /// Default config with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// Unset variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            seed: env_parse("NEZHA_SEED").unwrap_or(defaults.seed),
            save_path: std::env::var("NEZHA_SAVE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.save_path),
            win_value: env_parse("NEZHA_WIN_VALUE")
                .filter(|v: &u32| crate::game::tile::is_tile_value(*v))
                .unwrap_or(defaults.win_value),
            four_chance: env_parse("NEZHA_FOUR_CHANCE")
                .map(|v: u32| v.min(100))
                .unwrap_or(defaults.four_chance),
            theme: std::env::var("NEZHA_THEME").unwrap_or(defaults.theme),
            skills: defaults.skills,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}
