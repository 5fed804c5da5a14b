//! Session Snapshots
//!
//! Plain structural copy of a session for save/restore, shaped as camelCase
//! JSON. The shape only ever gains optional fields, so older saves keep
//! loading.
//!
//! Loading never fails on content: a missing or wrong-typed field falls back
//! to its default (numbers 0, flags false, `maxTileValue` 2, `nezhaLevel` 1,
//! timestamps now). Merge provenance and pending events are not captured.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::GameConfig;
use crate::core::rng::DeterministicRng;
use crate::game::session::{GameSession, MIN_TILE_VALUE};
use crate::game::skill::Skill;
use crate::game::tile::{is_tile_value, Position, Tile, GRID_SIZE};

/// Current snapshot shape version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One tile as saved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSnapshot {
    /// Column
    #[serde(default, deserialize_with = "lenient")]
    pub x: i32,
    /// Row
    #[serde(default, deserialize_with = "lenient")]
    pub y: i32,
    /// Tile value
    #[serde(default, deserialize_with = "lenient")]
    pub value: u32,
    /// Column before the last move
    #[serde(default, deserialize_with = "lenient")]
    pub previous_x: Option<i32>,
    /// Row before the last move
    #[serde(default, deserialize_with = "lenient")]
    pub previous_y: Option<i32>,
    /// Spawned this move
    #[serde(default, deserialize_with = "lenient")]
    pub is_new: bool,
    /// Produced by a merge this move
    #[serde(default, deserialize_with = "lenient")]
    pub is_merged: bool,
}

impl TileSnapshot {
    /// Capture a live tile.
    pub fn from_tile(tile: &Tile) -> Self {
        Self {
            x: tile.position.x,
            y: tile.position.y,
            value: tile.value,
            previous_x: tile.previous_position.map(|p| p.x),
            previous_y: tile.previous_position.map(|p| p.y),
            is_new: tile.is_new,
            is_merged: tile.is_merged,
        }
    }
}

/// Builds live tiles from saved ones.
pub trait TileFactory {
    /// Create the tile for `slot`, or `None` to leave the cell empty.
    fn create(&self, slot: Position, saved: &TileSnapshot) -> Option<Tile>;
}

/// Rejects illegal values and trusts the slot over the saved coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTileFactory;

impl TileFactory for DefaultTileFactory {
    fn create(&self, slot: Position, saved: &TileSnapshot) -> Option<Tile> {
        if !is_tile_value(saved.value) {
            warn!(x = slot.x, y = slot.y, value = saved.value, "dropping tile with invalid value");
            return None;
        }
        let mut tile = Tile::new(slot, saved.value);
        tile.previous_position = match (saved.previous_x, saved.previous_y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        };
        tile.is_new = saved.is_new;
        tile.is_merged = saved.is_merged;
        Some(tile)
    }
}

/// Saved session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Shape version
    #[serde(default, deserialize_with = "lenient")]
    pub version: u32,

    /// Columns of cells: `grid[x][y]`
    #[serde(default, deserialize_with = "lenient_grid")]
    pub grid: Vec<Vec<Option<TileSnapshot>>>,

    /// Current score
    #[serde(default, deserialize_with = "lenient")]
    pub score: u32,
    /// Best score
    #[serde(default, deserialize_with = "lenient")]
    pub high_score: u32,
    /// Moves made
    #[serde(default, deserialize_with = "lenient")]
    pub moves: u32,
    /// No moves remain
    #[serde(default, deserialize_with = "lenient")]
    pub is_game_over: bool,
    /// Paused flag
    #[serde(default, deserialize_with = "lenient")]
    pub is_paused: bool,
    /// Winning tile reached
    #[serde(default, deserialize_with = "lenient")]
    pub is_won: bool,
    /// Merges this game
    #[serde(default, deserialize_with = "lenient")]
    pub merge_count: u32,
    /// Merge streak
    #[serde(default, deserialize_with = "lenient")]
    pub consecutive_merges: u32,
    /// Largest tile seen
    #[serde(default, deserialize_with = "lenient")]
    pub max_tile_value: u32,
    /// Level from score
    #[serde(default, deserialize_with = "lenient")]
    pub nezha_level: u32,

    /// Cooldown left per skill key, ms
    #[serde(default, deserialize_with = "lenient_millis_map")]
    pub skill_cooldowns: BTreeMap<String, u64>,
    /// Active flag per skill key
    #[serde(default, deserialize_with = "lenient_map")]
    pub skill_active: BTreeMap<String, bool>,
    /// Active window left per skill key, ms
    #[serde(default, deserialize_with = "lenient_millis_map")]
    pub skill_active_remaining: BTreeMap<String, u64>,
    /// Uses per skill key
    #[serde(default, deserialize_with = "lenient_map")]
    pub skill_usage_count: BTreeMap<String, u32>,
    /// Uses across all skills
    #[serde(default, deserialize_with = "lenient")]
    pub skill_activations: u32,

    /// Spawn RNG seed
    #[serde(default, deserialize_with = "lenient")]
    pub seed: u64,
    /// Spawn RNG state
    #[serde(default, deserialize_with = "lenient")]
    pub rng_state: Option<[u64; 2]>,

    /// Save time, ms since the Unix epoch
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: i64,
    /// Game start, ms since the Unix epoch
    #[serde(default, deserialize_with = "lenient")]
    pub started_at: i64,
}

impl Snapshot {
    /// Parse snapshot JSON. Only malformed JSON is an error; content is lenient.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    /// Build from an arbitrary JSON value. Anything that is not an object
    /// yields an empty snapshot.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            warn!("snapshot is not an object, using defaults");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(error = %err, "unreadable snapshot, using defaults");
            Self::default()
        })
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Capture a session.
pub fn serialize(session: &GameSession) -> Snapshot {
    let grid = (0..GRID_SIZE as i32)
        .map(|x| {
            (0..GRID_SIZE as i32)
                .map(|y| session.grid.get(x, y).map(TileSnapshot::from_tile))
                .collect()
        })
        .collect();

    let skills = &session.skills;
    let per_skill = |f: &dyn Fn(Skill) -> u64| -> BTreeMap<String, u64> {
        Skill::ALL.into_iter().map(|s| (s.key().to_string(), f(s))).collect()
    };

    Snapshot {
        version: SNAPSHOT_VERSION,
        grid,
        score: session.score,
        high_score: session.high_score,
        moves: session.moves,
        is_game_over: session.is_game_over,
        is_paused: session.is_paused,
        is_won: session.is_won,
        merge_count: session.merge_count,
        consecutive_merges: session.consecutive_merges,
        max_tile_value: session.max_tile_value,
        nezha_level: session.nezha_level,
        skill_cooldowns: per_skill(&|s| skills.cooldown_remaining(s)),
        skill_active: Skill::ALL
            .into_iter()
            .map(|s| (s.key().to_string(), skills.is_active(s)))
            .collect(),
        skill_active_remaining: per_skill(&|s| skills.active_remaining(s)),
        skill_usage_count: Skill::ALL
            .into_iter()
            .map(|s| (s.key().to_string(), skills.usage_count(s)))
            .collect(),
        skill_activations: skills.total_activations(),
        seed: session.config.seed,
        rng_state: Some(session.rng.state()),
        timestamp: Utc::now().timestamp_millis(),
        started_at: session.started_at.timestamp_millis(),
    }
}

/// Rebuild a session with the default config and tile factory.
pub fn deserialize(snapshot: &Snapshot) -> GameSession {
    deserialize_with(snapshot, GameConfig::default(), &DefaultTileFactory)
}

/// Rebuild a session. `config` supplies tuning that is not saved; its seed
/// is replaced by the saved one.
pub fn deserialize_with(
    snapshot: &Snapshot,
    mut config: GameConfig,
    factory: &dyn TileFactory,
) -> GameSession {
    config.seed = snapshot.seed;
    let mut session = GameSession::new(config);

    for (x, column) in snapshot.grid.iter().take(GRID_SIZE).enumerate() {
        for (y, cell) in column.iter().take(GRID_SIZE).enumerate() {
            let slot = Position::new(x as i32, y as i32);
            if let Some(tile) = cell.as_ref().and_then(|saved| factory.create(slot, saved)) {
                session.grid.set(slot.x, slot.y, tile);
            }
        }
    }

    session.score = snapshot.score;
    session.high_score = snapshot.high_score.max(snapshot.score);
    session.moves = snapshot.moves;
    session.is_game_over = snapshot.is_game_over;
    session.is_paused = snapshot.is_paused;
    session.is_won = snapshot.is_won;
    session.merge_count = snapshot.merge_count;
    session.consecutive_merges = snapshot.consecutive_merges;
    session.max_tile_value = snapshot.max_tile_value.max(MIN_TILE_VALUE);
    session.nezha_level = snapshot.nezha_level.max(1);

    for skill in Skill::ALL {
        let key = skill.key();
        session.skills.restore(
            skill,
            snapshot.skill_cooldowns.get(key).copied().unwrap_or(0),
            snapshot.skill_active.get(key).copied().unwrap_or(false),
            snapshot.skill_active_remaining.get(key).copied().unwrap_or(0),
            snapshot.skill_usage_count.get(key).copied().unwrap_or(0),
        );
    }
    session.skills.set_total_activations(snapshot.skill_activations);

    if let Some(state) = snapshot.rng_state {
        session.rng = DeterministicRng::from_state(state);
    }
    session.started_at = timestamp_or_now(snapshot.started_at);

    session
}

/// Save time of a snapshot (now when unset).
pub fn saved_at(snapshot: &Snapshot) -> DateTime<Utc> {
    timestamp_or_now(snapshot.timestamp)
}

fn timestamp_or_now(millis: i64) -> DateTime<Utc> {
    if millis <= 0 {
        return Utc::now();
    }
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}

/// Deserialize a field, falling back to its default when the value has the
/// wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Deserialize the grid cell by cell, so one bad cell only empties itself.
fn lenient_grid<'de, D>(deserializer: D) -> Result<Vec<Vec<Option<TileSnapshot>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(columns) = value else {
        return Ok(Vec::new());
    };

    Ok(columns
        .into_iter()
        .map(|column| match column {
            Value::Array(cells) => cells
                .into_iter()
                .map(|cell| Option::<TileSnapshot>::deserialize(cell).unwrap_or(None))
                .collect(),
            _ => Vec::new(),
        })
        .collect())
}

/// Deserialize a per-skill map entry by entry. Unreadable entries are dropped
/// on their own; anything other than an object yields an empty map.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(map_entries(value, |entry| T::deserialize(entry).ok()))
}

/// Like [`lenient_map`] for durations. Fractional milliseconds from
/// frame-driven timers are truncated; negative values are dropped.
fn lenient_millis_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(map_entries(value, |entry| {
        entry.as_u64().or_else(|| {
            entry
                .as_f64()
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .map(|ms| ms as u64)
        })
    }))
}

fn map_entries<T>(value: Value, read: impl Fn(Value) -> Option<T>) -> BTreeMap<String, T> {
    let Value::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, entry)| read(entry).map(|v| (key, v)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::moves::Direction;
    use proptest::prelude::*;
    use serde_json::json;

    fn place(session: &mut GameSession, x: i32, y: i32, value: u32) {
        session.grid_mut().set(x, y, Tile::new(Position::new(x, y), value));
    }

    fn sample_session() -> GameSession {
        let mut session = GameSession::new(GameConfig::with_seed(42));
        place(&mut session, 0, 0, 2);
        place(&mut session, 1, 0, 4);
        place(&mut session, 3, 3, 2048);
        session.add_score(1234);
        for _ in 0..3 {
            session.skills.activate(Skill::FireWheel, 0, 0);
        }
        session
    }

    #[test]
    fn test_round_trip_reproduces_fields() {
        let session = sample_session();
        let snapshot = serialize(&session);
        assert_eq!(snapshot.skill_usage_count["fireWheel"], 3);

        let restored = deserialize(&snapshot);

        assert_eq!(restored.grid().get(0, 0).unwrap().value, 2);
        assert_eq!(restored.grid().get(1, 0).unwrap().value, 4);
        assert_eq!(restored.grid().get(3, 3).unwrap().value, 2048);
        assert_eq!(restored.grid().tile_count(), 3);
        assert_eq!(restored.score(), 1234);
        assert_eq!(restored.high_score(), 1234);
        assert_eq!(restored.nezha_level(), 2);
        assert_eq!(restored.skills().usage_count(Skill::FireWheel), 3);
        assert_eq!(restored.skills().total_activations(), 3);
        assert_eq!(restored.compute_hash(), session.compute_hash());
        assert_eq!(
            restored.started_at().timestamp_millis(),
            session.started_at().timestamp_millis()
        );
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut session = GameSession::new(GameConfig::with_seed(7));
        session.new_game();
        session.apply_move(Direction::Left);
        session.apply_move(Direction::Up);
        place(&mut session, 2, 2, 8);
        session.activate_skill(Skill::RedSash);
        session.tick(1_000);

        let text = serialize(&session).to_json().unwrap();
        let restored = deserialize(&Snapshot::parse(&text).unwrap());

        assert_eq!(restored.compute_hash(), session.compute_hash());
        assert!(restored.skills().is_active(Skill::RedSash));
        assert_eq!(
            restored.skills().active_remaining(Skill::RedSash),
            session.skills().active_remaining(Skill::RedSash)
        );
        for tile in session.grid().occupied_tiles() {
            let other = restored.grid().tile_at(tile.position).unwrap();
            assert_eq!(other.previous_position, tile.previous_position);
            assert_eq!(other.is_new, tile.is_new);
            assert_eq!(other.is_merged, tile.is_merged);
        }
    }

    #[test]
    fn test_restored_game_continues_identically() {
        let mut session = GameSession::new(GameConfig::with_seed(99));
        session.new_game();
        session.apply_move(Direction::Down);

        let mut restored = deserialize(&serialize(&session));
        for dir in [Direction::Left, Direction::Up, Direction::Right] {
            assert_eq!(session.apply_move(dir), restored.apply_move(dir));
        }
        assert_eq!(restored.compute_hash(), session.compute_hash());
    }

    #[test]
    fn test_merge_provenance_dropped() {
        let mut session = GameSession::new(GameConfig::with_seed(1));
        place(&mut session, 0, 0, 2);
        place(&mut session, 1, 0, 2);
        session.apply_move(Direction::Left);
        assert_eq!(session.grid().get(0, 0).unwrap().merged_from.len(), 2);

        let restored = deserialize(&serialize(&session));
        let tile = restored.grid().get(0, 0).unwrap();
        assert!(tile.is_merged);
        assert!(tile.merged_from.is_empty());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let snapshot = Snapshot::from_value(json!({}));
        let session = deserialize(&snapshot);

        assert_eq!(session.score(), 0);
        assert_eq!(session.moves(), 0);
        assert!(!session.is_won());
        assert_eq!(session.max_tile_value(), 2);
        assert_eq!(session.nezha_level(), 1);
        assert_eq!(session.grid().tile_count(), 0);
        assert!(session.started_at() <= Utc::now());
        assert!(saved_at(&snapshot) <= Utc::now());
    }

    #[test]
    fn test_older_shape_loads() {
        // No skill maps, no rng state, no version
        let snapshot = Snapshot::from_value(json!({
            "grid": [[{"x": 0, "y": 0, "value": 8}, null, null, null]],
            "score": 40,
            "highScore": 100,
            "isWon": true
        }));
        let session = deserialize(&snapshot);

        assert_eq!(session.grid().get(0, 0).unwrap().value, 8);
        assert_eq!(session.score(), 40);
        assert_eq!(session.high_score(), 100);
        assert!(session.is_won());
        for skill in Skill::ALL {
            assert!(session.skills().is_available(skill));
        }
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let snapshot = Snapshot::from_value(json!({
            "grid": [
                [{"value": 4}, 17, {"value": "big"}, {"value": 6}],
                "not a column"
            ],
            "score": "lots",
            "moves": 12,
            "skillCooldowns": [1, 2, 3],
            "rngState": "seeded"
        }));
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.moves, 12);
        assert!(snapshot.skill_cooldowns.is_empty());
        assert_eq!(snapshot.rng_state, None);

        let session = deserialize(&snapshot);
        // Only the well-formed 4 survives, stamped with its slot
        assert_eq!(session.grid().tile_count(), 1);
        assert_eq!(session.grid().get(0, 0).unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn test_skill_maps_read_entry_by_entry() {
        let snapshot = Snapshot::from_value(json!({
            "skillCooldowns": {"fireWheel": 4983.5, "redSash": 12000, "threeHeads": -5},
            "skillActive": {"redSash": true, "threeHeads": "yes"},
            "skillActiveRemaining": {"redSash": 2500.9},
            "skillUsageCount": {"fireWheel": 2, "redSash": 5, "laterSkill": null}
        }));
        assert_eq!(snapshot.skill_cooldowns.get("fireWheel"), Some(&4983));
        assert!(!snapshot.skill_cooldowns.contains_key("threeHeads"));
        assert!(!snapshot.skill_usage_count.contains_key("laterSkill"));

        let session = deserialize(&snapshot);
        let skills = session.skills();
        assert_eq!(skills.cooldown_remaining(Skill::FireWheel), 4983);
        assert_eq!(skills.cooldown_remaining(Skill::RedSash), 12000);
        assert_eq!(skills.cooldown_remaining(Skill::ThreeHeads), 0);
        assert_eq!(skills.usage_count(Skill::FireWheel), 2);
        assert_eq!(skills.usage_count(Skill::RedSash), 5);
        assert!(skills.is_active(Skill::RedSash));
        assert!(!skills.is_active(Skill::ThreeHeads));
        assert_eq!(skills.active_remaining(Skill::RedSash), 2500);
    }

    #[test]
    fn test_oversized_tile_dropped() {
        let snapshot = Snapshot::from_value(json!({
            "grid": [[{"value": 2147483648u64}, {"value": 1073741824u64}]]
        }));
        let session = deserialize(&snapshot);
        assert!(session.grid().get(0, 0).is_none());
        assert_eq!(session.grid().get(0, 1).unwrap().value, 1 << 30);
    }

    #[test]
    fn test_non_object_snapshot() {
        let session = deserialize(&Snapshot::from_value(json!("not a snapshot")));
        assert_eq!(session.score(), 0);
        assert!(Snapshot::parse("{ not json").is_err());
    }

    #[test]
    fn test_slot_beats_saved_coordinates() {
        let snapshot = Snapshot::from_value(json!({
            "grid": [[null, {"x": 3, "y": 3, "value": 16}]]
        }));
        let session = deserialize(&snapshot);
        assert!(session.grid().get(3, 3).is_none());
        assert_eq!(session.grid().get(0, 1).unwrap().position, Position::new(0, 1));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let snapshot = Snapshot::from_value(json!({
            "score": 8,
            "futureFeature": {"nested": true},
            "skillUsageCount": {"fireWheel": 2, "laterSkill": 9}
        }));
        let session = deserialize(&snapshot);
        assert_eq!(session.score(), 8);
        assert_eq!(session.skills().usage_count(Skill::FireWheel), 2);
    }

    #[test]
    fn test_custom_factory() {
        struct Doubling;
        impl TileFactory for Doubling {
            fn create(&self, slot: Position, saved: &TileSnapshot) -> Option<Tile> {
                Some(Tile::new(slot, saved.value * 2))
            }
        }

        let snapshot = serialize(&sample_session());
        let session = deserialize_with(&snapshot, GameConfig::default(), &Doubling);
        assert_eq!(session.grid().get(1, 0).unwrap().value, 8);
        assert_eq!(session.rng_seed(), 42);
    }

    proptest! {
        #[test]
        fn test_round_trip_any_board(
            cells in prop::collection::vec(prop::option::of(1u32..12), 16),
            score in 0u32..100_000,
            cooldowns in prop::array::uniform4(0u64..30_000),
            uses in prop::array::uniform4(0u32..50),
        ) {
            let mut session = GameSession::new(GameConfig::with_seed(5));
            for (i, cell) in cells.iter().enumerate() {
                if let Some(exp) = cell {
                    place(&mut session, (i % 4) as i32, (i / 4) as i32, 1 << exp);
                }
            }
            session.add_score(score);
            for (i, skill) in Skill::ALL.into_iter().enumerate() {
                session.skills.restore(skill, cooldowns[i], false, 0, uses[i]);
            }

            let restored = deserialize(&serialize(&session));
            prop_assert_eq!(restored.grid(), session.grid());
            prop_assert_eq!(restored.score(), session.score());
            for skill in Skill::ALL {
                prop_assert_eq!(
                    restored.skills().cooldown_remaining(skill),
                    session.skills().cooldown_remaining(skill)
                );
                prop_assert_eq!(restored.skills().usage_count(skill), session.skills().usage_count(skill));
            }
            prop_assert_eq!(restored.compute_hash(), session.compute_hash());
        }
    }
}
