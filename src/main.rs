//! Nezha 2048 Demo
//!
//! Plays a seeded game with a greedy policy, using skills as they come off
//! cooldown, then saves it, reloads it and checks the state hash survived.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nezha::{
    config::GameConfig,
    game::{
        moves::resolve_move,
        theme::{theme_by_name, NezhaTheme, Theme},
        Direction, GameSession, Skill,
    },
    persist::{deserialize_with, serialize, DefaultTileFactory, JsonFileStore, Persistence},
    VERSION,
};

/// Moves before the demo stops on its own
const MAX_MOVES: u32 = 2000;

/// Simulated time between moves
const MOVE_INTERVAL_MS: u64 = 400;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GameConfig::from_env();
    let theme: Box<dyn Theme> = theme_by_name(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using nezha");
        Box::new(NezhaTheme) as Box<dyn Theme>
    });

    info!("Nezha 2048 v{}", VERSION);
    info!("Seed: {}  Theme: {}", config.seed, theme.name());

    let mut session = GameSession::new(config.clone());
    session.new_game();
    play(&mut session, theme.as_ref());

    info!("=== Final Board ===");
    for y in 0..4 {
        let row: Vec<String> = (0..4)
            .map(|x| match session.grid().get(x, y) {
                Some(tile) => format!("{:>5}", tile.value),
                None => format!("{:>5}", "."),
            })
            .collect();
        info!("{}", row.join(""));
    }
    info!(
        "Score: {}  Moves: {}  Max tile: {} ({})  Level: {}",
        session.score(),
        session.moves(),
        session.max_tile_value(),
        theme.tile_label(session.max_tile_value()),
        session.nezha_level()
    );

    // Save, reload and compare
    info!("=== Verifying Save ===");
    let mut store = JsonFileStore::new(&config.save_path);
    let snapshot = serialize(&session);
    store
        .try_save(&snapshot)
        .with_context(|| format!("saving to {}", store.path().display()))?;

    let loaded = store
        .try_load()
        .with_context(|| format!("loading from {}", store.path().display()))?
        .context("save file vanished")?;
    let restored = deserialize_with(&loaded, config, &DefaultTileFactory);

    let hash = session.compute_hash();
    let restored_hash = restored.compute_hash();
    info!("Session Hash:  {}", hex::encode(hash));
    info!("Restored Hash: {}", hex::encode(restored_hash));

    if hash == restored_hash {
        info!("SAVE VERIFIED: Hashes match!");
    } else {
        warn!("SAVE MISMATCH: Hashes differ!");
    }

    if std::env::var_os("NEZHA_KEEP_SAVE").is_none() {
        store.clear();
    }
    Ok(())
}

/// Greedy self-play: take the move worth the most points, fire skills when ready.
fn play(session: &mut GameSession, theme: &dyn Theme) {
    while !session.is_game_over() && session.moves() < MAX_MOVES {
        session.tick(MOVE_INTERVAL_MS);

        for skill in [Skill::RedSash, Skill::ThreeHeads] {
            if session.skills().is_available(skill) {
                session.activate_skill(skill);
            }
        }
        // Clear out clutter once the board fills up
        if session.grid().empty_cells().len() < 3 {
            for skill in [Skill::FireWheel, Skill::UniverseRing] {
                if session.skills().is_available(skill) {
                    session.activate_skill(skill);
                }
            }
        }

        let Some(direction) = best_direction(session) else {
            break;
        };
        session.apply_move(direction);

        for event in session.take_events() {
            match &event.data {
                nezha::game::GameEventData::TileSpawned { .. }
                | nezha::game::GameEventData::TilesMerged { .. }
                | nezha::game::GameEventData::Moved { .. } => {}
                _ => info!("[move {}] {}", event.moves, event.describe(theme)),
            }
        }

        if session.moves() % 100 == 0 {
            info!(
                "Move {}: score {}, max tile {}, {} empty",
                session.moves(),
                session.score(),
                session.max_tile_value(),
                session.grid().empty_cells().len()
            );
        }
    }
}

/// Direction that scores the most on a trial board, preferring earlier
/// directions on ties. `None` when nothing moves.
fn best_direction(session: &GameSession) -> Option<Direction> {
    let mut best: Option<(Direction, u32)> = None;
    for direction in Direction::ALL {
        let mut trial = session.grid().clone();
        let outcome = resolve_move(&mut trial, direction);
        if !outcome.moved {
            continue;
        }
        if best.map_or(true, |(_, points)| outcome.points > points) {
            best = Some((direction, outcome.points));
        }
    }
    best.map(|(direction, _)| direction)
}
