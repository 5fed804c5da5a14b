//! # Nezha 2048
//!
//! Game core for a Nezha-themed 2048: board, moves, skills and save files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        NEZHA 2048                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded Xorshift128+ for tile spawns       │
//! │  └── hash.rs     - State hashing for save verification       │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── tile.rs     - Tile values and positions                 │
//! │  ├── grid.rs     - 4x4 cell storage                          │
//! │  ├── moves.rs    - Slide and merge resolution                │
//! │  ├── skill.rs    - Cooldowns and active windows              │
//! │  ├── ability.rs  - Skill effects on the board                │
//! │  ├── session.rs  - Score, level and win/lose state           │
//! │  ├── events.rs   - Events for the UI                         │
//! │  └── theme.rs    - Labels and colors                         │
//! │                                                              │
//! │  persist/        - Save and restore                          │
//! │  ├── snapshot.rs - JSON snapshot shape                       │
//! │  └── store.rs    - Memory and file stores                    │
//! │                                                              │
//! │  config.rs       - Session configuration                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the clock for gameplay.
//! Skill timers advance only through [`GameSession::tick`], and every spawn
//! draws from the seeded RNG, so the same seed and inputs replay the same
//! game. Wall-clock time appears only in the `started_at` and snapshot
//! timestamps, which are excluded from the state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod persist;

// Re-export commonly used types
pub use config::GameConfig;
pub use core::rng::DeterministicRng;
pub use game::moves::Direction;
pub use game::session::GameSession;
pub use game::skill::Skill;
pub use persist::{JsonFileStore, MemoryStore, Persistence, Snapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
