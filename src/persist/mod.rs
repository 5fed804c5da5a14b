//! Persistence
//!
//! Snapshot shape plus the storage seam.

pub mod snapshot;
pub mod store;

pub use snapshot::{
    deserialize, deserialize_with, serialize, DefaultTileFactory, Snapshot, TileFactory,
    TileSnapshot, SNAPSHOT_VERSION,
};
pub use store::{JsonFileStore, MemoryStore, Persistence, StoreError};
