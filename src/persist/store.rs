//! Snapshot Storage
//!
//! The session side only needs `load`, `save` and `clear`. Storage failures
//! never reach gameplay: they are logged and treated as "nothing stored".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::persist::snapshot::Snapshot;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored text is not JSON, or the snapshot could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere a single snapshot can be kept.
pub trait Persistence {
    /// Stored snapshot, if any.
    fn load(&self) -> Option<Snapshot>;

    /// Replace the stored snapshot.
    fn save(&mut self, snapshot: &Snapshot);

    /// Forget the stored snapshot.
    fn clear(&mut self);
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Option<Snapshot>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> Option<Snapshot> {
        self.slot.clone()
    }

    fn save(&mut self, snapshot: &Snapshot) {
        self.slot = Some(snapshot.clone());
    }

    fn clear(&mut self) {
        self.slot = None;
    }
}

/// Store backed by one pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is `Ok(None)`.
    pub fn try_load(&self) -> Result<Option<Snapshot>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(Snapshot::parse(&text)?))
    }

    /// Write the file, replacing any previous content.
    ///
    /// The snapshot goes to a sibling temp file first and is renamed over the
    /// save, so an interrupted write leaves the old save intact.
    pub fn try_save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let text = snapshot.to_json()?;
        let temp = self.temp_path();
        if let Err(err) = fs::write(&temp, text).and_then(|_| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(err.into());
        }
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    /// Sibling path used while writing.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Delete the file. Already gone is fine.
    pub fn try_clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl Persistence for JsonFileStore {
    fn load(&self) -> Option<Snapshot> {
        self.try_load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to load snapshot");
            None
        })
    }

    fn save(&mut self, snapshot: &Snapshot) {
        if let Err(err) = self.try_save(snapshot) {
            warn!(path = %self.path.display(), error = %err, "failed to save snapshot");
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.try_clear() {
            warn!(path = %self.path.display(), error = %err, "failed to clear snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::session::GameSession;
    use crate::persist::snapshot::{deserialize, serialize};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nezha-{}-{}.json", name, std::process::id()))
    }

    fn sample() -> Snapshot {
        let mut session = GameSession::new(GameConfig::with_seed(3));
        session.new_game();
        serialize(&session)
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.load().is_none());

        let snapshot = sample();
        store.save(&snapshot);
        assert_eq!(store.load(), Some(snapshot));

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("round-trip");
        let mut store = JsonFileStore::new(&path);
        store.clear();
        assert!(store.load().is_none());

        let snapshot = sample();
        store.save(&snapshot);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(
            deserialize(&loaded).compute_hash(),
            deserialize(&snapshot).compute_hash()
        );

        store.clear();
        assert!(!path.exists());
        // Clearing twice is harmless
        assert!(store.try_clear().is_ok());
    }

    #[test]
    fn test_file_store_replaces_through_temp_file() {
        let path = temp_path("replace");
        fs::write(&path, "old contents").unwrap();
        let store = JsonFileStore::new(&path);

        let snapshot = sample();
        store.try_save(&snapshot).unwrap();
        assert_eq!(store.try_load().unwrap(), Some(snapshot));
        assert!(!store.temp_path().exists());
        assert_eq!(store.temp_path().parent(), path.parent());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_interrupted_save_keeps_previous() {
        let path = temp_path("interrupted");
        let store = JsonFileStore::new(&path);
        let first = sample();
        store.try_save(&first).unwrap();

        // A leftover partial write beside the save is never read back
        fs::write(store.temp_path(), "{ \"score\": 12").unwrap();
        assert_eq!(store.try_load().unwrap(), Some(first));

        fs::remove_file(store.temp_path()).unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ definitely not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.try_load(), Err(StoreError::Json(_))));
        assert!(store.load().is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_bad_directory() {
        let path = temp_path("missing-dir").join("nested").join("save.json");
        let mut store = JsonFileStore::new(&path);

        assert!(matches!(store.try_save(&sample()), Err(StoreError::Io(_))));
        // Swallowed through the trait
        store.save(&sample());
        assert!(store.load().is_none());
    }
}
