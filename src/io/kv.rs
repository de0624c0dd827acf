//! Local key-value storage for the persisted state blob.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;

/// Error type for key-value storage
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("invalid storage key {0:?}: use letters, digits, '-', '_' or '.'")]
    InvalidKey(String),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The stored bytes are not UTF-8; `lossy` keeps what could be decoded
    #[error("{path} is not valid UTF-8 text")]
    NotText { path: PathBuf, lossy: String },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A string-to-string store with whole-value overwrite semantics
pub trait KeyValueStore {
    /// The value stored under `key`, or `None` if never written
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One file per key (`<dir>/<key>.json`), written atomically
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(KvError::Read { path, source }),
        };
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(e) => Err(KvError::NotText {
                path,
                lossy: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        let written =
            fs::create_dir_all(&self.dir).and_then(|()| atomic_write(&path, value.as_bytes()));
        written.map_err(|source| KvError::Write { path, source })
    }
}

fn validate_key(key: &str) -> Result<(), KvError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// HashMap-backed store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one value
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        assert_eq!(store.get("itinerary-data").unwrap(), None);
        store.set("itinerary-data", "{\"a\":1}").unwrap();
        store.set("itinerary-data", "{\"a\":2}").unwrap();
        assert_eq!(
            store.get("itinerary-data").unwrap().as_deref(),
            Some("{\"a\":2}")
        );
        assert!(dir.path().join("data/itinerary-data.json").exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path());
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(
                matches!(store.set(key, "x"), Err(KvError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn file_store_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // a regular file where the data directory should be
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let mut store = FileStore::new(&blocker);
        assert!(matches!(
            store.set("itinerary-data", "{}"),
            Err(KvError::Write { .. })
        ));
    }

    #[test]
    fn file_store_reports_non_utf8_with_lossy_text() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("itinerary-data.json"),
            b"{\"title\":\"Important \xff\"}",
        )
        .unwrap();
        let store = FileStore::new(dir.path());
        match store.get("itinerary-data") {
            Err(KvError::NotText { lossy, .. }) => {
                assert_eq!(lossy, "{\"title\":\"Important \u{fffd}\"}");
            }
            other => panic!("expected NotText, got {other:?}"),
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::with_value("k", "v1");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.get("other").unwrap(), None);
    }
}
