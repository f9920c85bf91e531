#![warn(missing_docs)]
//! # consent-lens-store
//!
//! ## Purpose
//! Abstracts the host platform's persistent key-value store and the typed
//! records kept in it.
//!
//! ## Responsibilities
//! - Define the store trait with atomic single-key get/set semantics.
//! - Provide an in-memory backend and a write-through JSON-file backend.
//! - Read preferences and news read-state with missing-key defaults.
//! - Implement the full-wipe flow, the only cache destruction path.
//!
//! ## Data flow
//! Coordinator cache entries, the two user preferences, and the two
//! read-news id lists all live behind [`KeyValueStore`]; typed helpers keep
//! default handling in one place.
//!
//! ## Ownership and lifetimes
//! Stored values are owned `serde_json::Value`s; backends synchronize
//! internally so callers share them behind `Arc` without extra locking.
//!
//! ## Error model
//! Backend I/O and codec failures return [`StoreError`]; missing keys are
//! defaults, never errors.
//!
//! ## Security and privacy notes
//! The store holds bounded analyzed-text echoes inside cache entries; no
//! helper here ever copies them into logs or error messages.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use consent_lens_core::Mode;
use serde_json::Value;
use thiserror::Error;

/// Key prefix for analysis cache entries.
pub const ANALYSIS_KEY_PREFIX: &str = "analysis:";

/// Preference: show the pre-analysis prompt before scanning.
pub const PREF_PRE_PROMPT_KEY: &str = "preAnalysisPromptEnabled";

/// Preference: use the free backend variant.
pub const PREF_FREE_MODE_KEY: &str = "freeVersionEnabled";

/// Read-state key for the free news feed.
pub const NEWS_READ_FREE_KEY: &str = "newsReadFree";

/// Read-state key for the full news feed.
pub const NEWS_READ_FULL_KEY: &str = "newsReadFull";

/// Persistent string-keyed JSON store with atomic single-key operations.
pub trait KeyValueStore: Send + Sync {
    /// Reads one key; `None` when absent.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes one key, replacing any previous value wholesale.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes one key; removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Removes every key.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Mutex-backed in-memory store for tests and the CLI path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.lock()?.clear();
        Ok(())
    }
}

/// Write-through store persisting the whole document as one JSON file.
///
/// Single-key atomicity comes from the interior mutex; the file is rewritten
/// after every mutation, matching the small working set this store holds.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, loading any existing document.
    ///
    /// # Errors
    /// Returns [`StoreError`] when an existing document cannot be read or
    /// decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).map_err(StoreError::Codec)?
            }
            Ok(_) => HashMap::new(),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => {
                return Err(StoreError::Backend(format!(
                    "unable to read store file '{}': {error}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn persist(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        let document = serde_json::to_string(entries).map_err(StoreError::Codec)?;
        std::fs::write(&self.path, document).map_err(|error| {
            StoreError::Backend(format!(
                "unable to write store file '{}': {error}",
                self.path.display()
            ))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.remove(key);
        self.persist(&entries)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        entries.clear();
        self.persist(&entries)
    }
}

/// Reads a boolean key; missing or non-boolean values read as `false`.
///
/// # Errors
/// Returns [`StoreError`] on backend failure.
pub fn read_bool(store: &dyn KeyValueStore, key: &str) -> Result<bool, StoreError> {
    Ok(store
        .get(key)?
        .and_then(|value| value.as_bool())
        .unwrap_or(false))
}

/// Writes a boolean key.
///
/// # Errors
/// Returns [`StoreError`] on backend failure.
pub fn write_bool(store: &dyn KeyValueStore, key: &str, value: bool) -> Result<(), StoreError> {
    store.set(key, Value::Bool(value))
}

/// Reads a string-list key; missing keys read as empty, blank and
/// non-string members are dropped.
///
/// # Errors
/// Returns [`StoreError`] on backend failure.
pub fn read_string_list(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<String>, StoreError> {
    let values = match store.get(key)? {
        Some(Value::Array(values)) => values,
        _ => return Ok(Vec::new()),
    };

    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        })
        .collect())
}

/// Two-flag user preference record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preferences {
    /// Show the pre-analysis prompt before scanning.
    pub pre_analysis_prompt: bool,
    /// Use the free backend variant.
    pub free_mode: bool,
}

impl Preferences {
    /// Loads both preferences, defaulting missing keys to `false`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StoreError> {
        Ok(Self {
            pre_analysis_prompt: read_bool(store, PREF_PRE_PROMPT_KEY)?,
            free_mode: read_bool(store, PREF_FREE_MODE_KEY)?,
        })
    }

    /// Persists both preferences.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        write_bool(store, PREF_PRE_PROMPT_KEY, self.pre_analysis_prompt)?;
        write_bool(store, PREF_FREE_MODE_KEY, self.free_mode)
    }

    /// Returns the analysis mode the free-mode flag selects.
    pub fn mode(&self) -> Mode {
        Mode::from_use_summary(self.free_mode)
    }
}

/// Returns the read-state key for `mode`'s news feed.
pub fn news_read_key(mode: Mode) -> &'static str {
    match mode {
        Mode::Free => NEWS_READ_FREE_KEY,
        Mode::Full => NEWS_READ_FULL_KEY,
    }
}

/// Set of news-item ids the user has already opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    ids: std::collections::BTreeSet<String>,
}

impl ReadSet {
    /// Loads the read set for `mode`; a missing key reads as empty.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    pub fn load(store: &dyn KeyValueStore, mode: Mode) -> Result<Self, StoreError> {
        let ids = read_string_list(store, news_read_key(mode))?;
        Ok(Self {
            ids: ids.into_iter().collect(),
        })
    }

    /// Persists the read set for `mode`.
    ///
    /// # Errors
    /// Returns [`StoreError`] on backend failure.
    pub fn save(&self, store: &dyn KeyValueStore, mode: Mode) -> Result<(), StoreError> {
        let values = self.ids.iter().cloned().map(Value::String).collect();
        store.set(news_read_key(mode), Value::Array(values))
    }

    /// Returns `true` when `id` has been read.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Marks `id` read; blank ids are ignored.
    pub fn mark_read(&mut self, id: &str) {
        if id.trim().is_empty() {
            return;
        }
        self.ids.insert(id.to_string());
    }

    /// Returns the number of read ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when nothing has been read.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Wipes the whole store, then re-seeds the pre-prompt preference to off.
///
/// This is the only destruction path for cache entries; nothing expires or
/// evicts them individually.
///
/// # Errors
/// Returns [`StoreError`] on backend failure.
pub fn wipe_all(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    store.clear()?;
    write_bool(store, PREF_PRE_PROMPT_KEY, false)
}

/// Store layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend runtime failure.
    #[error("store backend failure: {0}")]
    Backend(String),
    /// JSON encoding/decoding failure.
    #[error("store codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for default handling and the wipe flow.

    use serde_json::json;

    use super::*;

    #[test]
    fn missing_keys_read_as_defaults() {
        let store = MemoryStore::new();
        assert!(!read_bool(&store, PREF_FREE_MODE_KEY).expect("read should work"));
        assert!(
            read_string_list(&store, NEWS_READ_FREE_KEY)
                .expect("read should work")
                .is_empty()
        );
    }

    #[test]
    fn read_set_filters_blank_ids() {
        let store = MemoryStore::new();
        store
            .set(NEWS_READ_FREE_KEY, json!(["a", "", "  ", "b", 7]))
            .expect("set should work");

        let read = ReadSet::load(&store, Mode::Free).expect("load should work");
        assert_eq!(read.len(), 2);
        assert!(read.contains("a"));
        assert!(read.contains("b"));
    }

    #[test]
    fn read_sets_are_mode_scoped() {
        let store = MemoryStore::new();
        let mut free = ReadSet::load(&store, Mode::Free).expect("load should work");
        free.mark_read("item-1");
        free.save(&store, Mode::Free).expect("save should work");

        let full = ReadSet::load(&store, Mode::Full).expect("load should work");
        assert!(full.is_empty());
    }

    #[test]
    fn wipe_clears_everything_and_reseeds_pre_prompt() {
        let store = MemoryStore::new();
        store
            .set("analysis:abc", json!({"score": 10}))
            .expect("set should work");
        write_bool(&store, PREF_PRE_PROMPT_KEY, true).expect("set should work");

        wipe_all(&store).expect("wipe should work");

        assert!(store.get("analysis:abc").expect("get should work").is_none());
        assert!(!read_bool(&store, PREF_PRE_PROMPT_KEY).expect("read should work"));
    }

    #[test]
    fn file_store_round_trips_document() {
        let dir = std::env::temp_dir().join("consent-lens-store-test");
        std::fs::create_dir_all(&dir).expect("temp dir should create");
        let path = dir.join("store-roundtrip.json");
        let _ = std::fs::remove_file(&path);

        let store = JsonFileStore::open(&path).expect("open should work");
        store
            .set("analysis:abc", json!({"score": 42}))
            .expect("set should work");
        drop(store);

        let reopened = JsonFileStore::open(&path).expect("reopen should work");
        let value = reopened
            .get("analysis:abc")
            .expect("get should work")
            .expect("entry should persist");
        assert_eq!(value["score"], 42);

        let _ = std::fs::remove_file(&path);
    }
}
