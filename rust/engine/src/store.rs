//! Persistence contracts for player progress.
//!
//! The engine never touches storage directly; it talks to a
//! [`StatsRepository`]. The stock implementation, [`KvStatsRepository`], lays
//! records out over any string key-value store: [`MemoryStore`] for tests and
//! throwaway sessions, [`FileStore`] for a JSON document on disk.

use std::collections::BTreeMap;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::achievements::AchievementRecord;
use crate::player::{PlayerRecord, PlayerStats, STARTING_CHIPS};

pub const STATS_KEY: &str = "blackjack_player_stats";
pub const CHIPS_KEY: &str = "blackjack_player_chips";
pub const ACHIEVEMENTS_KEY: &str = "blackjack_achievements";
pub const LAST_SAVED_KEY: &str = "blackjack_last_saved";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("stored value for `{key}` is malformed: {reason}")]
    Malformed { key: String, reason: String },
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same map, so a second engine built from a
/// clone sees what the first one saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key.to_string(), value);
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk.
///
/// The whole document is rewritten on every `set` through a sibling temp file
/// followed by a rename, so a crash never leaves a half-written profile.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens `path`, starting empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }
}

/// Load/save contract the round engine persists progress through.
pub trait StatsRepository {
    fn load_player(&self) -> Result<Option<PlayerRecord>, StoreError>;
    fn save_player(&mut self, record: &PlayerRecord) -> Result<(), StoreError>;
    fn load_achievements(&self) -> Result<Option<AchievementRecord>, StoreError>;
    fn save_achievements(&mut self, record: &AchievementRecord) -> Result<(), StoreError>;

    /// RFC 3339 timestamp of the last player save, when the backend keeps one.
    fn last_saved(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

impl<T: StatsRepository + ?Sized> StatsRepository for Box<T> {
    fn load_player(&self) -> Result<Option<PlayerRecord>, StoreError> {
        (**self).load_player()
    }
    fn save_player(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        (**self).save_player(record)
    }
    fn load_achievements(&self) -> Result<Option<AchievementRecord>, StoreError> {
        (**self).load_achievements()
    }
    fn save_achievements(&mut self, record: &AchievementRecord) -> Result<(), StoreError> {
        (**self).save_achievements(record)
    }
    fn last_saved(&self) -> Result<Option<String>, StoreError> {
        (**self).last_saved()
    }
}

/// [`StatsRepository`] over a key-value store.
///
/// Stats are a JSON object, chips a decimal string and achievements a JSON
/// object of unlock entries, each under its own key.
#[derive(Debug, Clone, Default)]
pub struct KvStatsRepository<S> {
    store: S,
}

impl<S: KeyValueStore> KvStatsRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> StatsRepository for KvStatsRepository<S> {
    fn load_player(&self) -> Result<Option<PlayerRecord>, StoreError> {
        let stats = self.store.get(STATS_KEY)?;
        let chips = self.store.get(CHIPS_KEY)?;
        if stats.is_none() && chips.is_none() {
            return Ok(None);
        }

        let stats = match stats {
            Some(raw) => serde_json::from_str::<PlayerStats>(&raw)?,
            None => PlayerStats::default(),
        };
        let chips = match chips {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| StoreError::Malformed {
                key: CHIPS_KEY.to_string(),
                reason: e.to_string(),
            })?,
            None => STARTING_CHIPS,
        };
        Ok(Some(PlayerRecord { stats, chips }))
    }

    fn save_player(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.store
            .set(STATS_KEY, serde_json::to_string(&record.stats)?)?;
        self.store.set(CHIPS_KEY, record.chips.to_string())?;
        self.store.set(
            LAST_SAVED_KEY,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    fn load_achievements(&self) -> Result<Option<AchievementRecord>, StoreError> {
        match self.store.get(ACHIEVEMENTS_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_achievements(&mut self, record: &AchievementRecord) -> Result<(), StoreError> {
        self.store
            .set(ACHIEVEMENTS_KEY, serde_json::to_string(record)?)
    }

    fn last_saved(&self) -> Result<Option<String>, StoreError> {
        self.store.get(LAST_SAVED_KEY)
    }
}
