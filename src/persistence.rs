use crate::leaderboard;
use crate::model::types::{LeaderboardEntry, Theme};
use anyhow::{Context, Result};
use log::{info, warn};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const THEME_KEY: &str = "quiz-theme";
pub const LEADERBOARD_KEY: &str = "quiz-leaderboard";

/// Minimal string key-value storage, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Typed access to the theme and leaderboard records.
/// Reads never fail: a missing, unreadable or malformed record is the default.
pub struct PersistenceClient {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceClient {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Backed by memory only; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn load_theme(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
                warn!("Ignoring unknown theme {value:?}");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to load theme: {e:#}");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    pub fn load_leaderboard(&self) -> Vec<LeaderboardEntry> {
        let raw = match self.store.get(LEADERBOARD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to load leaderboard: {e:#}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
            Ok(mut entries) => {
                // Hand-edited files may be unsorted or too long.
                entries.sort_by(leaderboard::rank);
                entries.truncate(leaderboard::MAX_ENTRIES);
                entries
            }
            Err(e) => {
                warn!("Discarding malformed leaderboard record: {e}");
                Vec::new()
            }
        }
    }

    /// Insert a finished quiz and persist the new top list, which is returned
    /// even when writing it back fails.
    pub fn record_result(&self, entry: LeaderboardEntry) -> (Vec<LeaderboardEntry>, Result<()>) {
        let entries = leaderboard::insert_ranked(self.load_leaderboard(), entry);
        let saved = serde_json::to_string(&entries)
            .context("Failed to serialize leaderboard")
            .and_then(|json| self.store.set(LEADERBOARD_KEY, &json));
        if saved.is_ok() {
            info!("Leaderboard saved with {} entries", entries.len());
        }
        (entries, saved)
    }

    pub fn clear_leaderboard(&self) -> Result<()> {
        self.store.remove(LEADERBOARD_KEY)?;
        info!("Leaderboard cleared");
        Ok(())
    }
}
