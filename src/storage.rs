//! Key-value persistence for UI preferences (the `localStorage` seam).
//!
//! [`FileStorage`] keeps a flat JSON object at
//! `~/.pbi-explorer/preferences.json`. Reads are forgiving: a missing or
//! malformed file behaves like empty storage. Writes report errors so callers
//! can decide whether to care; the theme controller does not.
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// String key-value store.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Volatile storage for tests and one-shot CLI sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// JSON-file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at the default location, or `None` if there is no home
    /// directory.
    pub fn default_location() -> Option<Self> {
        preferences_path().map(Self::new)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create preferences directory")?;
        }
        let json =
            serde_json::to_string_pretty(&values).context("failed to serialize preferences")?;
        fs::write(&self.path, json).context("failed to write preferences file")?;
        Ok(())
    }
}

/// Path to the preferences file: `~/.pbi-explorer/preferences.json`.
pub fn preferences_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pbi-explorer").join("preferences.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
