use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};

use super::storage::KeyValueStore;
use crate::errors::{Error, Result};
use crate::runtime::lock;

const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Default)]
struct StoredEntries {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// [`KeyValueStore`] persisted as a single JSON file.
///
/// Every write rewrites the whole file; access is serialized by an
/// in-process lock.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_entries<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = lock(&self.lock);
        let mut entries = self.load_locked()?;
        if op(&mut entries) {
            self.persist_locked(entries)?;
        }
        Ok(())
    }

    fn load_locked(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let raw = fs::read(&self.path)?;
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }

        let stored: StoredEntries = serde_json::from_slice(&raw)?;
        if stored.version > CURRENT_VERSION {
            return Err(Error::storage(format!(
                "{} was written by a newer version (format {})",
                self.path.display(),
                stored.version
            )));
        }
        Ok(stored.entries)
    }

    fn persist_locked(&self, entries: BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredEntries {
            version: CURRENT_VERSION,
            entries,
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)?;
        debug!("Wrote {} entries to {}", stored.entries.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = lock(&self.lock);
        Ok(self.load_locked()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_entries(|entries| entries.remove(key).is_some())
    }
}
