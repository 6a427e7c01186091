//! Debounced write-through of in-progress form state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use super::storage::KeyValueStore;
use crate::config::SyncConfig;
use crate::constants::DRAFT_TIMESTAMP_SUFFIX;
use crate::errors::Result;
use crate::runtime::{lock, ScheduledTask};

/// Draft state exposed to the form.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftState<T> {
    /// Draft found at load time, offered for restore.
    pub saved_data: Option<T>,
    pub last_saved: Option<DateTime<Utc>>,
    pub show_restore_prompt: bool,
}

impl<T> Default for DraftState<T> {
    fn default() -> Self {
        Self {
            saved_data: None,
            last_saved: None,
            show_restore_prompt: false,
        }
    }
}

/// Persists the latest value of a form under a storage key once edits have
/// been quiet for the debounce window.
///
/// Dropping the autosave cancels a pending write.
pub struct Autosave<T> {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    debounce: Duration,
    max_age: Duration,
    state: Arc<Mutex<DraftState<T>>>,
    pending: Option<ScheduledTask>,
    /// Serialized value of the last write scheduled.
    last_watched: Option<String>,
}

impl<T> Autosave<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Loads any persisted draft for `key`. Drafts at least `draft_max_age`
    /// old are purged instead of offered.
    pub fn load(key: impl Into<String>, storage: Arc<dyn KeyValueStore>, config: &SyncConfig) -> Self {
        let autosave = Self {
            storage,
            key: key.into(),
            debounce: config.autosave_debounce(),
            max_age: config.draft_max_age(),
            state: Arc::new(Mutex::new(DraftState::default())),
            pending: None,
            last_watched: None,
        };
        autosave.load_draft();
        autosave
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Records the current value of the form. A changed value restarts the
    /// debounce window; an unchanged one leaves the scheduled write alone.
    pub fn watch(&mut self, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                error!("Error serializing draft '{}': {}", self.key, err);
                return;
            }
        };
        if json == "null" {
            self.pending = None;
            self.last_watched = None;
            return;
        }
        if self.last_watched.as_deref() == Some(json.as_str()) {
            return;
        }
        self.last_watched = Some(json.clone());

        let deadline = Instant::now() + self.debounce;
        let storage = self.storage.clone();
        let state = self.state.clone();
        let key = self.key.clone();

        // Replacing the handle aborts the previous timer.
        self.pending = Some(ScheduledTask::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let now = Utc::now();
            match persist(storage.as_ref(), &key, &json, now) {
                Ok(()) => {
                    debug!("Draft '{}' saved", key);
                    lock(&state).last_saved = Some(now);
                }
                Err(err) => error!("Error saving draft '{}': {}", key, err),
            }
        }));
    }

    /// Whether a write is scheduled but not yet performed.
    pub fn has_pending_write(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn state(&self) -> DraftState<T> {
        lock(&self.state).clone()
    }

    pub fn saved_data(&self) -> Option<T> {
        lock(&self.state).saved_data.clone()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).last_saved
    }

    pub fn show_restore_prompt(&self) -> bool {
        lock(&self.state).show_restore_prompt
    }

    /// Hides the restore prompt and hands back the loaded draft.
    pub fn restore_draft(&self) -> Option<T> {
        let mut state = lock(&self.state);
        state.show_restore_prompt = false;
        state.saved_data.clone()
    }

    /// Forgets the loaded draft and deletes it from storage.
    pub fn discard_draft(&self) {
        *lock(&self.state) = DraftState::default();
        self.purge();
    }

    /// Deletes the persisted draft, typically after a successful submit.
    pub fn clear_saved(&self) {
        self.purge();
        lock(&self.state).last_saved = None;
    }

    /// Switches to `key`: the pending write is dropped and the draft stored
    /// under the new key is loaded.
    pub fn rekey(&mut self, key: impl Into<String>) {
        self.pending = None;
        self.last_watched = None;
        self.key = key.into();
        *lock(&self.state) = DraftState::default();
        self.load_draft();
    }

    fn load_draft(&self) {
        match self.read_draft() {
            Ok(Some(Stored::Fresh(data, saved_at))) => {
                debug!("Found draft '{}' from {}", self.key, saved_at);
                let mut state = lock(&self.state);
                state.saved_data = Some(data);
                state.last_saved = Some(saved_at);
                state.show_restore_prompt = true;
            }
            Ok(Some(Stored::Stale)) => {
                debug!("Purging stale draft '{}'", self.key);
                self.purge();
            }
            Ok(None) => {}
            Err(err) => error!("Error loading draft '{}': {}", self.key, err),
        }
    }

    fn read_draft(&self) -> Result<Option<Stored<T>>> {
        let saved = self.storage.get(&self.key)?;
        let timestamp = self.storage.get(&timestamp_key(&self.key))?;
        let (Some(saved), Some(timestamp)) = (saved, timestamp) else {
            return Ok(None);
        };

        let saved_at = timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());
        let Some(saved_at) = saved_at else {
            warn!("Invalid timestamp '{}' for draft '{}'", timestamp, self.key);
            return Ok(Some(Stored::Stale));
        };

        let age = Utc::now().signed_duration_since(saved_at);
        // A timestamp in the future counts as fresh.
        let fresh = match age.to_std() {
            Ok(age) => age < self.max_age,
            Err(_) => true,
        };
        if !fresh {
            return Ok(Some(Stored::Stale));
        }

        let data: T = serde_json::from_str(&saved)?;
        Ok(Some(Stored::Fresh(data, saved_at)))
    }

    fn purge(&self) {
        for key in [self.key.clone(), timestamp_key(&self.key)] {
            if let Err(err) = self.storage.remove(&key) {
                warn!("Error removing draft entry '{}': {}", key, err);
            }
        }
    }
}

enum Stored<T> {
    Fresh(T, DateTime<Utc>),
    Stale,
}

/// Storage key holding the capture time of the draft stored under `key`.
pub fn timestamp_key(key: &str) -> String {
    format!("{}{}", key, DRAFT_TIMESTAMP_SUFFIX)
}

fn persist(storage: &dyn KeyValueStore, key: &str, json: &str, now: DateTime<Utc>) -> Result<()> {
    storage.set(key, json)?;
    storage.set(&timestamp_key(key), &now.timestamp_millis().to_string())
}
