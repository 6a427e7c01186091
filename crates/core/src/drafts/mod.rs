//! Local persistence of in-progress form drafts.
//!
//! A draft is stored as two entries of a [`KeyValueStore`]: the JSON value
//! under `<key>` and its capture time (epoch milliseconds) under
//! `<key>-timestamp`.

mod autosave;
mod file_store;
mod storage;

pub use autosave::{timestamp_key, Autosave, DraftState};
pub use file_store::JsonFileStore;
pub use storage::{KeyValueStore, MemoryKeyValueStore};
