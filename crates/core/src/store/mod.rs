//! Synced entity stores.
//!
//! An [`EntitySyncStore`] mirrors one remote collection for the current
//! session. It is refreshed as a whole (never diffed), mutated locally by the
//! UI, and optionally kept fresh by a background task.

mod entity_store;
mod traits;

pub use entity_store::*;
pub use traits::*;
