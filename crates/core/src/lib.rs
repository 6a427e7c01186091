//! Depanku Core - client-side optimistic sync layer.
//!
//! Local mirrors of the remote collections a signed-in user owns (submitted
//! applications, authored listings, bookmarks), plus the primitives that
//! share their concurrency shape: debounced draft persistence, form
//! completion and ephemeral notifications.
//!
//! Transport is abstracted behind [`remote::RemoteCollectionApi`] and
//! implemented by the `depanku-remote` crate.

pub mod bookmarks;
pub mod config;
pub mod constants;
pub mod drafts;
pub mod errors;
pub mod forms;
pub mod models;
pub mod notifications;
pub mod optimistic;
pub mod remote;
pub mod runtime;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use bookmarks::{BookmarkSet, ToggleOutcome};
pub use config::{RefreshOrdering, SyncConfig};
pub use notifications::NotificationCenter;
pub use optimistic::{Compensation, Optimistic};
pub use store::{ApplicationStore, EntitySyncStore, OpportunityStore, StoreSnapshot, SyncHandle};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
