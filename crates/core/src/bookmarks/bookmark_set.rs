use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::{debug, error, warn};
use tokio::sync::watch;

use crate::config::SyncConfig;
use crate::errors::{Error, Result};
use crate::models::OpportunityListing;
use crate::notifications::NotificationCenter;
use crate::optimistic::{Compensation, Optimistic};
use crate::remote::{Bookmarks, RemoteCollectionApi};
use crate::runtime::lock;
use crate::session::SessionProvider;
use crate::store::{EntitySyncStore, StoreSnapshot, SyncHandle, SyncedEntity};

pub const SIGN_IN_REQUIRED_TITLE: &str = "Sign in required";
pub const SIGN_IN_TO_BOOKMARK: &str = "Please sign in to bookmark opportunities";
pub const BOOKMARK_FAILED_TITLE: &str = "Bookmark not updated";
pub const BOOKMARK_UPDATE_FAILED: &str = "Failed to update bookmark. Please try again.";

/// Effect of a bookmark toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// No session; nothing changed and the user was asked to sign in.
    SignInRequired,
    /// The listing carries no identifier; nothing changed.
    Ignored,
}

/// The signed-in user's bookmarked listings with optimistic toggling.
///
/// Membership is keyed by listing id or legacy index id. Refresh and
/// background sync behave exactly like an [`EntitySyncStore`].
#[derive(Clone)]
pub struct BookmarkSet {
    store: EntitySyncStore<OpportunityListing>,
    api: Arc<dyn RemoteCollectionApi>,
    session: Arc<dyn SessionProvider>,
    notifications: NotificationCenter,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl BookmarkSet {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn RemoteCollectionApi>,
        notifications: NotificationCenter,
        config: SyncConfig,
    ) -> Self {
        let store = EntitySyncStore::new(Arc::new(Bookmarks(api.clone())), session.clone(), config);
        Self {
            store,
            api,
            session,
            notifications,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn bookmarks(&self) -> Vec<OpportunityListing> {
        self.store.items()
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot<OpportunityListing>> {
        self.store.subscribe()
    }

    /// The underlying store, for snapshot reads.
    pub fn store(&self) -> &EntitySyncStore<OpportunityListing> {
        &self.store
    }

    pub fn is_bookmarked(&self, opportunity_id: &str) -> bool {
        !opportunity_id.is_empty() && self.store.contains(opportunity_id)
    }

    pub async fn refresh_bookmarks(&self) {
        self.store.refresh().await
    }

    pub fn spawn_sync(&self) -> SyncHandle {
        self.store.spawn_sync()
    }

    /// Flips membership of `opportunity`, rolling back and raising an error
    /// notification when the remote call fails.
    pub async fn toggle_bookmark(&self, opportunity: &OpportunityListing) -> Result<ToggleOutcome> {
        match self.try_toggle(opportunity).await? {
            Optimistic::Applied(outcome) => Ok(outcome),
            Optimistic::Rejected {
                reason,
                compensation,
                ..
            } => {
                compensation.run();
                self.notifications
                    .error(BOOKMARK_FAILED_TITLE, failure_message(&reason), None);
                Err(reason)
            }
        }
    }

    /// Flips membership locally, then commits it remotely. A rejection is
    /// returned with its compensation unrun.
    ///
    /// Fails with [`Error::ToggleInFlight`] while another toggle of the same
    /// listing is unresolved.
    pub async fn try_toggle(
        &self,
        opportunity: &OpportunityListing,
    ) -> Result<Optimistic<ToggleOutcome>> {
        if !self.session.is_active() {
            self.notifications
                .warning(SIGN_IN_REQUIRED_TITLE, SIGN_IN_TO_BOOKMARK, None);
            return Ok(Optimistic::Applied(ToggleOutcome::SignInRequired));
        }

        let key = opportunity.id().to_string();
        if key.is_empty() {
            debug!("Ignoring bookmark toggle for a listing without an id");
            return Ok(Optimistic::Applied(ToggleOutcome::Ignored));
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, &key)?;
        let was_bookmarked = self.is_bookmarked(&key);
        let compensation = if was_bookmarked {
            self.remove_local(&key)
        } else {
            self.append_local(opportunity.clone(), &key)
        };

        let token = match self.session.id_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No token available for bookmark '{}', reverting", key);
                compensation.run();
                return Ok(Optimistic::Applied(ToggleOutcome::SignInRequired));
            }
            Err(reason) => {
                return Ok(Optimistic::Rejected {
                    attempted: toggled(was_bookmarked),
                    reason,
                    compensation,
                })
            }
        };

        let result = if was_bookmarked {
            self.api.remove_bookmark(&key, &token).await
        } else {
            self.api.add_bookmark(&key, &token).await
        };

        Ok(match result {
            Ok(()) => {
                debug!("Bookmark '{}' {:?}", key, toggled(was_bookmarked));
                Optimistic::Applied(toggled(was_bookmarked))
            }
            Err(reason) => {
                error!("Error toggling bookmark '{}': {}", key, reason);
                Optimistic::Rejected {
                    attempted: toggled(was_bookmarked),
                    reason,
                    compensation,
                }
            }
        })
    }

    /// Removes every entry matching `key`; the compensation puts them back
    /// at their previous positions.
    fn remove_local(&self, key: &str) -> Compensation {
        let mut removed: Vec<(usize, OpportunityListing)> = Vec::new();
        self.store.modify_items(|items| {
            let mut index = 0;
            items.retain(|item| {
                let keep = !item.matches(key);
                if !keep {
                    removed.push((index, item.clone()));
                }
                index += 1;
                keep
            });
            !removed.is_empty()
        });

        let store = self.store.clone();
        Compensation::new(move || {
            store.modify_items(|items| {
                for (index, entry) in removed {
                    let index = index.min(items.len());
                    items.insert(index, entry);
                }
                true
            });
        })
    }

    /// Appends `opportunity`; the compensation removes it again.
    fn append_local(&self, opportunity: OpportunityListing, key: &str) -> Compensation {
        self.store.modify_items(|items| {
            items.push(opportunity);
            true
        });

        let store = self.store.clone();
        let key = key.to_string();
        Compensation::new(move || {
            store.modify_items(|items| {
                let before = items.len();
                items.retain(|item| !item.matches(&key));
                items.len() != before
            });
        })
    }
}

/// User-facing text for a failed toggle.
fn failure_message(reason: &Error) -> &'static str {
    match reason {
        Error::Remote(_) => BOOKMARK_UPDATE_FAILED,
        other => other.user_message(),
    }
}

fn toggled(was_bookmarked: bool) -> ToggleOutcome {
    if was_bookmarked {
        ToggleOutcome::Removed
    } else {
        ToggleOutcome::Added
    }
}

/// Marks a listing as having a toggle in flight until dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, key: &str) -> Result<Self> {
        if !lock(set).insert(key.to_string()) {
            return Err(Error::ToggleInFlight(key.to_string()));
        }
        Ok(Self {
            set: set.clone(),
            key: key.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.key);
    }
}
