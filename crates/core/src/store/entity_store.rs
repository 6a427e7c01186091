//! Local mirror of a remote-owned collection.

use std::future::Future;
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use super::traits::SyncedEntity;
use crate::config::{RefreshOrdering, SyncConfig};
use crate::errors::{Error, Result};
use crate::models::{ApplicationSubmission, OpportunityListing};
use crate::optimistic::{Compensation, Optimistic};
use crate::remote::{CollectionSource, MyApplications, MyOpportunities, RemoteCollectionApi};
use crate::runtime::{lock, ScheduledTask};
use crate::session::SessionProvider;

/// Reactive view of a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot<E> {
    pub items: Vec<E>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl<E> Default for StoreSnapshot<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            last_refreshed: None,
        }
    }
}

/// Bookkeeping for overlapping refreshes.
#[derive(Debug, Default)]
struct RefreshLedger {
    /// Sequence number of the most recently issued refresh.
    issued: u64,
    /// Sequence number of the most recently applied result (success or error).
    settled: u64,
    in_flight: usize,
    /// Bumped by `clear`; results from an older generation are dropped.
    generation: u64,
    last_success: Option<Instant>,
}

struct StoreInner<E: SyncedEntity> {
    source: Arc<dyn CollectionSource<E>>,
    session: Arc<dyn SessionProvider>,
    config: SyncConfig,
    state: watch::Sender<StoreSnapshot<E>>,
    ledger: Mutex<RefreshLedger>,
}

/// Authoritative local cache of a remote-owned collection for the current
/// session.
///
/// Cloning is cheap and yields a handle to the same store.
pub struct EntitySyncStore<E: SyncedEntity> {
    inner: Arc<StoreInner<E>>,
}

impl<E: SyncedEntity> Clone for EntitySyncStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub type ApplicationStore = EntitySyncStore<ApplicationSubmission>;
pub type OpportunityStore = EntitySyncStore<OpportunityListing>;

impl EntitySyncStore<ApplicationSubmission> {
    /// Store of the signed-in user's submitted applications.
    pub fn for_applications(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn RemoteCollectionApi>,
        config: SyncConfig,
    ) -> Self {
        Self::new(Arc::new(MyApplications(api)), session, config)
    }

    pub fn get_by_opportunity(&self, opportunity_id: &str) -> Vec<ApplicationSubmission> {
        self.get_by_foreign_key(opportunity_id)
    }
}

impl EntitySyncStore<OpportunityListing> {
    /// Store of the listings authored by the signed-in user.
    pub fn for_opportunities(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn RemoteCollectionApi>,
        config: SyncConfig,
    ) -> Self {
        Self::new(Arc::new(MyOpportunities(api)), session, config)
    }
}

impl<E: SyncedEntity> EntitySyncStore<E> {
    pub fn new(
        source: Arc<dyn CollectionSource<E>>,
        session: Arc<dyn SessionProvider>,
        config: SyncConfig,
    ) -> Self {
        let (state, _receiver) = watch::channel(StoreSnapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                source,
                session,
                config,
                state,
                ledger: Mutex::new(RefreshLedger::default()),
            }),
        }
    }

    fn from_inner(inner: Arc<StoreInner<E>>) -> Self {
        Self { inner }
    }

    fn name(&self) -> &'static str {
        self.inner.source.name()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot<E>> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot<E> {
        self.inner.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<E> {
        self.inner.state.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().items.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn get_by_id(&self, id: &str) -> Option<E> {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn get_by_foreign_key(&self, key: &str) -> Vec<E> {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .filter(|item| item.foreign_key() == Some(key))
            .cloned()
            .collect()
    }

    /// Whether any entity matches `id`, including secondary identifiers.
    pub fn contains(&self, id: &str) -> bool {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .any(|item| item.matches(id))
    }

    /// True when a session is active and the last successful refresh is at
    /// least `stale_after` old.
    pub fn needs_refresh(&self) -> bool {
        if !self.inner.session.is_active() {
            return false;
        }
        let ledger = lock(&self.inner.ledger);
        match ledger.last_success {
            Some(at) => at.elapsed() >= self.inner.config.stale_after(),
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local mutators
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts `entity`, replacing in place an entity with the same id, or
    /// prepending it otherwise.
    pub fn add(&self, entity: E) {
        self.inner.state.send_modify(|state| upsert(&mut state.items, entity));
    }

    /// Shallow-merges `patch` into the entity with `id`. No-op if absent.
    pub fn update(&self, id: &str, patch: E::Patch) {
        self.inner.state.send_if_modified(|state| {
            match state.items.iter_mut().find(|item| item.id() == id) {
                Some(item) => {
                    item.apply_patch(patch);
                    true
                }
                None => false,
            }
        });
    }

    pub fn remove(&self, id: &str) {
        self.inner.state.send_if_modified(|state| {
            let before = state.items.len();
            state.items.retain(|item| item.id() != id);
            state.items.len() != before
        });
    }

    /// Empties the store and forgets the last refresh. Refreshes still in
    /// flight are discarded when they resolve.
    pub fn clear(&self) {
        {
            let mut ledger = lock(&self.inner.ledger);
            ledger.generation += 1;
            ledger.last_success = None;
        }
        self.inner.state.send_modify(|state| {
            state.items.clear();
            state.error = None;
            state.last_refreshed = None;
        });
        debug!("[{}] store cleared", self.name());
    }

    /// Applies `f` to the items and notifies subscribers when it returns true.
    pub(crate) fn modify_items(&self, f: impl FnOnce(&mut Vec<E>) -> bool) {
        self.inner.state.send_if_modified(|state| f(&mut state.items));
    }

    fn position_of(&self, id: &str) -> Option<(usize, E)> {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .enumerate()
            .find(|(_, item)| item.id() == id)
            .map(|(index, item)| (index, item.clone()))
    }

    /// Compensation putting `previous` back under `id`, or removing `id` when
    /// there was no previous entity.
    fn restore(&self, id: String, previous: Option<(usize, E)>) -> Compensation {
        let inner = self.inner.clone();
        Compensation::new(move || {
            inner.state.send_modify(|state| match previous {
                Some((index, entity)) => {
                    match state.items.iter_mut().find(|item| item.id() == id) {
                        Some(slot) => *slot = entity,
                        None => {
                            let index = index.min(state.items.len());
                            state.items.insert(index, entity);
                        }
                    }
                }
                None => state.items.retain(|item| item.id() != id),
            });
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Optimistic mutators with a remote commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds `entity` locally, then awaits `commit`. The confirmed entity
    /// returned by the remote side replaces the optimistic one.
    pub async fn commit_add<F, Fut>(&self, entity: E, commit: F) -> Optimistic<E>
    where
        F: FnOnce(E) -> Fut,
        Fut: Future<Output = Result<E>>,
    {
        let id = entity.id().to_string();
        let previous = self.position_of(&id);
        self.add(entity.clone());

        match commit(entity.clone()).await {
            Ok(confirmed) => {
                if confirmed.id() != id {
                    self.remove(&id);
                }
                self.add(confirmed.clone());
                Optimistic::Applied(confirmed)
            }
            Err(reason) => {
                warn!("[{}] remote add of '{}' rejected: {}", self.name(), id, reason);
                Optimistic::Rejected {
                    attempted: entity,
                    compensation: self.restore(id, previous),
                    reason,
                }
            }
        }
    }

    /// Patches the entity locally, then awaits `commit` with the patched
    /// entity. Returns `None` when `id` is not in the store.
    pub async fn commit_update<F, Fut>(
        &self,
        id: &str,
        patch: E::Patch,
        commit: F,
    ) -> Option<Optimistic<E>>
    where
        F: FnOnce(E) -> Fut,
        Fut: Future<Output = Result<E>>,
    {
        let previous = self.position_of(id)?;
        self.update(id, patch);
        let patched = self.get_by_id(id)?;

        Some(match commit(patched.clone()).await {
            Ok(confirmed) => {
                self.add(confirmed.clone());
                Optimistic::Applied(confirmed)
            }
            Err(reason) => {
                warn!("[{}] remote update of '{}' rejected: {}", self.name(), id, reason);
                Optimistic::Rejected {
                    attempted: patched,
                    compensation: self.restore(id.to_string(), Some(previous)),
                    reason,
                }
            }
        })
    }

    /// Removes the entity locally, then awaits `commit` with the removed
    /// entity. Returns `None` when `id` is not in the store.
    pub async fn commit_remove<F, Fut>(&self, id: &str, commit: F) -> Option<Optimistic<E>>
    where
        F: FnOnce(E) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let previous = self.position_of(id)?;
        let removed = previous.1.clone();
        self.remove(id);

        Some(match commit(removed.clone()).await {
            Ok(()) => Optimistic::Applied(removed),
            Err(reason) => {
                warn!("[{}] remote removal of '{}' rejected: {}", self.name(), id, reason);
                Optimistic::Rejected {
                    attempted: removed,
                    compensation: self.restore(id.to_string(), Some(previous)),
                    reason,
                }
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────

    /// Replaces the local collection with the remote one.
    ///
    /// Without a session the store is emptied. On failure the collection is
    /// left untouched and the error message is recorded.
    pub async fn refresh(&self) {
        if !self.inner.session.is_active() {
            self.clear();
            return;
        }

        let (seq, generation) = {
            let mut ledger = lock(&self.inner.ledger);
            ledger.issued += 1;
            ledger.in_flight += 1;
            (ledger.issued, ledger.generation)
        };
        self.inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        debug!("[{}] refresh #{} started", self.name(), seq);

        let result = self.fetch().await;
        self.settle(seq, generation, result);
    }

    async fn fetch(&self) -> Result<Option<Vec<E>>> {
        let Some(token) = self.inner.session.id_token().await? else {
            return Ok(None);
        };
        self.inner.source.fetch_all(&token).await.map(Some)
    }

    fn settle(&self, seq: u64, generation: u64, result: Result<Option<Vec<E>>>) {
        let name = self.name();
        let session_active = self.inner.session.is_active();
        let mut ledger = lock(&self.inner.ledger);
        ledger.in_flight = ledger.in_flight.saturating_sub(1);
        let loading = ledger.in_flight > 0;

        let superseded = self.inner.config.refresh_ordering == RefreshOrdering::LatestIssuedWins
            && seq < ledger.settled;
        if ledger.generation != generation || !session_active || superseded {
            debug!("[{}] refresh #{} discarded", name, seq);
            drop(ledger);
            self.inner.state.send_modify(|state| state.loading = loading);
            return;
        }

        match result {
            Ok(Some(items)) => {
                ledger.settled = seq;
                ledger.last_success = Some(Instant::now());
                drop(ledger);
                info!("[{}] refresh #{} loaded {} item(s)", name, seq, items.len());
                self.inner.state.send_modify(|state| {
                    state.items = items;
                    state.loading = loading;
                    state.error = None;
                    state.last_refreshed = Some(Utc::now());
                });
            }
            Ok(None) => {
                drop(ledger);
                debug!("[{}] refresh #{} skipped: no token", name, seq);
                self.inner.state.send_modify(|state| state.loading = loading);
            }
            Err(err) => {
                ledger.settled = seq;
                drop(ledger);
                error!("[{}] refresh #{} failed: {}", name, seq, err);
                let message = match err {
                    Error::Remote(message) => message,
                    other => other.to_string(),
                };
                self.inner.state.send_modify(|state| {
                    state.loading = loading;
                    state.error = Some(message);
                });
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Background sync
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts the background task keeping this store in step with the
    /// session: refresh on sign-in, clear on sign-out, and refresh once per
    /// check interval when the data is stale.
    ///
    /// The task stops when the returned handle is dropped or the store is
    /// dropped.
    pub fn spawn_sync(&self) -> SyncHandle {
        let weak = Arc::downgrade(&self.inner);
        let mut session_rx = self.inner.session.subscribe();
        let period = self.inner.config.refresh_check_interval();
        let name = self.name();

        let task = ScheduledTask::spawn(async move {
            info!("[{}] background sync started", name);
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut current_uid = session_rx.borrow_and_update().as_ref().map(|u| u.uid.clone());
            if current_uid.is_some() {
                match upgrade(&weak) {
                    Some(store) => store.refresh().await,
                    None => return,
                }
            }

            loop {
                tokio::select! {
                    changed = session_rx.changed() => {
                        if changed.is_err() {
                            debug!("[{}] session provider dropped", name);
                            break;
                        }
                        let uid = session_rx.borrow_and_update().as_ref().map(|u| u.uid.clone());
                        let Some(store) = upgrade(&weak) else { break };
                        match &uid {
                            Some(_) => {
                                if current_uid.is_some() && current_uid != uid {
                                    store.clear();
                                }
                                store.refresh().await;
                            }
                            None => store.clear(),
                        }
                        current_uid = uid;
                    }
                    _ = ticker.tick() => {
                        let Some(store) = upgrade(&weak) else { break };
                        if store.needs_refresh() {
                            debug!("[{}] data is stale, refreshing", name);
                            store.refresh().await;
                        }
                    }
                }
            }
            info!("[{}] background sync stopped", name);
        });

        SyncHandle { task }
    }
}

fn upgrade<E: SyncedEntity>(weak: &Weak<StoreInner<E>>) -> Option<EntitySyncStore<E>> {
    weak.upgrade().map(EntitySyncStore::from_inner)
}

fn upsert<E: SyncedEntity>(items: &mut Vec<E>, entity: E) {
    match items.iter_mut().find(|item| item.id() == entity.id()) {
        Some(slot) => *slot = entity,
        None => items.insert(0, entity),
    }
}

/// Handle of a store's background sync task; stops the task on drop.
#[derive(Debug)]
pub struct SyncHandle {
    task: ScheduledTask,
}

impl SyncHandle {
    pub fn stop(mut self) {
        self.task.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
