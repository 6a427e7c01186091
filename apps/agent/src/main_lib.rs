use std::collections::BTreeMap;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use depanku_core::constants::OPPORTUNITY_DRAFT_KEY;
use depanku_core::drafts::{Autosave, JsonFileStore, KeyValueStore};
use depanku_core::forms::{calculate_form_progress, FormField, FormProgress};
use depanku_core::notifications::{Notification, NotificationCenter, Subscription};
use depanku_core::remote::RemoteCollectionApi;
use depanku_core::session::{LocalSession, SessionProvider, SessionUser};
use depanku_core::store::{StoreSnapshot, SyncHandle, SyncedEntity};
use depanku_core::{ApplicationStore, BookmarkSet, OpportunityStore};
use depanku_remote::DepankuClient;

use crate::config::AgentConfig;

pub fn init_tracing() {
    let log_format = std::env::var("DEPANKU_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Everything the agent keeps alive while running.
pub struct AgentState {
    pub session: Arc<LocalSession>,
    pub notifications: NotificationCenter,
    pub applications: ApplicationStore,
    pub opportunities: OpportunityStore,
    pub bookmarks: BookmarkSet,
    pub draft: Autosave<serde_json::Value>,
    _notification_log: Subscription,
}

pub fn build_state(config: &AgentConfig) -> anyhow::Result<AgentState> {
    let session = Arc::new(match (&config.user_id, &config.id_token) {
        (Some(uid), Some(token)) => LocalSession::signed_in(SessionUser::new(uid.clone()), token.clone()),
        _ => {
            tracing::warn!("No DEPANKU_ID_TOKEN configured; running signed out");
            LocalSession::new()
        }
    });
    let client = DepankuClient::new(&config.api_url, config.request_timeout)?;
    tracing::info!("Using API at {}", client.base_url());
    let api: Arc<dyn RemoteCollectionApi> = Arc::new(client);

    let notifications = NotificationCenter::with_default_duration(config.sync.notification_duration_ms);
    let notification_log = notifications.subscribe(log_notifications);

    let applications = ApplicationStore::for_applications(session.clone(), api.clone(), config.sync.clone());
    let opportunities = OpportunityStore::for_opportunities(session.clone(), api.clone(), config.sync.clone());
    let bookmarks = BookmarkSet::new(session.clone(), api, notifications.clone(), config.sync.clone());

    let drafts_path = config.drafts_path();
    tracing::info!("Drafts stored in {}", drafts_path.display());
    let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(drafts_path));
    let draft = Autosave::load(OPPORTUNITY_DRAFT_KEY, storage, &config.sync);

    Ok(AgentState {
        session,
        notifications,
        applications,
        opportunities,
        bookmarks,
        draft,
        _notification_log: notification_log,
    })
}

fn log_notifications(live: &[Notification]) {
    match live.last() {
        Some(latest) => tracing::info!(
            kind = ?latest.kind,
            live = live.len(),
            "Notification: {}: {}",
            latest.title,
            latest.message
        ),
        None => tracing::debug!("No live notifications"),
    }
}

/// Completion of the opportunity creation form held in a draft.
pub fn opportunity_draft_progress(draft: &serde_json::Value) -> FormProgress {
    let field = |name: &str, required: bool| {
        let value = draft.get(name).cloned().unwrap_or(serde_json::Value::Null);
        let field = if required {
            FormField::required(value)
        } else {
            FormField::optional(value)
        };
        (name.to_string(), field)
    };

    let fields: BTreeMap<String, FormField> = [
        field("title", true),
        field("description", true),
        field("type", true),
        field("organization", true),
        field("category", true),
        field("deadline", false),
        field("location", false),
        field("url", false),
    ]
    .into_iter()
    .collect();

    calculate_form_progress(&fields)
}

/// Reports a restorable opportunity draft, if the last session left one.
pub fn report_draft(state: &AgentState) {
    if !state.draft.show_restore_prompt() {
        return;
    }
    if let Some(draft) = state.draft.saved_data() {
        let progress = opportunity_draft_progress(&draft);
        tracing::info!(
            saved_at = ?state.draft.last_saved(),
            "Unsaved opportunity draft found ({}% complete, {}/{} required fields)",
            progress.progress,
            progress.completed,
            progress.total
        );
    }
}

/// Logs every snapshot change of a store until the store is dropped.
pub fn spawn_snapshot_logger<E: SyncedEntity>(
    name: &'static str,
    mut rx: tokio::sync::watch::Receiver<StoreSnapshot<E>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            match &snapshot.error {
                Some(error) => tracing::warn!(store = name, "Refresh failed: {}", error),
                None if !snapshot.loading => {
                    tracing::info!(store = name, items = snapshot.items.len(), "Store updated")
                }
                None => {}
            }
        }
    })
}

/// Starts background sync of every store.
pub fn start_sync(state: &AgentState) -> Vec<SyncHandle> {
    if !state.session.is_active() {
        tracing::info!("Stores will populate once a session is available");
    }
    vec![
        state.applications.spawn_sync(),
        state.opportunities.spawn_sync(),
        state.bookmarks.spawn_sync(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_opportunity_draft_progress() {
        let draft = json!({
            "title": "Robotics camp",
            "description": "",
            "type": "youth-program",
            "organization": "Depanku",
            "category": [],
            "url": "https://example.org"
        });
        let progress = opportunity_draft_progress(&draft);
        assert_eq!(progress.total, 5);
        assert_eq!(progress.completed, 3);
        assert_eq!(progress.progress, 60);
    }

    #[tokio::test]
    async fn test_build_state_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::from_lookup(|name| match name {
            "DEPANKU_DATA_DIR" => Some(dir.path().display().to_string()),
            _ => None,
        })
        .unwrap();

        let state = build_state(&config).unwrap();
        assert!(!state.session.is_active());
        assert!(!state.draft.show_restore_prompt());

        state.applications.refresh().await;
        assert!(state.applications.is_empty());
        assert!(state.applications.error().is_none());
    }
}
