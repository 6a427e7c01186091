use std::time::Duration;

/// How often the background sync task checks store staleness.
pub const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// A store is refreshed by the background task once its last successful
/// refresh is at least this old.
pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Default quiet period before an autosave write.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Drafts older than this are purged instead of offered for restore.
pub const DRAFT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Suffix of the storage entry holding a draft's capture time.
pub const DRAFT_TIMESTAMP_SUFFIX: &str = "-timestamp";

/// Default lifetime of a notification, in milliseconds.
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 5000;

/// Storage key of the opportunity creation form draft.
pub const OPPORTUNITY_DRAFT_KEY: &str = "opportunity-draft";
