//! Tunables for the sync layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTOSAVE_DEBOUNCE, DEFAULT_NOTIFICATION_DURATION_MS, DRAFT_MAX_AGE, REFRESH_CHECK_INTERVAL,
    STALE_AFTER,
};
use crate::errors::{Error, Result};

/// Which refresh result wins when two refreshes overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RefreshOrdering {
    /// Responses to refreshes issued before the latest applied one are
    /// discarded.
    #[default]
    LatestIssuedWins,
    /// Whichever response resolves last is applied.
    LastResolvedWins,
}

/// Sync layer configuration.
///
/// Durations are stored in milliseconds so the struct round-trips through
/// JSON settings files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Interval between staleness checks of the background sync task (default: 60s)
    pub refresh_check_interval_ms: u64,

    /// Age of the last successful refresh that triggers a background refresh (default: 5min)
    pub stale_after_ms: u64,

    /// Overlapping refresh policy (default: latest issued wins)
    pub refresh_ordering: RefreshOrdering,

    /// Quiet period before an autosave write (default: 2000ms)
    pub autosave_debounce_ms: u64,

    /// Maximum age of a restorable draft (default: 24h)
    pub draft_max_age_ms: u64,

    /// Lifetime of notifications created without an explicit duration (default: 5000ms)
    pub notification_duration_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            refresh_check_interval_ms: REFRESH_CHECK_INTERVAL.as_millis() as u64,
            stale_after_ms: STALE_AFTER.as_millis() as u64,
            refresh_ordering: RefreshOrdering::default(),
            autosave_debounce_ms: AUTOSAVE_DEBOUNCE.as_millis() as u64,
            draft_max_age_ms: DRAFT_MAX_AGE.as_millis() as u64,
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
        }
    }
}

impl SyncConfig {
    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_check_interval_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }

    pub fn draft_max_age(&self) -> Duration {
        Duration::from_millis(self.draft_max_age_ms)
    }

    /// Rejects values that would spin the background task or disable expiry
    /// checks entirely.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_check_interval_ms == 0 {
            return Err(Error::Config(
                "refreshCheckIntervalMs must be greater than zero".into(),
            ));
        }
        if self.draft_max_age_ms == 0 {
            return Err(Error::Config("draftMaxAgeMs must be greater than zero".into()));
        }
        Ok(())
    }
}
