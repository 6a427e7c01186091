use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};

use depanku_core::SyncConfig;

pub const DEFAULT_API_URL: &str = "https://api.depanku.id";

pub struct AgentConfig {
    pub api_url: String,
    /// Pre-issued bearer token; the agent runs signed out without one.
    pub id_token: Option<String>,
    pub user_id: Option<String>,
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub sync: SyncConfig,
}

impl AgentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = non_empty("DEPANKU_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let id_token = non_empty("DEPANKU_ID_TOKEN");
        let user_id = non_empty("DEPANKU_USER_ID");
        if id_token.is_some() != user_id.is_some() {
            bail!("DEPANKU_ID_TOKEN and DEPANKU_USER_ID must be set together");
        }

        let data_dir = non_empty("DEPANKU_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let timeout_ms: u64 = match non_empty("DEPANKU_REQUEST_TIMEOUT_MS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid DEPANKU_REQUEST_TIMEOUT_MS '{}'", raw))?,
            None => 30_000,
        };

        let mut sync = SyncConfig::default();
        if let Some(raw) = non_empty("DEPANKU_STALE_AFTER_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("Invalid DEPANKU_STALE_AFTER_SECS '{}'", raw))?;
            sync.stale_after_ms = secs
                .checked_mul(1000)
                .with_context(|| format!("DEPANKU_STALE_AFTER_SECS '{}' is too large", raw))?;
        }
        sync.validate()?;

        Ok(Self {
            api_url,
            id_token,
            user_id,
            data_dir,
            request_timeout: Duration::from_millis(timeout_ms),
            sync,
        })
    }

    pub fn drafts_path(&self) -> PathBuf {
        self.data_dir.join("drafts.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AgentConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.id_token.is_none());
        assert_eq!(config.drafts_path(), PathBuf::from("./data/drafts.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.sync.stale_after_ms, 300_000);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DEPANKU_API_URL", "http://localhost:5000"),
            ("DEPANKU_ID_TOKEN", "tok"),
            ("DEPANKU_USER_ID", "user-1"),
            ("DEPANKU_DATA_DIR", "/var/lib/depanku"),
            ("DEPANKU_REQUEST_TIMEOUT_MS", "1500"),
            ("DEPANKU_STALE_AFTER_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:5000");
        assert_eq!(config.user_id.as_deref(), Some("user-1"));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.sync.stale_after_ms, 60_000);
        assert_eq!(config.drafts_path(), PathBuf::from("/var/lib/depanku/drafts.json"));
    }

    #[test]
    fn test_token_requires_user() {
        assert!(config(&[("DEPANKU_ID_TOKEN", "tok")]).is_err());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config(&[("DEPANKU_REQUEST_TIMEOUT_MS", "soon")]).is_err());
        assert!(config(&[("DEPANKU_STALE_AFTER_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_stale_window_overflow_is_rejected() {
        let huge = (u64::MAX / 1000 + 1).to_string();
        assert!(config(&[("DEPANKU_STALE_AFTER_SECS", huge.as_str())]).is_err());
    }
}
