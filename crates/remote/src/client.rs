//! HTTP client for the Depanku collection API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;

use depanku_core::models::{ApplicationSubmission, OpportunityListing};
use depanku_core::remote::RemoteCollectionApi;

use crate::error::{RemoteError, Result};
use crate::types::ApiEnvelope;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Depanku REST API.
#[derive(Debug, Clone)]
pub struct DepankuClient {
    client: reqwest::Client,
    base_url: String,
}

impl DepankuClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the API (e.g., "https://api.depanku.id")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::invalid_request(format!(
                "API URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| RemoteError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bookmark_url(&self, opportunity_id: &str) -> Result<String> {
        if opportunity_id.trim().is_empty() {
            return Err(RemoteError::invalid_request("opportunity id is empty"));
        }
        Ok(self.url(&format!(
            "/api/bookmarks/{}",
            urlencoding::encode(opportunity_id)
        )))
    }

    async fn send(&self, method: Method, url: &str, token: &str) -> Result<(u16, String)> {
        debug!("{} {}", method, url);
        let response = self
            .client
            .request(method, url)
            .headers(self.headers(token)?)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        failure: &str,
    ) -> Result<Vec<T>> {
        let (status, body) = self.send(Method::GET, &self.url(path), token).await?;
        parse_list(status, &body, failure)
    }

    async fn write(&self, method: Method, url: &str, token: &str, failure: &str) -> Result<()> {
        let (status, body) = self.send(method, url, token).await?;
        check_status(status, &body, failure)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile collections
    // ─────────────────────────────────────────────────────────────────────────

    /// GET /api/profile/applications
    pub async fn get_my_applications(&self, token: &str) -> Result<Vec<ApplicationSubmission>> {
        self.fetch_list("/api/profile/applications", token, "Failed to fetch applications")
            .await
    }

    /// GET /api/profile/opportunities
    pub async fn get_my_opportunities(&self, token: &str) -> Result<Vec<OpportunityListing>> {
        self.fetch_list("/api/profile/opportunities", token, "Failed to fetch opportunities")
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookmarks
    // ─────────────────────────────────────────────────────────────────────────

    /// GET /api/bookmarks
    pub async fn get_bookmarks(&self, token: &str) -> Result<Vec<OpportunityListing>> {
        self.fetch_list("/api/bookmarks", token, "Failed to fetch bookmarks")
            .await
    }

    /// POST /api/bookmarks/{opportunityId}
    pub async fn add_bookmark(&self, opportunity_id: &str, token: &str) -> Result<()> {
        let url = self.bookmark_url(opportunity_id)?;
        self.write(Method::POST, &url, token, "Failed to add bookmark")
            .await
    }

    /// DELETE /api/bookmarks/{opportunityId}
    pub async fn remove_bookmark(&self, opportunity_id: &str, token: &str) -> Result<()> {
        let url = self.bookmark_url(opportunity_id)?;
        self.write(Method::DELETE, &url, token, "Failed to remove bookmark")
            .await
    }
}

#[async_trait]
impl RemoteCollectionApi for DepankuClient {
    async fn fetch_my_applications(
        &self,
        token: &str,
    ) -> depanku_core::Result<Vec<ApplicationSubmission>> {
        Ok(self.get_my_applications(token).await?)
    }

    async fn fetch_my_opportunities(
        &self,
        token: &str,
    ) -> depanku_core::Result<Vec<OpportunityListing>> {
        Ok(self.get_my_opportunities(token).await?)
    }

    async fn fetch_bookmarks(&self, token: &str) -> depanku_core::Result<Vec<OpportunityListing>> {
        Ok(self.get_bookmarks(token).await?)
    }

    async fn add_bookmark(&self, opportunity_id: &str, token: &str) -> depanku_core::Result<()> {
        Ok(DepankuClient::add_bookmark(self, opportunity_id, token).await?)
    }

    async fn remove_bookmark(&self, opportunity_id: &str, token: &str) -> depanku_core::Result<()> {
        Ok(DepankuClient::remove_bookmark(self, opportunity_id, token).await?)
    }
}

/// Maps a non-2xx status to an API error carrying `failure` and the server
/// reason when the body has one.
fn check_status(status: u16, body: &str, failure: &str) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let reason = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.reason().map(str::to_string));
    let message = match reason {
        Some(reason) => format!("{}: {}", failure, reason),
        None => failure.to_string(),
    };
    Err(RemoteError::api(status, message))
}

/// Decodes a list endpoint body. A missing or null `data` is an empty list.
fn parse_list<T: DeserializeOwned>(status: u16, body: &str, failure: &str) -> Result<Vec<T>> {
    check_status(status, body, failure)?;

    let envelope: ApiEnvelope<Vec<T>> = serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to deserialize response. Body: {}, Error: {}", body, e);
        RemoteError::api(status, format!("{}: unreadable response", failure))
    })?;
    if !envelope.success {
        let message = match envelope.reason() {
            Some(reason) => format!("{}: {}", failure, reason),
            None => failure.to_string(),
        };
        return Err(RemoteError::api(status, message));
    }
    Ok(envelope.data.unwrap_or_default())
}
