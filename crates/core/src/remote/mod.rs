//! Remote collection API contract.
//!
//! The wire format belongs to the adapter (`depanku-remote`); stores only see
//! full collection snapshots or an error.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{ApplicationSubmission, OpportunityListing};

/// Client for the remote collections owned by the server.
#[async_trait]
pub trait RemoteCollectionApi: Send + Sync {
    /// Applications submitted by the token's user.
    async fn fetch_my_applications(&self, token: &str) -> Result<Vec<ApplicationSubmission>>;

    /// Listings authored by the token's user, drafts included.
    async fn fetch_my_opportunities(&self, token: &str) -> Result<Vec<OpportunityListing>>;

    /// Listings bookmarked by the token's user.
    async fn fetch_bookmarks(&self, token: &str) -> Result<Vec<OpportunityListing>>;

    async fn add_bookmark(&self, opportunity_id: &str, token: &str) -> Result<()>;

    async fn remove_bookmark(&self, opportunity_id: &str, token: &str) -> Result<()>;
}

/// Fetches the full remote collection backing one store.
#[async_trait]
pub trait CollectionSource<E>: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn fetch_all(&self, token: &str) -> Result<Vec<E>>;
}

/// The user's submitted applications.
pub struct MyApplications(pub Arc<dyn RemoteCollectionApi>);

#[async_trait]
impl CollectionSource<ApplicationSubmission> for MyApplications {
    fn name(&self) -> &'static str {
        "applications"
    }

    async fn fetch_all(&self, token: &str) -> Result<Vec<ApplicationSubmission>> {
        self.0.fetch_my_applications(token).await
    }
}

/// The user's authored listings.
pub struct MyOpportunities(pub Arc<dyn RemoteCollectionApi>);

#[async_trait]
impl CollectionSource<OpportunityListing> for MyOpportunities {
    fn name(&self) -> &'static str {
        "opportunities"
    }

    async fn fetch_all(&self, token: &str) -> Result<Vec<OpportunityListing>> {
        self.0.fetch_my_opportunities(token).await
    }
}

/// The user's bookmarked listings.
pub struct Bookmarks(pub Arc<dyn RemoteCollectionApi>);

#[async_trait]
impl CollectionSource<OpportunityListing> for Bookmarks {
    fn name(&self) -> &'static str {
        "bookmarks"
    }

    async fn fetch_all(&self, token: &str) -> Result<Vec<OpportunityListing>> {
        self.0.fetch_bookmarks(token).await
    }
}
