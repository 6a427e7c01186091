//! Opportunity listing model.

use serde::{Deserialize, Serialize};

use crate::store::SyncedEntity;

/// Kind of opportunity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityType {
    #[default]
    Research,
    YouthProgram,
    Community,
    Competition,
    #[serde(other)]
    Other,
}

/// Publication state of a listing authored by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SocialMediaLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
}

/// An opportunity listing.
///
/// Listings returned by the search index carry `objectID` instead of (or in
/// addition to) the document `id`; either one identifies the listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpportunityListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "objectID", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub opportunity_type: OpportunityType,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time as sent by the server (timestamp object or string).
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<SocialMediaLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_indefinite_deadline: Option<bool>,
}

impl OpportunityListing {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Listing as returned by the search index, identified only by `objectID`.
    pub fn from_index(object_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == Some(ListingStatus::Published)
    }
}

/// Partial update of a listing; `Some` fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpportunityUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ListingStatus>,
    pub category: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub organization: Option<String>,
    pub url: Option<String>,
}

impl SyncedEntity for OpportunityListing {
    type Patch = OpportunityUpdate;

    fn id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.object_id.as_deref())
            .unwrap_or_default()
    }

    fn foreign_key(&self) -> Option<&str> {
        self.created_by_uid.as_deref()
    }

    fn matches(&self, id: &str) -> bool {
        !id.is_empty()
            && (self.id.as_deref() == Some(id) || self.object_id.as_deref() == Some(id))
    }

    fn apply_patch(&mut self, patch: OpportunityUpdate) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(organization) = patch.organization {
            self.organization = organization;
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_falls_back_to_object_id() {
        let indexed = OpportunityListing::from_index("algolia-9", "Hackathon");
        assert_eq!(indexed.id(), "algolia-9");
        assert!(indexed.matches("algolia-9"));
        assert!(!indexed.matches(""));

        let mut both = OpportunityListing::new("doc-1", "Hackathon");
        both.object_id = Some("algolia-9".into());
        assert_eq!(both.id(), "doc-1");
        assert!(both.matches("doc-1"));
        assert!(both.matches("algolia-9"));
    }

    #[test]
    fn test_deserializes_listing_with_unknown_type() {
        let json = r#"{
            "id": "o1",
            "title": "Science Olympiad",
            "description": "National round",
            "type": "bootcamp",
            "category": ["STEM"],
            "organization": "BRIN",
            "tags": ["science"],
            "status": "published",
            "created_by_uid": "u1",
            "createdAt": {"_seconds": 1700000000, "_nanoseconds": 0}
        }"#;

        let listing: OpportunityListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.opportunity_type, OpportunityType::Other);
        assert!(listing.is_published());
        assert_eq!(listing.foreign_key(), Some("u1"));
        assert!(listing.created_at.is_some());
    }

    #[test]
    fn test_apply_patch_publishes_listing() {
        let mut listing = OpportunityListing::new("o1", "Draft title");
        listing.status = Some(ListingStatus::Draft);

        listing.apply_patch(OpportunityUpdate {
            status: Some(ListingStatus::Published),
            tags: Some(vec!["ai".into()]),
            ..Default::default()
        });

        assert!(listing.is_published());
        assert_eq!(listing.title, "Draft title");
        assert_eq!(listing.tags, vec!["ai".to_string()]);
    }
}
