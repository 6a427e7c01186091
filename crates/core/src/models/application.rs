//! Application submission model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::SyncedEntity;

/// Review state of a submitted application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

/// An application the signed-in user submitted to an opportunity.
///
/// The listing fields (`title`, `organization`, ...) are denormalized by the
/// server so the application list renders without fetching each opportunity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub id: String,
    #[serde(alias = "opportunity_id")]
    pub opportunity_id: String,
    #[serde(alias = "user_id", default)]
    pub applicant_id: String,
    #[serde(alias = "user_email", default)]
    pub applicant_email: String,
    #[serde(default)]
    pub applicant_name: String,
    #[serde(default)]
    pub responses: Vec<serde_json::Value>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(alias = "submitted_at")]
    pub submitted_at: DateTime<Utc>,
    #[serde(alias = "reviewed_at", skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(alias = "opportunity_title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub opportunity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ApplicationSubmission {
    /// Creates a pending application with only identity fields populated.
    pub fn new(
        id: impl Into<String>,
        opportunity_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            opportunity_id: opportunity_id.into(),
            applicant_id: String::new(),
            applicant_email: String::new(),
            applicant_name: String::new(),
            responses: Vec::new(),
            status: ApplicationStatus::Pending,
            submitted_at,
            reviewed_at: None,
            notes: None,
            title: None,
            organization: None,
            opportunity_type: None,
            location: None,
            deadline: None,
            url: None,
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update of an application; `Some` fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub status: Option<ApplicationStatus>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub responses: Option<Vec<serde_json::Value>>,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub deadline: Option<String>,
    pub url: Option<String>,
}

impl SyncedEntity for ApplicationSubmission {
    type Patch = ApplicationUpdate;

    fn id(&self) -> &str {
        &self.id
    }

    fn foreign_key(&self) -> Option<&str> {
        Some(&self.opportunity_id)
    }

    fn apply_patch(&mut self, patch: ApplicationUpdate) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(reviewed_at) = patch.reviewed_at {
            self.reviewed_at = Some(reviewed_at);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(responses) = patch.responses {
            self.responses = responses;
        }
        if let Some(title) = patch.title {
            self.title = Some(title);
        }
        if let Some(organization) = patch.organization {
            self.organization = Some(organization);
        }
        if let Some(location) = patch.location {
            self.location = Some(location);
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserializes_server_snake_case_payload() {
        let json = r#"{
            "id": "opp1_user1",
            "opportunity_id": "opp1",
            "user_id": "user1",
            "user_email": "a@b.id",
            "responses": [{"question": "Why?", "answer": "Because"}],
            "status": "reviewed",
            "submitted_at": "2025-03-01T10:00:00Z",
            "opportunity_title": "Research Camp",
            "type": "research"
        }"#;

        let app: ApplicationSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(app.opportunity_id, "opp1");
        assert_eq!(app.applicant_id, "user1");
        assert_eq!(app.status, ApplicationStatus::Reviewed);
        assert_eq!(app.title.as_deref(), Some("Research Camp"));
        assert_eq!(app.opportunity_type.as_deref(), Some("research"));
        assert_eq!(app.responses.len(), 1);
    }

    #[test]
    fn test_apply_patch_merges_only_present_fields() {
        let submitted = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let mut app = ApplicationSubmission::new("a1", "opp1", submitted);
        app.notes = Some("first".into());
        app.location = Some("Jakarta".into());

        app.apply_patch(ApplicationUpdate {
            status: Some(ApplicationStatus::Accepted),
            notes: Some("great fit".into()),
            ..Default::default()
        });

        assert_eq!(app.status, ApplicationStatus::Accepted);
        assert_eq!(app.notes.as_deref(), Some("great fit"));
        assert_eq!(app.location.as_deref(), Some("Jakarta"));
        assert_eq!(app.submitted_at, submitted);
    }
}
