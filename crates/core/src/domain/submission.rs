use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::estimate::EstimateBreakdown;
use crate::domain::tier::Tier;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(format!("sub_{}", Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Planner,
    Lead,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Lead => "lead",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "planner" => Some(Self::Planner),
            "lead" => Some(Self::Lead),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    Reviewing,
    Quoted,
    Accepted,
    Declined,
    Archived,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewing => "reviewing",
            Self::Quoted => "quoted",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "reviewing" => Some(Self::Reviewing),
            "quoted" => Some(Self::Quoted),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Reviewing)
                | (Self::New, Self::Accepted)
                | (Self::New, Self::Declined)
                | (Self::Reviewing, Self::Quoted)
                | (Self::Reviewing, Self::Declined)
                | (Self::Quoted, Self::Accepted)
                | (Self::Quoted, Self::Declined)
                | (Self::Declined, Self::Reviewing)
                | (Self::New, Self::Archived)
                | (Self::Reviewing, Self::Archived)
                | (Self::Quoted, Self::Archived)
                | (Self::Accepted, Self::Archived)
                | (Self::Declined, Self::Archived)
        )
    }

    pub fn transition_to(self, next: SubmissionStatus) -> Result<SubmissionStatus, DomainError> {
        if self.can_transition_to(next) {
            return Ok(next);
        }

        Err(DomainError::InvalidStatusTransition { from: self, to: next })
    }
}

/// Payload handed to the document store. The store keeps it verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDocument {
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    pub tier: Tier,
    pub contact_name: String,
    pub contact_email: String,
    pub payload: serde_json::Value,
    pub estimate: Option<EstimateBreakdown>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSubmission {
    pub id: SubmissionId,
    pub document: SubmissionDocument,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{SubmissionId, SubmissionKind, SubmissionStatus};
    use crate::errors::DomainError;

    #[test]
    fn accepts_direct_acceptance_of_new_estimate() {
        let next = SubmissionStatus::New
            .transition_to(SubmissionStatus::Accepted)
            .expect("new -> accepted");
        assert_eq!(next, SubmissionStatus::Accepted);
    }

    #[test]
    fn blocks_reaccepting_an_archived_submission() {
        let error = SubmissionStatus::Archived
            .transition_to(SubmissionStatus::Accepted)
            .expect_err("archived -> accepted should fail");
        assert!(matches!(
            error,
            DomainError::InvalidStatusTransition {
                from: SubmissionStatus::Archived,
                to: SubmissionStatus::Accepted
            }
        ));
    }

    #[test]
    fn declined_submissions_can_be_reopened() {
        let status = SubmissionStatus::Declined
            .transition_to(SubmissionStatus::Reviewing)
            .and_then(|status| status.transition_to(SubmissionStatus::Quoted))
            .and_then(|status| status.transition_to(SubmissionStatus::Accepted))
            .expect("declined -> reviewing -> quoted -> accepted");
        assert_eq!(status, SubmissionStatus::Accepted);
    }

    #[test]
    fn status_and_kind_strings_parse_back() {
        for status in [
            SubmissionStatus::New,
            SubmissionStatus::Reviewing,
            SubmissionStatus::Quoted,
            SubmissionStatus::Accepted,
            SubmissionStatus::Declined,
            SubmissionStatus::Archived,
        ] {
            assert_eq!(SubmissionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubmissionKind::parse("lead"), Some(SubmissionKind::Lead));
        assert_eq!(SubmissionKind::parse("quote"), None);
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = SubmissionId::generate();
        let second = SubmissionId::generate();
        assert!(first.0.starts_with("sub_"));
        assert_eq!(first.0.len(), 36);
        assert_ne!(first, second);
    }
}
