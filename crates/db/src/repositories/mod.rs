use async_trait::async_trait;
use thiserror::Error;

use studioplan_core::domain::submission::{
    StoredSubmission, SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
};

pub mod memory;
pub mod submission;

pub use memory::InMemorySubmissionStore;
pub use submission::SqlSubmissionStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("submission `{0}` was not found")]
    NotFound(SubmissionId),
    #[error("submission `{id}` is no longer `{}`", .expected.as_str())]
    StatusChanged { id: SubmissionId, expected: SubmissionStatus },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionQuery {
    ById(SubmissionId),
    /// Newest submission of `kind` for a contact email, compared case-insensitively.
    LatestFor { kind: SubmissionKind, email: String },
}

/// Document store for planner and lead submissions.
///
/// Payloads are stored verbatim. Transition rules live in the domain; the store only
/// guarantees a status update lands on the status the caller last read.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create(&self, document: SubmissionDocument) -> Result<SubmissionId, RepositoryError>;

    async fn patch_status(
        &self,
        id: &SubmissionId,
        expected: SubmissionStatus,
        status: SubmissionStatus,
    ) -> Result<StoredSubmission, RepositoryError>;

    async fn fetch_one(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Option<StoredSubmission>, RepositoryError>;
}
