use chrono::Utc;
use tokio::sync::RwLock;

use studioplan_core::domain::submission::{
    StoredSubmission, SubmissionDocument, SubmissionId, SubmissionStatus,
};

use super::{RepositoryError, SubmissionQuery, SubmissionStore};

/// Insertion-ordered store; ties on `created_at` resolve to the later insert.
#[derive(Default)]
pub struct InMemorySubmissionStore {
    submissions: RwLock<Vec<StoredSubmission>>,
}

impl InMemorySubmissionStore {
    pub async fn len(&self) -> usize {
        self.submissions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.submissions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(&self, document: SubmissionDocument) -> Result<SubmissionId, RepositoryError> {
        let id = SubmissionId::generate();
        let updated_at = document.created_at;
        let mut submissions = self.submissions.write().await;
        submissions.push(StoredSubmission { id: id.clone(), document, updated_at });
        Ok(id)
    }

    async fn patch_status(
        &self,
        id: &SubmissionId,
        expected: SubmissionStatus,
        status: SubmissionStatus,
    ) -> Result<StoredSubmission, RepositoryError> {
        let mut submissions = self.submissions.write().await;
        let stored = submissions
            .iter_mut()
            .find(|stored| stored.id == *id)
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;
        if stored.document.status != expected {
            return Err(RepositoryError::StatusChanged { id: id.clone(), expected });
        }

        stored.document.status = status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn fetch_one(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Option<StoredSubmission>, RepositoryError> {
        let submissions = self.submissions.read().await;
        let found = match query {
            SubmissionQuery::ById(id) => submissions.iter().find(|stored| stored.id == *id),
            SubmissionQuery::LatestFor { kind, email } => submissions
                .iter()
                .filter(|stored| {
                    stored.document.kind == *kind
                        && stored.document.contact_email.eq_ignore_ascii_case(email.trim())
                })
                .max_by_key(|stored| stored.document.created_at),
        };
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use studioplan_core::domain::submission::{
        SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
    };
    use studioplan_core::domain::tier::Tier;

    use crate::repositories::{
        InMemorySubmissionStore, RepositoryError, SubmissionQuery, SubmissionStore,
    };

    fn document(kind: SubmissionKind, email: &str, minutes: i64) -> SubmissionDocument {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("timestamp")
            + Duration::minutes(minutes);
        SubmissionDocument {
            kind,
            status: SubmissionStatus::New,
            tier: Tier::Business,
            contact_name: "Farid".to_string(),
            contact_email: email.to_string(),
            payload: json!({ "minutes": minutes }),
            estimate: None,
            created_at,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_by_id() {
        let store = InMemorySubmissionStore::default();
        let id = store
            .create(document(SubmissionKind::Planner, "farid@example.com", 0))
            .await
            .expect("create");

        assert!(id.0.starts_with("sub_"));
        let stored = store
            .fetch_one(&SubmissionQuery::ById(id.clone()))
            .await
            .expect("fetch")
            .expect("stored submission");
        assert_eq!(stored.id, id);
        assert_eq!(stored.updated_at, stored.document.created_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn latest_for_contact_picks_newest_matching_kind() {
        let store = InMemorySubmissionStore::default();
        store.create(document(SubmissionKind::Planner, "farid@example.com", 0)).await.expect("a");
        let newest = store
            .create(document(SubmissionKind::Planner, "Farid@Example.com", 10))
            .await
            .expect("b");
        store.create(document(SubmissionKind::Lead, "farid@example.com", 20)).await.expect("c");

        let found = store
            .fetch_one(&SubmissionQuery::LatestFor {
                kind: SubmissionKind::Planner,
                email: "FARID@example.com".to_string(),
            })
            .await
            .expect("fetch")
            .expect("match");
        assert_eq!(found.id, newest);
    }

    #[tokio::test]
    async fn patch_status_updates_document_and_rejects_unknown_ids() {
        let store = InMemorySubmissionStore::default();
        let id = store
            .create(document(SubmissionKind::Planner, "farid@example.com", 0))
            .await
            .expect("create");

        let patched = store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Accepted)
            .await
            .expect("patch");
        assert_eq!(patched.document.status, SubmissionStatus::Accepted);
        assert!(patched.updated_at > patched.document.created_at);

        let missing = SubmissionId("sub_missing".to_string());
        let error = store
            .patch_status(&missing, SubmissionStatus::New, SubmissionStatus::Accepted)
            .await
            .expect_err("unknown id");
        assert!(matches!(error, RepositoryError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn patch_status_refuses_a_stale_expected_status() {
        let store = InMemorySubmissionStore::default();
        let id = store
            .create(document(SubmissionKind::Planner, "farid@example.com", 0))
            .await
            .expect("create");
        store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Archived)
            .await
            .expect("archive");

        let error = store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Accepted)
            .await
            .expect_err("stale status");
        assert!(matches!(
            error,
            RepositoryError::StatusChanged { expected: SubmissionStatus::New, .. }
        ));
        let stored = store
            .fetch_one(&SubmissionQuery::ById(id))
            .await
            .expect("fetch")
            .expect("stored submission");
        assert_eq!(stored.document.status, SubmissionStatus::Archived);
    }

    #[tokio::test]
    async fn fetch_returns_none_without_match() {
        let store = InMemorySubmissionStore::default();
        let found = store
            .fetch_one(&SubmissionQuery::LatestFor {
                kind: SubmissionKind::Lead,
                email: "nobody@example.com".to_string(),
            })
            .await
            .expect("fetch");
        assert!(found.is_none());
        assert!(store.is_empty().await);
    }
}
