use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use studioplan_core::domain::estimate::EstimateBreakdown;
use studioplan_core::domain::submission::{
    StoredSubmission, SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
};
use studioplan_core::domain::tier::Tier;

use super::{RepositoryError, SubmissionQuery, SubmissionStore};
use crate::DbPool;

const SELECT_BY_ID: &str = "SELECT id, kind, status, tier, contact_name, contact_email,
        payload, estimate, created_at, updated_at
 FROM submission WHERE id = ?";

const SELECT_LATEST_FOR_CONTACT: &str =
    "SELECT id, kind, status, tier, contact_name, contact_email,
        payload, estimate, created_at, updated_at
 FROM submission WHERE kind = ? AND contact_email = ?
 ORDER BY created_at DESC, rowid DESC LIMIT 1";

pub struct SqlSubmissionStore {
    pool: DbPool,
}

impl SqlSubmissionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Fixed-width timestamps so `ORDER BY created_at` sorts chronologically.
fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn decode_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(e.to_string())
}

fn row_to_submission(row: &sqlx::sqlite::SqliteRow) -> Result<StoredSubmission, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let kind_str: String = row.try_get("kind").map_err(decode_err)?;
    let status_str: String = row.try_get("status").map_err(decode_err)?;
    let tier_str: String = row.try_get("tier").map_err(decode_err)?;
    let contact_name: String = row.try_get("contact_name").map_err(decode_err)?;
    let contact_email: String = row.try_get("contact_email").map_err(decode_err)?;
    let payload_json: String = row.try_get("payload").map_err(decode_err)?;
    let estimate_json: Option<String> = row.try_get("estimate").map_err(decode_err)?;
    let created_at_str: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at_str: String = row.try_get("updated_at").map_err(decode_err)?;

    let kind = SubmissionKind::parse(&kind_str)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown submission kind `{kind_str}`")))?;
    let status = SubmissionStatus::parse(&status_str).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown submission status `{status_str}`"))
    })?;
    let tier = tier_str.parse::<Tier>().map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload = serde_json::from_str(&payload_json)
        .map_err(|e| RepositoryError::Decode(format!("payload: {e}")))?;
    let estimate = estimate_json
        .map(|raw| serde_json::from_str::<EstimateBreakdown>(&raw))
        .transpose()
        .map_err(|e| RepositoryError::Decode(format!("estimate: {e}")))?;

    Ok(StoredSubmission {
        id: SubmissionId(id),
        document: SubmissionDocument {
            kind,
            status,
            tier,
            contact_name,
            contact_email,
            payload,
            estimate,
            created_at: parse_timestamp("created_at", &created_at_str)?,
        },
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

#[async_trait::async_trait]
impl SubmissionStore for SqlSubmissionStore {
    async fn create(&self, document: SubmissionDocument) -> Result<SubmissionId, RepositoryError> {
        let id = SubmissionId::generate();
        let payload = serde_json::to_string(&document.payload)
            .map_err(|e| RepositoryError::Decode(format!("payload: {e}")))?;
        let estimate = document
            .estimate
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Decode(format!("estimate: {e}")))?;
        let created_at = timestamp(document.created_at);

        sqlx::query(
            "INSERT INTO submission (id, kind, status, tier, contact_name, contact_email,
                                     payload, estimate, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id.0)
        .bind(document.kind.as_str())
        .bind(document.status.as_str())
        .bind(document.tier.as_str())
        .bind(&document.contact_name)
        .bind(document.contact_email.trim().to_ascii_lowercase())
        .bind(&payload)
        .bind(&estimate)
        .bind(&created_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn patch_status(
        &self,
        id: &SubmissionId,
        expected: SubmissionStatus,
        status: SubmissionStatus,
    ) -> Result<StoredSubmission, RepositoryError> {
        let result = sqlx::query(
            "UPDATE submission SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(status.as_str())
        .bind(timestamp(Utc::now()))
        .bind(&id.0)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch_one(&SubmissionQuery::ById(id.clone())).await? {
                Some(_) => Err(RepositoryError::StatusChanged { id: id.clone(), expected }),
                None => Err(RepositoryError::NotFound(id.clone())),
            };
        }

        self.fetch_one(&SubmissionQuery::ById(id.clone()))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }

    async fn fetch_one(
        &self,
        query: &SubmissionQuery,
    ) -> Result<Option<StoredSubmission>, RepositoryError> {
        let row = match query {
            SubmissionQuery::ById(id) => {
                sqlx::query(SELECT_BY_ID).bind(&id.0).fetch_optional(&self.pool).await?
            }
            SubmissionQuery::LatestFor { kind, email } => {
                sqlx::query(SELECT_LATEST_FOR_CONTACT)
                    .bind(kind.as_str())
                    .bind(email.trim().to_ascii_lowercase())
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        match row {
            Some(ref r) => Ok(Some(row_to_submission(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use studioplan_core::domain::answers::PlannerAnswers;
    use studioplan_core::domain::submission::{
        SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
    };
    use studioplan_core::planner::catalog::Catalog;
    use studioplan_core::planner::estimator::estimate;

    use super::SqlSubmissionStore;
    use crate::migrations::run_pending;
    use crate::repositories::{RepositoryError, SubmissionQuery, SubmissionStore};
    use crate::{connect_with_settings, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");
        pool
    }

    fn document(kind: SubmissionKind, email: &str, minutes: i64) -> SubmissionDocument {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("timestamp")
            + Duration::minutes(minutes);
        let answers = PlannerAnswers::default();
        SubmissionDocument {
            kind,
            status: SubmissionStatus::New,
            tier: studioplan_core::domain::tier::Tier::Landing,
            contact_name: "Siti".to_string(),
            contact_email: email.to_string(),
            payload: json!({ "answers": answers }),
            estimate: Some(estimate(&Catalog::standard(), &answers, created_at)),
            created_at,
        }
    }

    #[tokio::test]
    async fn sql_store_round_trips_document_with_estimate() {
        let store = SqlSubmissionStore::new(setup().await);
        let original = document(SubmissionKind::Planner, "siti@example.com", 0);
        let id = store.create(original.clone()).await.expect("create");

        let stored = store
            .fetch_one(&SubmissionQuery::ById(id.clone()))
            .await
            .expect("fetch")
            .expect("stored submission");

        assert_eq!(stored.id, id);
        assert_eq!(stored.document.payload, original.payload);
        assert_eq!(stored.document.estimate, original.estimate);
        assert_eq!(stored.document.created_at, original.created_at);
        assert_eq!(stored.document.status, SubmissionStatus::New);
    }

    #[tokio::test]
    async fn sql_store_finds_latest_submission_for_contact() {
        let store = SqlSubmissionStore::new(setup().await);
        store.create(document(SubmissionKind::Planner, "siti@example.com", 0)).await.expect("a");
        let newest = store
            .create(document(SubmissionKind::Planner, "Siti@Example.com", 30))
            .await
            .expect("b");
        store.create(document(SubmissionKind::Lead, "siti@example.com", 60)).await.expect("c");

        let found = store
            .fetch_one(&SubmissionQuery::LatestFor {
                kind: SubmissionKind::Planner,
                email: "SITI@example.com ".to_string(),
            })
            .await
            .expect("fetch")
            .expect("match");
        assert_eq!(found.id, newest);
    }

    #[tokio::test]
    async fn sql_store_patches_status() {
        let store = SqlSubmissionStore::new(setup().await);
        let id = store
            .create(document(SubmissionKind::Planner, "siti@example.com", 0))
            .await
            .expect("create");

        let patched = store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Reviewing)
            .await
            .expect("patch");
        assert_eq!(patched.document.status, SubmissionStatus::Reviewing);
        assert!(patched.updated_at > patched.document.created_at);

        let error = store
            .patch_status(
                &SubmissionId("sub_unknown".to_string()),
                SubmissionStatus::New,
                SubmissionStatus::Accepted,
            )
            .await
            .expect_err("unknown id");
        assert!(matches!(error, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn sql_store_only_updates_rows_still_in_the_expected_status() {
        let store = SqlSubmissionStore::new(setup().await);
        let id = store
            .create(document(SubmissionKind::Planner, "siti@example.com", 0))
            .await
            .expect("create");

        store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Accepted)
            .await
            .expect("first accept");
        let error = store
            .patch_status(&id, SubmissionStatus::New, SubmissionStatus::Accepted)
            .await
            .expect_err("second accept read a stale status");
        assert!(matches!(
            error,
            RepositoryError::StatusChanged { expected: SubmissionStatus::New, .. }
        ));
    }

    #[tokio::test]
    async fn sql_store_reports_undecodable_rows() {
        let pool = setup().await;
        sqlx::query(
            "INSERT INTO submission (id, kind, status, tier, contact_name, contact_email,
                                     payload, estimate, created_at, updated_at)
             VALUES ('sub_bad', 'planner', 'lost', 'landing', 'X', 'x@example.com',
                     '{}', NULL, '2026-03-02T09:00:00.000000Z', '2026-03-02T09:00:00.000000Z')",
        )
        .execute(&pool)
        .await
        .expect("insert raw row");

        let store = SqlSubmissionStore::new(pool);
        let error = store
            .fetch_one(&SubmissionQuery::ById(SubmissionId("sub_bad".to_string())))
            .await
            .expect_err("bad status should not decode");
        assert!(matches!(error, RepositoryError::Decode(message) if message.contains("lost")));
    }
}
