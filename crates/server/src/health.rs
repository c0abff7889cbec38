use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use studioplan_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    studio_name: String,
    email_enabled: bool,
}

impl HealthState {
    pub fn new(db_pool: DbPool, studio_name: impl Into<String>, email_enabled: bool) -> Self {
        Self { db_pool, studio_name: studio_name.into(), email_enabled }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub planner: HealthCheck,
    pub database: HealthCheck,
    pub email: HealthCheck,
    pub checked_at: String,
}

/// `/health` probe, merged into the API router so it shares one listener.
pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Only the database gates readiness; disabled email is reported but still "ready".
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        planner: HealthCheck {
            status: "ready",
            detail: format!("{} planner accepting submissions", state.studio_name),
        },
        database,
        email: email_check(state.email_enabled),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submission").fetch_one(pool).await {
        Ok(count) => {
            HealthCheck { status: "ready", detail: format!("{count} submissions stored") }
        }
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("submission store unavailable: {error}"),
        },
    }
}

fn email_check(enabled: bool) -> HealthCheck {
    if enabled {
        HealthCheck { status: "ready", detail: "provider delivery enabled".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "estimates are stored but not emailed".to_string(),
        }
    }
}
