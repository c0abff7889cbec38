use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use studioplan_core::config::SiteConfig;
use studioplan_core::domain::answers::PlannerAnswers;
use studioplan_core::domain::estimate::{EstimateBreakdown, MoneyRange};
use studioplan_core::domain::lead::LeadForm;
use studioplan_core::domain::submission::{
    SubmissionDocument, SubmissionId, SubmissionKind, SubmissionStatus,
};
use studioplan_core::errors::{ApplicationError, InterfaceError};
use studioplan_core::planner::installments::{installment_plan, InstallmentPlan, InstallmentTerm};
use studioplan_core::planner::recommendation::{LeadRecommendation, SolutionsMatrix};
use studioplan_core::planner::validation::validate_lead;
use studioplan_core::planner::PlannerRuntime;
use studioplan_core::region::{convert_from_myr, convert_range, format_range, Region};
use studioplan_core::token::AcceptanceTokens;
use studioplan_db::{RepositoryError, SubmissionQuery, SubmissionStore};

use crate::email::{EmailComposer, EmailMessage, EstimateEmail, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<dyn PlannerRuntime>,
    pub solutions: Arc<SolutionsMatrix>,
    pub store: Arc<dyn SubmissionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub composer: Arc<EmailComposer>,
    pub site: SiteConfig,
    pub acceptance_secret: Option<SecretString>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/planner", post(submit_planner))
        .route("/api/leads", post(submit_lead))
        .route("/api/quote/accept", get(accept_quote))
        .route("/api/installments", get(preview_installments))
        .with_state(state)
}

/// JSON error body carrying a user-safe message and the request correlation id.
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "ok": false,
            "error": self.0.user_message(),
            "correlation_id": self.0.correlation_id(),
        });
        (status, Json(body)).into_response()
    }
}

fn correlation_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

fn validation_failed(errors: Vec<String>) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "ok": false, "errors": errors })))
        .into_response()
}

fn repository_failure(error: RepositoryError, correlation_id: &str) -> ApiError {
    match error {
        RepositoryError::NotFound(id) => ApiError(InterfaceError::NotFound {
            message: format!("submission `{id}` was not found"),
            correlation_id: correlation_id.to_string(),
        }),
        RepositoryError::StatusChanged { id, .. } => ApiError(InterfaceError::Conflict {
            message: format!("submission `{id}` changed status while it was being accepted"),
            correlation_id: correlation_id.to_string(),
        }),
        other => ApiError(ApplicationError::Persistence(other.to_string()).into_interface(
            correlation_id,
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct RegionalPrice {
    pub region: Region,
    pub currency: &'static str,
    pub total: Decimal,
    pub range: MoneyRange,
    pub formatted_range: String,
}

impl RegionalPrice {
    fn new(estimate: &EstimateBreakdown, region: Region) -> Self {
        let range = convert_range(estimate.range, region);
        Self {
            region,
            currency: region.currency_code(),
            total: convert_from_myr(estimate.total, region),
            range,
            formatted_range: format_range(range, region),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlannerResponse {
    pub ok: bool,
    pub reference_id: Option<SubmissionId>,
    pub package_name: String,
    pub estimate: EstimateBreakdown,
    pub installments: Option<InstallmentPlan>,
    pub display: RegionalPrice,
}

async fn submit_planner(
    State(state): State<AppState>,
    Json(answers): Json<PlannerAnswers>,
) -> Response {
    let correlation_id = correlation_id();
    let now = Utc::now();
    info!(
        event_name = "planner.submission.received",
        correlation_id = %correlation_id,
        "planner submission received"
    );

    let evaluation = state.runtime.evaluate(&answers, now);
    let Some(estimate) = evaluation.estimate else {
        info!(
            event_name = "planner.submission.invalid",
            correlation_id = %correlation_id,
            error_count = evaluation.validation.errors().len(),
            "planner submission failed validation"
        );
        return validation_failed(evaluation.validation.errors());
    };
    let package_name = state.runtime.catalog().tier(estimate.tier).name.clone();

    let reference_id =
        persist_planner(&state, &answers, &estimate, now, &correlation_id).await;
    let acceptance_url = reference_id
        .as_ref()
        .and_then(|id| acceptance_url(&state, id, &correlation_id));

    let email = EstimateEmail {
        reference_id: reference_id.as_ref(),
        company: &answers.basics.company_name,
        contact: &answers.contact,
        package_name: &package_name,
        estimate: &estimate,
        acceptance_url,
    };
    let messages = [
        state.composer.client_estimate(&email),
        state.composer.studio_notification(&email),
    ];
    for message in messages {
        deliver(&state, message, "planner.email.failed", &correlation_id).await;
    }

    let display = RegionalPrice::new(&estimate, state.site.default_region);
    Json(PlannerResponse {
        ok: true,
        reference_id,
        package_name,
        estimate,
        installments: evaluation.installments,
        display,
    })
    .into_response()
}

async fn persist_planner(
    state: &AppState,
    answers: &PlannerAnswers,
    estimate: &EstimateBreakdown,
    now: DateTime<Utc>,
    correlation_id: &str,
) -> Option<SubmissionId> {
    let document = SubmissionDocument {
        kind: SubmissionKind::Planner,
        status: SubmissionStatus::New,
        tier: estimate.tier,
        contact_name: answers.contact.full_name.trim().to_string(),
        contact_email: answers.contact.email.trim().to_string(),
        payload: json!({ "answers": answers }),
        estimate: Some(estimate.clone()),
        created_at: now,
    };

    match state.store.create(document).await {
        Ok(id) => {
            info!(
                event_name = "planner.persist.created",
                correlation_id = %correlation_id,
                reference_id = %id,
                tier = estimate.tier.as_str(),
                "planner submission stored"
            );
            Some(id)
        }
        Err(error) => {
            warn!(
                event_name = "planner.persist.failed",
                correlation_id = %correlation_id,
                error = %error,
                "planner submission could not be stored"
            );
            None
        }
    }
}

fn acceptance_url(state: &AppState, id: &SubmissionId, correlation_id: &str) -> Option<String> {
    match AcceptanceTokens::from_config(state.acceptance_secret.as_ref()) {
        Ok(tokens) => Some(tokens.acceptance_url(&state.site.base_url, id)),
        Err(error) => {
            warn!(
                event_name = "quote.accept.unconfigured",
                correlation_id = %correlation_id,
                reference_id = %id,
                error = %error,
                "acceptance link omitted"
            );
            None
        }
    }
}

async fn deliver(
    state: &AppState,
    message: Result<EmailMessage, crate::email::EmailError>,
    failure_event: &'static str,
    correlation_id: &str,
) {
    let outcome = match message {
        Ok(message) => state.mailer.send(&message).await,
        Err(error) => Err(error),
    };
    if let Err(error) = outcome {
        warn!(
            event_name = failure_event,
            correlation_id = %correlation_id,
            error = %error,
            "email could not be delivered"
        );
    }
}

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub ok: bool,
    pub reference_id: Option<SubmissionId>,
    pub package_name: String,
    pub price_range: String,
    pub recommendation: LeadRecommendation,
}

async fn submit_lead(State(state): State<AppState>, Json(lead): Json<LeadForm>) -> Response {
    let correlation_id = correlation_id();
    let now = Utc::now();
    info!(
        event_name = "lead.submission.received",
        correlation_id = %correlation_id,
        "lead submission received"
    );

    let errors = validate_lead(&lead);
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let recommendation = state.solutions.recommend(&lead.goals, &lead.features);
    let tier_config = state.runtime.catalog().tier(recommendation.tier);
    let package_name = tier_config.name.clone();
    let price_range = format_range(
        tier_config
            .price_range
            .unwrap_or_else(|| MoneyRange::new(tier_config.base_price, tier_config.base_price)),
        Region::My,
    );

    let document = SubmissionDocument {
        kind: SubmissionKind::Lead,
        status: SubmissionStatus::New,
        tier: recommendation.tier,
        contact_name: lead.contact.full_name.trim().to_string(),
        contact_email: lead.contact.email.trim().to_string(),
        payload: json!({ "lead": lead, "recommendation": recommendation }),
        estimate: None,
        created_at: now,
    };
    let reference_id = match state.store.create(document).await {
        Ok(id) => Some(id),
        Err(error) => {
            warn!(
                event_name = "lead.persist.failed",
                correlation_id = %correlation_id,
                error = %error,
                "lead could not be stored"
            );
            None
        }
    };

    let message = state.composer.lead_notification(
        &lead,
        &recommendation,
        &package_name,
        &price_range,
        reference_id.as_ref(),
    );
    deliver(&state, message, "lead.email.failed", &correlation_id).await;

    Json(LeadResponse { ok: true, reference_id, package_name, price_range, recommendation })
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct AcceptQuery {
    pub id: String,
    pub token: String,
}

async fn accept_quote(
    State(state): State<AppState>,
    Query(query): Query<AcceptQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let correlation_id = correlation_id();
    let id = SubmissionId(query.id.trim().to_string());

    let tokens = AcceptanceTokens::from_config(state.acceptance_secret.as_ref())
        .map_err(|error| ApiError(error.into_interface(&correlation_id)))?;

    if !tokens.verify(&id, &query.token) {
        warn!(
            event_name = "quote.accept.forbidden",
            correlation_id = %correlation_id,
            reference_id = %id,
            "acceptance token mismatch"
        );
        return Err(ApiError(InterfaceError::Forbidden {
            message: "acceptance token does not match".to_string(),
            correlation_id,
        }));
    }

    let stored = state
        .store
        .fetch_one(&SubmissionQuery::ById(id.clone()))
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?
        .ok_or_else(|| {
            ApiError(InterfaceError::NotFound {
                message: format!("submission `{id}` was not found"),
                correlation_id: correlation_id.clone(),
            })
        })?;

    let next = stored
        .document
        .status
        .transition_to(SubmissionStatus::Accepted)
        .map_err(|error| {
            warn!(
                event_name = "quote.accept.conflict",
                correlation_id = %correlation_id,
                reference_id = %id,
                status = stored.document.status.as_str(),
                "submission cannot be accepted from its current status"
            );
            ApiError(ApplicationError::from(error).into_interface(&correlation_id))
        })?;

    let updated = state
        .store
        .patch_status(&id, stored.document.status, next)
        .await
        .map_err(|error| repository_failure(error, &correlation_id))?;

    info!(
        event_name = "quote.accept.accepted",
        correlation_id = %correlation_id,
        reference_id = %id,
        "estimate accepted by client"
    );

    Ok(Json(json!({
        "ok": true,
        "reference_id": updated.id,
        "status": updated.document.status,
    })))
}

#[derive(Debug, Deserialize)]
pub struct InstallmentQuery {
    pub total: String,
    pub months: u32,
}

async fn preview_installments(
    Query(query): Query<InstallmentQuery>,
) -> Result<Json<InstallmentPlan>, ApiError> {
    let correlation_id = correlation_id();
    let total = Decimal::from_str(query.total.trim())
        .ok()
        .filter(|total| *total > Decimal::ZERO)
        .ok_or_else(|| {
            ApiError(InterfaceError::BadRequest {
                message: format!("invalid total `{}`", query.total),
                correlation_id: correlation_id.clone(),
            })
        })?;
    let term = InstallmentTerm::from_months(query.months)
        .map_err(|error| ApiError(ApplicationError::from(error).into_interface(&correlation_id)))?;

    let plan = installment_plan(total, term)
        .map_err(|error| ApiError(ApplicationError::from(error).into_interface(&correlation_id)))?;

    Ok(Json(plan))
}
