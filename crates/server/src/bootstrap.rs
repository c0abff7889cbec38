use std::sync::Arc;

use axum::Router;
use studioplan_core::config::{AppConfig, ConfigError};
use studioplan_core::errors::DomainError;
use studioplan_core::planner::recommendation::SolutionsMatrix;
use studioplan_core::planner::estimator::DeterministicEstimator;
use studioplan_core::planner::DeterministicPlannerRuntime;
use studioplan_db::{connect_from_config, migrations, DbPool, SqlSubmissionStore};
use thiserror::Error;
use tracing::info;

use crate::email::{mailer_from_config, EmailComposer, EmailError, EmailSettings};
use crate::health::{self, HealthState};
use crate::routes::{self, AppState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

impl Application {
    /// API routes plus `/health`, ready to hand to `axum::serve`.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone()).merge(health::router(HealthState::new(
            self.db_pool.clone(),
            self.config.site.studio_name.clone(),
            self.config.email.enabled,
        )))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("solutions matrix failed to build: {0}")]
    Catalog(#[source] DomainError),
    #[error("email setup failed: {0}")]
    Email(#[from] EmailError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let solutions = SolutionsMatrix::standard().map_err(BootstrapError::Catalog)?;
    let mailer = mailer_from_config(&config.email)?;
    let composer = EmailComposer::new(EmailSettings::from_config(&config.site, &config.email))?;
    info!(
        event_name = "system.bootstrap.email_ready",
        correlation_id = "bootstrap",
        email_enabled = config.email.enabled,
        "email composer initialized"
    );

    let state = AppState {
        runtime: Arc::new(DeterministicPlannerRuntime::<DeterministicEstimator>::default()),
        solutions: Arc::new(solutions),
        store: Arc::new(SqlSubmissionStore::new(db_pool.clone())),
        mailer,
        composer: Arc::new(composer),
        site: config.site.clone(),
        acceptance_secret: config.security.acceptance_secret.clone(),
    };

    Ok(Application { config, db_pool, state })
}
