mod bootstrap;
mod email;
mod health;
mod routes;

use std::time::Duration;

use anyhow::Result;
use studioplan_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use studioplan_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging must be live before bootstrap emits its first event.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        studio_name = %app.config.site.studio_name,
        email_enabled = app.config.email.enabled,
        "studioplan-server listening"
    );

    axum::serve(listener, app.router())
        .with_graceful_shutdown(wait_for_shutdown(app.config.server.graceful_shutdown_secs))
        .await?;

    app.db_pool.close().await;
    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "studioplan-server stopped"
    );

    Ok(())
}

async fn wait_for_shutdown(grace_secs: u64) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for shutdown signal"
        );
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs,
        "draining in-flight requests"
    );

    // Hard stop if draining outlives the grace window.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(grace_secs)).await;
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs,
            "grace period elapsed; exiting"
        );
        std::process::exit(1);
    });
}
