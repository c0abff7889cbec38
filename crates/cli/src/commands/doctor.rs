use serde::Serialize;
use studioplan_core::config::{AppConfig, LoadOptions};
use studioplan_core::planner::catalog::Catalog;
use studioplan_core::planner::recommendation::SolutionsMatrix;
use studioplan_core::token::AcceptanceTokens;
use studioplan_db::{connect_from_config, migrations};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_pricing_catalog()];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_acceptance_secret(&config));
            checks.push(check_email_delivery(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["acceptance_secret", "email_delivery", "database_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Skipped checks (email disabled) do not fail the report.
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_pricing_catalog() -> DoctorCheck {
    let catalog = Catalog::standard();
    match SolutionsMatrix::standard() {
        Ok(matrix) => DoctorCheck {
            name: "pricing_catalog",
            status: CheckStatus::Pass,
            details: format!(
                "{} add-ons, {} platforms, {} lead goals",
                catalog.addons().len(),
                catalog.platforms().len(),
                matrix.goals().len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "pricing_catalog",
            status: CheckStatus::Fail,
            details: format!("solutions matrix failed to build: {error}"),
        },
    }
}

fn check_acceptance_secret(config: &AppConfig) -> DoctorCheck {
    match AcceptanceTokens::from_config(config.security.acceptance_secret.as_ref()) {
        Ok(_) => DoctorCheck {
            name: "acceptance_secret",
            status: CheckStatus::Pass,
            details: "acceptance links will be signed".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "acceptance_secret",
            status: CheckStatus::Fail,
            details: format!("{error}; estimate emails will omit the accept link"),
        },
    }
}

fn check_email_delivery(config: &AppConfig) -> DoctorCheck {
    if !config.email.enabled {
        return DoctorCheck {
            name: "email_delivery",
            status: CheckStatus::Skipped,
            details: "email.enabled is false; submissions are stored only".to_string(),
        };
    }

    DoctorCheck {
        name: "email_delivery",
        status: CheckStatus::Pass,
        details: format!(
            "sending from `{}` to studio inbox `{}`",
            config.email.from, config.email.studio_inbox
        ),
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        let pending = migrations::pending(&pool)
            .await
            .map_err(|error| format!("failed to inspect migrations: {error}"));
        pool.close().await;
        pending.map(|versions| versions.len())
    });

    match result {
        Ok(0) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`; schema is current", config.database.url),
        },
        Ok(pending) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!("{pending} migration(s) pending; run `studioplan migrate`"),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
