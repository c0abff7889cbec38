use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use studioplan_cli::commands::{doctor, estimate, installments, migrate, recommend, token};

const MEMORY_DB: [(&str, &str); 2] = [
    ("STUDIOPLAN_DATABASE_URL", "sqlite::memory:"),
    ("STUDIOPLAN_DATABASE_MAX_CONNECTIONS", "1"),
];

#[test]
fn migrate_returns_applied_versions_with_valid_env() {
    with_env(&MEMORY_DB, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["applied_versions"], serde_json::json!([1]));
    });
}

#[test]
fn migrate_returns_config_failure_for_incomplete_email_setup() {
    with_env(&[("STUDIOPLAN_EMAIL_ENABLED", "true")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn estimate_prices_answers_file_in_requested_region() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("answers.json");
    fs::write(
        &path,
        r#"{
            "basics": {"company_name": "Kopi Lab", "industry": "F&B", "website_status": "none"},
            "goal": "inquiries",
            "pages": {"selected": ["home"]},
            "timing": {
                "launch_date": "2026-06-01",
                "flexibility": "flexible",
                "budget": "under_3k",
                "payment": "installments12"
            },
            "contact": {"full_name": "Aina", "email": "aina@kopilab.my", "consent": true}
        }"#,
    )
    .expect("write answers");

    let result = estimate::run(&path, Some("2026-03-01T00:00:00Z"), Some("sg"));
    assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["package_name"], "Landing Page");
    assert_eq!(payload["data"]["estimate"]["tier"], "landing");
    assert_eq!(payload["data"]["display"]["currency"], "SGD");
    assert_eq!(payload["data"]["installments"]["months"], 12);
    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.starts_with("Landing Page: S$"), "unexpected message: {message}");
}

#[test]
fn estimate_reports_validation_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("answers.json");
    fs::write(&path, "{}").expect("write answers");

    let result = estimate::run(&path, None, None);
    assert_eq!(result.exit_code, 3);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "validation");
    let message = payload["message"].as_str().unwrap_or("");
    assert!(message.contains("Company name is required"));
    assert!(message.contains("Select a primary goal"));
}

#[test]
fn estimate_rejects_unreadable_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");

    let result = estimate::run(&missing, None, None);
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "input");

    let path = dir.path().join("answers.json");
    fs::write(&path, "{}").expect("write answers");
    let result = estimate::run(&path, Some("yesterday"), None);
    assert_eq!(result.exit_code, 2);

    let result = estimate::run(&path, None, Some("mars"));
    assert_eq!(result.exit_code, 2);
}

#[test]
fn recommend_upgrades_for_commerce_keywords() {
    let goals = vec!["Get more inquiries".to_string()];
    let features = vec!["shopping cart".to_string()];

    let result = recommend::run(&goals, &features);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["recommendation"]["tier"], "custom");
    assert_eq!(payload["data"]["package_name"], "Custom Platform");
}

#[test]
fn recommend_requires_a_goal() {
    let result = recommend::run(&[], &["blog".to_string()]);
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "input");
}

#[test]
fn installments_preview_formats_monthly_amount() {
    let result = installments::run("4500", 6);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["message"], "6 x RM 795 per month (RM 4,770 total)");
    assert_eq!(payload["data"]["plan"]["months"], 6);

    assert_eq!(installments::run("4500", 9).exit_code, 2);
    assert_eq!(installments::run("-10", 6).exit_code, 2);
    assert_eq!(installments::run("79228162514264337593543950335", 12).exit_code, 2);
}

#[test]
fn token_issues_acceptance_link_from_configured_secret() {
    with_env(
        &[
            ("STUDIOPLAN_ACCEPTANCE_SECRET", "cli-test-secret"),
            ("STUDIOPLAN_SITE_BASE_URL", "https://studio.example"),
        ],
        || {
            let result = token::run("sub_abc");
            assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

            let payload = parse_payload(&result.output);
            let url = payload["data"]["acceptance_url"].as_str().unwrap_or("");
            assert!(url.starts_with("https://studio.example/api/quote/accept?id=sub_abc&token="));
            assert_eq!(payload["data"]["token"].as_str().map(str::len), Some(16));
        },
    );
}

#[test]
fn token_fails_without_secret() {
    with_env(&[], || {
        let result = token::run("sub_abc");
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "configuration");
    });
}

#[test]
fn doctor_passes_against_migrated_file_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("studioplan.db").display());

    with_env(
        &[
            ("STUDIOPLAN_DATABASE_URL", url.as_str()),
            ("STUDIOPLAN_ACCEPTANCE_SECRET", "doctor-secret"),
        ],
        || {
            let before: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");
            assert_eq!(before["overall_status"], "fail", "pending migrations should fail doctor");

            assert_eq!(migrate::run().exit_code, 0);

            let after: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");
            assert_eq!(after["overall_status"], "pass", "unexpected report: {after}");
            let email = after["checks"]
                .as_array()
                .and_then(|checks| checks.iter().find(|check| check["name"] == "email_delivery"))
                .cloned()
                .unwrap_or(Value::Null);
            assert_eq!(email["status"], "skipped");
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[("STUDIOPLAN_SITE_BASE_URL", "not-a-url")], || {
        let output = doctor::run(false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation:"));
        assert!(output.contains("- [skip] database_connectivity:"));
        assert!(output.contains("- [ok] pricing_catalog:"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STUDIOPLAN_DATABASE_URL",
        "STUDIOPLAN_DATABASE_MAX_CONNECTIONS",
        "STUDIOPLAN_DATABASE_TIMEOUT_SECS",
        "STUDIOPLAN_SERVER_BIND_ADDRESS",
        "STUDIOPLAN_SERVER_PORT",
        "STUDIOPLAN_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "STUDIOPLAN_SITE_BASE_URL",
        "STUDIOPLAN_SITE_STUDIO_NAME",
        "STUDIOPLAN_SITE_DEFAULT_REGION",
        "STUDIOPLAN_EMAIL_ENABLED",
        "STUDIOPLAN_EMAIL_PROVIDER_URL",
        "STUDIOPLAN_EMAIL_API_KEY",
        "STUDIOPLAN_EMAIL_FROM",
        "STUDIOPLAN_EMAIL_STUDIO_INBOX",
        "STUDIOPLAN_EMAIL_REPLY_TO",
        "STUDIOPLAN_SECURITY_ACCEPTANCE_SECRET",
        "STUDIOPLAN_ACCEPTANCE_SECRET",
        "STUDIOPLAN_LOGGING_LEVEL",
        "STUDIOPLAN_LOGGING_FORMAT",
        "STUDIOPLAN_LOG_LEVEL",
        "STUDIOPLAN_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
