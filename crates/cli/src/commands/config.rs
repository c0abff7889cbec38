use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use studioplan_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl ConfigField {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        ConfigField::new("database.url", &config.database.url, &["STUDIOPLAN_DATABASE_URL"]),
        ConfigField::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["STUDIOPLAN_DATABASE_MAX_CONNECTIONS"],
        ),
        ConfigField::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["STUDIOPLAN_DATABASE_TIMEOUT_SECS"],
        ),
        ConfigField::new(
            "server.bind_address",
            &config.server.bind_address,
            &["STUDIOPLAN_SERVER_BIND_ADDRESS"],
        ),
        ConfigField::new(
            "server.port",
            config.server.port.to_string(),
            &["STUDIOPLAN_SERVER_PORT"],
        ),
        ConfigField::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["STUDIOPLAN_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        ConfigField::new("site.base_url", &config.site.base_url, &["STUDIOPLAN_SITE_BASE_URL"]),
        ConfigField::new(
            "site.studio_name",
            &config.site.studio_name,
            &["STUDIOPLAN_SITE_STUDIO_NAME"],
        ),
        ConfigField::new(
            "site.default_region",
            config.site.default_region.as_str(),
            &["STUDIOPLAN_SITE_DEFAULT_REGION"],
        ),
        ConfigField::new(
            "email.enabled",
            config.email.enabled.to_string(),
            &["STUDIOPLAN_EMAIL_ENABLED"],
        ),
        ConfigField::new(
            "email.provider_url",
            config.email.provider_url.as_deref().unwrap_or("<unset>"),
            &["STUDIOPLAN_EMAIL_PROVIDER_URL"],
        ),
        ConfigField::new(
            "email.api_key",
            redact_secret(config.email.api_key.as_ref().map(|key| key.expose_secret())),
            &["STUDIOPLAN_EMAIL_API_KEY"],
        ),
        ConfigField::new("email.from", &config.email.from, &["STUDIOPLAN_EMAIL_FROM"]),
        ConfigField::new(
            "email.studio_inbox",
            &config.email.studio_inbox,
            &["STUDIOPLAN_EMAIL_STUDIO_INBOX"],
        ),
        ConfigField::new(
            "email.reply_to",
            config.email.reply_to.as_deref().unwrap_or("<unset>"),
            &["STUDIOPLAN_EMAIL_REPLY_TO"],
        ),
        ConfigField::new(
            "security.acceptance_secret",
            redact_secret(
                config.security.acceptance_secret.as_ref().map(|secret| secret.expose_secret()),
            ),
            &["STUDIOPLAN_SECURITY_ACCEPTANCE_SECRET", "STUDIOPLAN_ACCEPTANCE_SECRET"],
        ),
        ConfigField::new(
            "logging.level",
            &config.logging.level,
            &["STUDIOPLAN_LOGGING_LEVEL", "STUDIOPLAN_LOG_LEVEL"],
        ),
        ConfigField::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["STUDIOPLAN_LOGGING_FORMAT", "STUDIOPLAN_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["studioplan.toml", "config/studioplan.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Shows only that a secret exists, never any of its characters.
fn redact_secret(secret: Option<&str>) -> &'static str {
    match secret.map(str::trim) {
        None => "<unset>",
        Some("") => "<empty>",
        Some(_) => "<redacted>",
    }
}
