use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::region::Region;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub email: EmailConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Public origin used for "view your estimate" and acceptance links.
    pub base_url: String,
    pub studio_name: String,
    pub default_region: Region,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub provider_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub from: String,
    pub studio_inbox: String,
    pub reply_to: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    pub acceptance_secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
    pub email_enabled: Option<bool>,
    pub acceptance_secret: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://studioplan.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            site: SiteConfig {
                base_url: "http://localhost:8080".to_string(),
                studio_name: "Studioplan".to_string(),
                default_region: Region::My,
            },
            email: EmailConfig {
                enabled: false,
                provider_url: None,
                api_key: None,
                from: "Studioplan <hello@studioplan.local>".to_string(),
                studio_inbox: "studio@studioplan.local".to_string(),
                reply_to: None,
            },
            security: SecurityConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("studioplan.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Socket address the HTTP server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(site) = patch.site {
            if let Some(base_url) = site.base_url {
                self.site.base_url = base_url;
            }
            if let Some(studio_name) = site.studio_name {
                self.site.studio_name = studio_name;
            }
            if let Some(default_region) = site.default_region {
                self.site.default_region = default_region;
            }
        }

        if let Some(email) = patch.email {
            if let Some(enabled) = email.enabled {
                self.email.enabled = enabled;
            }
            if let Some(provider_url) = email.provider_url {
                self.email.provider_url = Some(provider_url);
            }
            if let Some(api_key) = email.api_key {
                self.email.api_key = Some(secret_value(api_key));
            }
            if let Some(from) = email.from {
                self.email.from = from;
            }
            if let Some(studio_inbox) = email.studio_inbox {
                self.email.studio_inbox = studio_inbox;
            }
            if let Some(reply_to) = email.reply_to {
                self.email.reply_to = Some(reply_to);
            }
        }

        if let Some(security) = patch.security {
            if let Some(acceptance_secret) = security.acceptance_secret {
                self.security.acceptance_secret = Some(secret_value(acceptance_secret));
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STUDIOPLAN_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("STUDIOPLAN_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STUDIOPLAN_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("STUDIOPLAN_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STUDIOPLAN_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_SERVER_PORT") {
            self.server.port = parse_u16("STUDIOPLAN_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("STUDIOPLAN_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("STUDIOPLAN_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("STUDIOPLAN_SITE_BASE_URL") {
            self.site.base_url = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_SITE_STUDIO_NAME") {
            self.site.studio_name = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_SITE_DEFAULT_REGION") {
            self.site.default_region = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "STUDIOPLAN_SITE_DEFAULT_REGION".to_string(),
                    value: value.clone(),
                }
            })?;
        }

        if let Some(value) = read_env("STUDIOPLAN_EMAIL_ENABLED") {
            self.email.enabled = parse_bool("STUDIOPLAN_EMAIL_ENABLED", &value)?;
        }
        if let Some(value) = read_env("STUDIOPLAN_EMAIL_PROVIDER_URL") {
            self.email.provider_url = Some(value);
        }
        if let Some(value) = read_env("STUDIOPLAN_EMAIL_API_KEY") {
            self.email.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("STUDIOPLAN_EMAIL_FROM") {
            self.email.from = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_EMAIL_STUDIO_INBOX") {
            self.email.studio_inbox = value;
        }
        if let Some(value) = read_env("STUDIOPLAN_EMAIL_REPLY_TO") {
            self.email.reply_to = Some(value);
        }

        let acceptance_secret = read_env("STUDIOPLAN_SECURITY_ACCEPTANCE_SECRET")
            .or_else(|| read_env("STUDIOPLAN_ACCEPTANCE_SECRET"));
        if let Some(value) = acceptance_secret {
            self.security.acceptance_secret = Some(secret_value(value));
        }

        let log_level =
            read_env("STUDIOPLAN_LOGGING_LEVEL").or_else(|| read_env("STUDIOPLAN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STUDIOPLAN_LOGGING_FORMAT").or_else(|| read_env("STUDIOPLAN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(base_url) = overrides.base_url {
            self.site.base_url = base_url;
        }
        if let Some(enabled) = overrides.email_enabled {
            self.email.enabled = enabled;
        }
        if let Some(acceptance_secret) = overrides.acceptance_secret {
            self.security.acceptance_secret = Some(secret_value(acceptance_secret));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_site(&self.site)?;
        validate_email(&self.email)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("studioplan.toml"), PathBuf::from("config/studioplan.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if !is_http_url(&site.base_url) {
        return Err(ConfigError::Validation(
            "site.base_url must start with http:// or https://".to_string(),
        ));
    }

    if site.studio_name.trim().is_empty() {
        return Err(ConfigError::Validation("site.studio_name must not be empty".to_string()));
    }

    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    if !email.enabled {
        return Ok(());
    }

    match &email.provider_url {
        Some(url) if is_http_url(url) => {}
        _ => {
            return Err(ConfigError::Validation(
                "email.provider_url must be an http(s) URL when email.enabled is true"
                    .to_string(),
            ))
        }
    }

    let missing_key = email
        .api_key
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if missing_key {
        return Err(ConfigError::Validation(
            "email.api_key is required when email.enabled is true".to_string(),
        ));
    }

    if email.from.trim().is_empty() || email.studio_inbox.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.from and email.studio_inbox are required when email.enabled is true"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    site: Option<SitePatch>,
    email: Option<EmailPatch>,
    security: Option<SecurityPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SitePatch {
    base_url: Option<String>,
    studio_name: Option<String>,
    default_region: Option<Region>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    enabled: Option<bool>,
    provider_url: Option<String>,
    api_key: Option<String>,
    from: Option<String>,
    studio_inbox: Option<String>,
    reply_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SecurityPatch {
    acceptance_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
