use std::str::FromStr;

use sso_auth::AuthConfig;
use sso_core::models::app::CreateApp;
use sso_db::DbConfig;

/// Startup configuration errors. Values of secret-bearing variables are
/// never echoed back.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("SSO_BOOTSTRAP_APPS entry #{position} must be name:access_secret:refresh_secret")]
    BootstrapApp { position: usize },
}

/// Where users, applications and refresh sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Surreal,
    /// Process-local maps; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Per-request deadline in seconds (default: `10`).
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
    /// Expired-session sweep period in seconds; `0` disables the sweeper.
    pub sweep_interval_secs: u64,
    pub log_format: LogFormat,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Applications provisioned at startup when no app of that name exists.
    pub bootstrap_apps: Vec<CreateApp>,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default          |
    /// |----------------------------|------------------|
    /// | `SSO_HOST`                 | `0.0.0.0`        |
    /// | `SSO_PORT`                 | `8080`           |
    /// | `SSO_REQUEST_TIMEOUT_SECS` | `10`             |
    /// | `SSO_STORAGE`              | `surreal`        |
    /// | `SSO_SWEEP_INTERVAL_SECS`  | `300`            |
    /// | `SSO_LOG_FORMAT`           | `json`           |
    /// | `SURREAL_URL`              | `127.0.0.1:8000` |
    /// | `SURREAL_NS`               | `sso`            |
    /// | `SURREAL_DB`               | `auth`           |
    /// | `SURREAL_USER`             | `root`           |
    /// | `SURREAL_PASS`             | `root`           |
    /// | `AUTH_ACCESS_TTL_SECS`     | `900`            |
    /// | `AUTH_REFRESH_TTL_SECS`    | `1296000`        |
    /// | `AUTH_PEPPER`              | unset            |
    /// | `SSO_BOOTSTRAP_APPS`       | unset            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let auth_defaults = AuthConfig::default();

        let storage = match lookup("SSO_STORAGE").as_deref() {
            None | Some("surreal") => StorageBackend::Surreal,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SSO_STORAGE",
                    value: other.into(),
                    expected: "'surreal' or 'memory'",
                });
            }
        };

        let log_format = match lookup("SSO_LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SSO_LOG_FORMAT",
                    value: other.into(),
                    expected: "'json' or 'pretty'",
                });
            }
        };

        let bootstrap_apps = match lookup("SSO_BOOTSTRAP_APPS") {
            Some(raw) => parse_bootstrap_apps(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            host: lookup("SSO_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_var(&lookup, "SSO_PORT", 8080, "a port number")?,
            request_timeout_secs: parse_var(
                &lookup,
                "SSO_REQUEST_TIMEOUT_SECS",
                10,
                "a whole number of seconds",
            )?,
            storage,
            sweep_interval_secs: parse_var(
                &lookup,
                "SSO_SWEEP_INTERVAL_SECS",
                300,
                "a whole number of seconds",
            )?,
            log_format,
            db: DbConfig {
                url: lookup("SURREAL_URL").unwrap_or(db_defaults.url),
                namespace: lookup("SURREAL_NS").unwrap_or(db_defaults.namespace),
                database: lookup("SURREAL_DB").unwrap_or(db_defaults.database),
                username: lookup("SURREAL_USER").unwrap_or(db_defaults.username),
                password: lookup("SURREAL_PASS").unwrap_or(db_defaults.password),
            },
            auth: AuthConfig {
                access_token_ttl_secs: parse_var(
                    &lookup,
                    "AUTH_ACCESS_TTL_SECS",
                    auth_defaults.access_token_ttl_secs,
                    "a whole number of seconds",
                )?,
                refresh_token_ttl_secs: parse_var(
                    &lookup,
                    "AUTH_REFRESH_TTL_SECS",
                    auth_defaults.refresh_token_ttl_secs,
                    "a whole number of seconds",
                )?,
                pepper: lookup("AUTH_PEPPER").filter(|p| !p.is_empty()),
                ..auth_defaults
            },
            bootstrap_apps,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected,
        }),
    }
}

/// Parse `name:access_secret:refresh_secret` entries separated by commas.
fn parse_bootstrap_apps(raw: &str) -> Result<Vec<CreateApp>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            let mut parts = entry.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(access), Some(refresh))
                    if !name.is_empty() && !access.is_empty() && !refresh.is_empty() =>
                {
                    Ok(CreateApp {
                        name: name.into(),
                        access_secret: access.into(),
                        refresh_secret: refresh.into(),
                    })
                }
                _ => Err(ConfigError::BootstrapApp {
                    position: index + 1,
                }),
            }
        })
        .collect()
}
