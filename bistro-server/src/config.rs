//! Server configuration
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! `main` before this runs).
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | ENVIRONMENT | development | development / staging / production |
//! | DATABASE_URL | memory (development only) | `postgres://…` or `memory` |
//! | HTTP_PORT | 8000 | listen port |
//! | DB_MAX_CONNECTIONS | 10 | sqlx pool size |
//! | JWT_SECRET | required outside development | HS256 signing secret |
//! | JWT_EXPIRY_HOURS | 24 | token lifetime |
//! | ORDER_UNKNOWN_ITEMS | ignore | `ignore` or `reject` |
//! | ORDER_CREATE_MAX_RETRIES | 5 | numbering conflict retries |
//! | ORDER_CREATE_RETRY_BASE_MS | 10 | first backoff delay, doubled per retry |
//! | ADMIN_EMAIL / ADMIN_PASSWORD | unset | bootstrap admin account |
//! | MAIL_FROM | noreply@bistro.local | sender of queued mail |
//! | LOG_LEVEL | info | default filter when `RUST_LOG` is unset |
//! | LOG_DIR | unset | daily rolling log files |

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in {1} environment")]
    Missing(&'static str, String),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Where persistent state lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// In-process store, lost on restart
    Memory,
    /// PostgreSQL connection URL
    Postgres(String),
}

/// What order creation does with item ids that are not in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownItemPolicy {
    /// Unknown ids contribute nothing to the total, snapshot or counters
    #[default]
    Ignore,
    /// Unknown ids fail the request
    Reject,
}

impl FromStr for UnknownItemPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(other.to_string()),
        }
    }
}

/// Order creation tuning
#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub unknown_items: UnknownItemPolicy,
    /// Retries after a numbering conflict before giving up
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub retry_base_delay: Duration,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            unknown_items: UnknownItemPolicy::Ignore,
            max_retries: 5,
            retry_base_delay: Duration::from_millis(10),
        }
    }
}

/// Bootstrap admin credentials
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    pub database: DatabaseBackend,
    pub http_port: u16,
    pub db_max_connections: u32,
    /// JWT signing secret
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub orders: OrderConfig,
    pub admin: Option<AdminSeed>,
    /// Sender address for queued mail
    pub mail_from: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &'static str, environment: &str) -> Result<String, ConfigError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ if environment != "development" => {
                Err(ConfigError::Missing(name, environment.to_string()))
            }
            _ => Ok(format!("dev-{name}-not-for-production")),
        }
    }

    /// Parse an optional env var, falling back to `default` only when unset.
    fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
        match std::env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn database_backend(environment: &str) -> Result<DatabaseBackend, ConfigError> {
        match std::env::var("DATABASE_URL") {
            Ok(url) if url == "memory" => Ok(DatabaseBackend::Memory),
            Ok(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                Ok(DatabaseBackend::Postgres(url))
            }
            Ok(url) => Err(ConfigError::Invalid {
                name: "DATABASE_URL",
                value: url,
            }),
            Err(_) if environment == "development" => Ok(DatabaseBackend::Memory),
            Err(_) => Err(ConfigError::Missing("DATABASE_URL", environment.to_string())),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Ok(Self {
            database: Self::database_backend(&environment)?,
            http_port: Self::parse_var("HTTP_PORT", 8000)?,
            db_max_connections: Self::parse_var("DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_hours: Self::parse_var("JWT_EXPIRY_HOURS", 24)?,
            orders: OrderConfig {
                unknown_items: Self::parse_var("ORDER_UNKNOWN_ITEMS", UnknownItemPolicy::Ignore)?,
                max_retries: Self::parse_var("ORDER_CREATE_MAX_RETRIES", 5)?,
                retry_base_delay: Duration::from_millis(Self::parse_var(
                    "ORDER_CREATE_RETRY_BASE_MS",
                    10,
                )?),
            },
            admin,
            mail_from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@bistro.local".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            environment,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, fixed secret
    pub fn for_testing() -> Self {
        Self {
            environment: "development".into(),
            database: DatabaseBackend::Memory,
            http_port: 0,
            db_max_connections: 1,
            jwt_secret: "test-secret-for-bistro-server-only".into(),
            jwt_expiry_hours: 1,
            orders: OrderConfig {
                retry_base_delay: Duration::from_millis(1),
                ..OrderConfig::default()
            },
            admin: None,
            mail_from: "noreply@bistro.test".into(),
            log_level: "debug".into(),
            log_dir: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
