//! Service Configuration Module
//!
//! Configuration is read from environment variables (after an optional
//! `.env` file) with defaults suitable for local development. Every loader
//! also accepts an arbitrary lookup function so it can be exercised without
//! touching the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use orderline_core::ConfigError;
use orderline_storage::WarmStartPolicy;

use crate::db::DbConfig;

// ============================================================================
// LOOKUP HELPERS
// ============================================================================

/// Load `.env` into the process environment.
///
/// A missing file is fine. A file that exists but cannot be read or parsed
/// is a configuration error; the subscriber is not installed yet at this
/// point, so a log line would be lost.
pub fn load_dotenv() -> Result<(), ConfigError> {
    dotenv_outcome(dotenvy::dotenv().map(|_| ()))
}

fn dotenv_outcome(result: Result<(), dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::InvalidValue {
            field: ".env".to_string(),
            value: String::new(),
            reason: e.to_string(),
        }),
    }
}

/// Read a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub(crate) fn string_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset. A set but
/// unparseable value is an error rather than a silent fallback.
pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

pub(crate) fn bool_or<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|s| s.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            field: key.to_string(),
            value: other,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

// ============================================================================
// HTTP SERVER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Environment variables:
    /// - `ORDERLINE_API_BIND`: listen host (default: 0.0.0.0)
    /// - `PORT` or `ORDERLINE_API_PORT`: listen port (default: 8080)
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port_key = if lookup("PORT").is_some() {
            "PORT"
        } else {
            "ORDERLINE_API_PORT"
        };
        Ok(Self {
            host: string_or(lookup, "ORDERLINE_API_BIND", &defaults.host),
            port: parse_or(lookup, port_key, defaults.port)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "ORDERLINE_API_BIND".to_string(),
            value: addr.clone(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// RECORD STORE SELECTION
// ============================================================================

/// Which record store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Non-durable, for local development only.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "ORDERLINE_STORE".to_string(),
                value: other.to_string(),
                reason: "expected 'postgres' or 'memory'".to_string(),
            }),
        }
    }
}

// ============================================================================
// MESSAGE BUS
// ============================================================================

/// NATS connection and subscription settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub url: String,
    pub client_name: String,
    pub subject: String,
    pub queue_group: Option<String>,
    /// Durable consumer name; together with `stream` selects JetStream.
    pub durable: Option<String>,
    pub stream: Option<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            client_name: "orderline".to_string(),
            subject: "orders".to_string(),
            queue_group: None,
            durable: None,
            stream: None,
        }
    }
}

impl BusConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            url: string_or(lookup, "ORDERLINE_NATS_URL", &defaults.url),
            client_name: string_or(lookup, "ORDERLINE_NATS_CLIENT", &defaults.client_name),
            subject: string_or(lookup, "ORDERLINE_NATS_SUBJECT", &defaults.subject),
            queue_group: non_empty(lookup, "ORDERLINE_NATS_QUEUE_GROUP"),
            durable: non_empty(lookup, "ORDERLINE_NATS_DURABLE"),
            stream: non_empty(lookup, "ORDERLINE_NATS_STREAM"),
        }
    }

    /// The JetStream stream and durable consumer, when both are configured.
    pub fn jetstream(&self) -> Option<(&str, &str)> {
        match (&self.stream, &self.durable) {
            (Some(stream), Some(durable)) => Some((stream.as_str(), durable.as_str())),
            _ => None,
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "ORDERLINE_LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected 'json' or 'pretty'".to_string(),
            }),
        }
    }
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Everything the `orderline-api` binary needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub db: DbConfig,
    pub bus: BusConfig,
    pub warm_start: WarmStartPolicy,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerConfig::from_lookup(lookup)?,
            store: parse_or(lookup, "ORDERLINE_STORE", StoreBackend::default())?,
            db: DbConfig::from_lookup(lookup)?,
            bus: BusConfig::from_lookup(lookup),
            warm_start: parse_or(lookup, "ORDERLINE_WARM_START_POLICY", WarmStartPolicy::default())?,
            log_format: parse_or(lookup, "ORDERLINE_LOG_FORMAT", LogFormat::default())?,
        })
    }
}

/// Settings for the `orderline-publish` binary.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub bus: BusConfig,
    pub dir: PathBuf,
    pub log_format: LogFormat,
}

impl PublisherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv()?;
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut bus = BusConfig::from_lookup(lookup);
        if lookup("ORDERLINE_NATS_CLIENT").is_none() {
            bus.client_name = "orderline-publish".to_string();
        }
        Ok(Self {
            bus,
            dir: PathBuf::from(string_or(lookup, "ORDERLINE_PUBLISH_DIR", "./data/orders")),
            log_format: parse_or(lookup, "ORDERLINE_LOG_FORMAT", LogFormat::default())?,
        })
    }
}
