//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::MarketConfig;
use domain::config::{DEFAULT_MAX_IMAGE_BYTES, DEFAULT_OPERATION_TIMEOUT};

/// Default ceiling on a request body (5 MiB), large enough for a base64 image.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 5 << 20;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `9000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `json` for JSON lines, anything else for text
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `MAX_IMAGE_BYTES` — largest accepted item image (default: 1 MiB)
/// - `OPERATION_TIMEOUT_MS` — per-request deadline (default: `5000`)
/// - `BODY_LIMIT_BYTES` — largest accepted request body (default: 5 MiB)
/// - `FRONT_URL` — allowed CORS origin; unset allows any
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub max_image_bytes: usize,
    pub operation_timeout: Duration,
    pub body_limit_bytes: usize,
    pub front_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match non_empty("LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: non_empty("DATABASE_URL"),
            max_image_bytes: non_empty("MAX_IMAGE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_bytes),
            operation_timeout: non_empty("OPERATION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.operation_timeout),
            body_limit_bytes: non_empty("BODY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.body_limit_bytes),
            front_url: non_empty("FRONT_URL"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The knobs the transaction core consumes.
    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            max_image_bytes: self.max_image_bytes,
            operation_timeout: self.operation_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            front_url: None,
        }
    }
}
