//! Runtime configuration for the offline queue and its sync pipeline.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::util::normalize_http_base_url;

pub const API_BASE_URL_VAR: &str = "CASHBOOK_API_BASE_URL";
pub const API_TOKEN_VAR: &str = "CASHBOOK_API_TOKEN";
pub const DB_PATH_VAR: &str = "CASHBOOK_DB_PATH";
pub const SETTLE_DELAY_VAR: &str = "CASHBOOK_SETTLE_DELAY_MS";
pub const REQUEST_TIMEOUT_VAR: &str = "CASHBOOK_REQUEST_TIMEOUT_SECS";
pub const PROBE_INTERVAL_VAR: &str = "CASHBOOK_PROBE_INTERVAL_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub db_path: Option<PathBuf>,
    pub settle_delay: Duration,
    pub request_timeout: Duration,
    pub probe_interval: Duration,
}

impl fmt::Debug for QueueConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QueueConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("db_path", &self.db_path)
            .field("settle_delay", &self.settle_delay)
            .field("request_timeout", &self.request_timeout)
            .field("probe_interval", &self.probe_interval)
            .finish()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            db_path: None,
            settle_delay: Duration::from_millis(1_000),
            request_timeout: Duration::from_secs(30),
            probe_interval: Duration::from_secs(15),
        }
    }
}

impl QueueConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = optional_trimmed(&lookup, API_BASE_URL_VAR)
            .map(|value| {
                normalize_http_base_url(&value).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "{API_BASE_URL_VAR} must start with http:// or https://"
                    ))
                })
            })
            .transpose()?;

        let api_token = optional_trimmed(&lookup, API_TOKEN_VAR);
        let db_path = optional_trimmed(&lookup, DB_PATH_VAR).map(PathBuf::from);

        let settle_delay_ms = bounded_u64(&lookup, SETTLE_DELAY_VAR, "1000", 0..=60_000)?;
        let request_timeout_secs = bounded_u64(&lookup, REQUEST_TIMEOUT_VAR, "30", 1..=300)?;
        let probe_interval_secs = bounded_u64(&lookup, PROBE_INTERVAL_VAR, "15", 1..=3_600)?;

        Ok(Self {
            api_base_url,
            api_token,
            db_path,
            settle_delay: Duration::from_millis(settle_delay_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            probe_interval: Duration::from_secs(probe_interval_secs),
        })
    }

    /// The API base URL, for commands that talk to the server
    pub fn require_api_base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url
            .as_deref()
            .ok_or(ConfigError::MissingVar(API_BASE_URL_VAR))
    }
}

fn bounded_u64(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let value = value_or_default(lookup, name, default)
        .parse::<u64>()
        .map_err(|_| {
            ConfigError::Invalid(format!(
                "{name} must be an integer in [{}, {}]",
                range.start(),
                range.end()
            ))
        })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{}, {}]",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
