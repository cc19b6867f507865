//! Engine configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Numeric knobs fall back to their defaults when absent or unparsable, the
//! same way the persistence tuning knobs do. Values that change semantics
//! (base URL, optimistic policy) are validated and reported as errors.

use std::time::Duration;

use crate::engine::optimistic::OptimisticPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_LIST_POLL_SECS: u64 = 10;
pub const DEFAULT_DETAIL_POLL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LEADS_API_BASE_URL` is not an absolute http(s) URL.
    #[error("invalid LEADS_API_BASE_URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// `LEADS_OPTIMISTIC_POLICY` names no known policy.
    #[error("unknown LEADS_OPTIMISTIC_POLICY: {0}")]
    UnknownPolicy(String),
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Runtime settings for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Backend origin, without a trailing slash.
    pub api_base_url: String,
    /// Quiescence window before a filter change issues a list fetch.
    pub debounce: Duration,
    /// List refresh period. `None` disables list polling.
    pub list_poll: Option<Duration>,
    /// Detail refresh period while a detail view is open. `None` disables it.
    pub detail_poll: Option<Duration>,
    pub timeouts: HttpTimeouts,
    /// What to do with an optimistic status change whose request failed.
    pub policy: OptimisticPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            list_poll: poll_period(DEFAULT_LIST_POLL_SECS),
            detail_poll: poll_period(DEFAULT_DETAIL_POLL_SECS),
            timeouts: HttpTimeouts::default(),
            policy: OptimisticPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `LEADS_API_BASE_URL`: default `http://127.0.0.1:5001`
    /// - `LEADS_DEBOUNCE_MS`: default 500
    /// - `LEADS_LIST_POLL_SECS`: default 10, `0` disables
    /// - `LEADS_DETAIL_POLL_SECS`: default 30, `0` disables
    /// - `LEADS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LEADS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LEADS_OPTIMISTIC_POLICY`: `no_rollback` (default), `rollback`, or `refetch`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or the policy is unknown.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var("LEADS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let api_base_url = normalize_base_url(&raw_url)?;

        let policy = match std::env::var("LEADS_OPTIMISTIC_POLICY") {
            Ok(raw) => raw.parse::<OptimisticPolicy>().map_err(|_| ConfigError::UnknownPolicy(raw))?,
            Err(_) => OptimisticPolicy::default(),
        };

        Ok(Self {
            api_base_url,
            debounce: Duration::from_millis(env_parse("LEADS_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)),
            list_poll: poll_period(env_parse("LEADS_LIST_POLL_SECS", DEFAULT_LIST_POLL_SECS)),
            detail_poll: poll_period(env_parse("LEADS_DETAIL_POLL_SECS", DEFAULT_DETAIL_POLL_SECS)),
            timeouts: HttpTimeouts {
                request_secs: env_parse("LEADS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("LEADS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            policy,
        })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn poll_period(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason: e.to_string() })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl { url: raw.to_owned(), reason: "scheme must be http or https".into() });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
