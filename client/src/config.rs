//! Client configuration loaded from environment variables.
//!
//! Numeric knobs follow the lenient `env_parse` convention: a missing or
//! unparseable value falls back to its default. Base URLs are validated
//! because every network call depends on them.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::util::i18n::Locale;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";
pub const DEFAULT_WS_BASE_URL: &str = "ws://localhost:4000/ws";
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SESSION_FILE: &str = ".choufprice/session.json";

pub const ENV_API_BASE_URL: &str = "CHOUFPRICE_API_BASE_URL";
pub const ENV_WS_BASE_URL: &str = "CHOUFPRICE_WS_BASE_URL";
pub const ENV_RECONNECT_BASE_MS: &str = "CHOUFPRICE_RECONNECT_BASE_MS";
pub const ENV_RECONNECT_MAX_MS: &str = "CHOUFPRICE_RECONNECT_MAX_MS";
pub const ENV_REFRESH_SECS: &str = "CHOUFPRICE_REFRESH_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CHOUFPRICE_REQUEST_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "CHOUFPRICE_SESSION_FILE";
pub const ENV_LOCALE: &str = "CHOUFPRICE_LOCALE";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidHttpUrl { key: &'static str, value: String },
    #[error("{key} must be a ws(s) URL, got {value:?}")]
    InvalidWsUrl { key: &'static str, value: String },
}

/// Exponential reconnect schedule: `min(base * 2^attempt, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { base_ms: DEFAULT_RECONNECT_BASE_MS, max_ms: DEFAULT_RECONNECT_MAX_MS }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base, without trailing slash.
    pub api_base_url: String,
    /// Realtime base, without trailing slash. The chat channel lives at `<base>/chat`.
    pub ws_base_url: String,
    pub reconnect: ReconnectPolicy,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
    pub locale: Locale,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_owned(),
            reconnect: ReconnectPolicy::default(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            locale: Locale::default(),
        }
    }
}

impl ClientConfig {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a base URL has the wrong scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. `from_env` delegates here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a base URL has the wrong scheme.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let api_base_url = match value(ENV_API_BASE_URL) {
            Some(url) => normalize_http_url(ENV_API_BASE_URL, &url)?,
            None => DEFAULT_API_BASE_URL.to_owned(),
        };
        let ws_base_url = match value(ENV_WS_BASE_URL) {
            Some(url) => normalize_ws_url(ENV_WS_BASE_URL, &url)?,
            None => DEFAULT_WS_BASE_URL.to_owned(),
        };

        let base_ms = parse_or(ENV_RECONNECT_BASE_MS, value(ENV_RECONNECT_BASE_MS), DEFAULT_RECONNECT_BASE_MS).max(1);
        let max_ms = parse_or(ENV_RECONNECT_MAX_MS, value(ENV_RECONNECT_MAX_MS), DEFAULT_RECONNECT_MAX_MS).max(base_ms);
        let refresh_secs = parse_or(ENV_REFRESH_SECS, value(ENV_REFRESH_SECS), DEFAULT_REFRESH_SECS).max(1);
        let timeout_secs =
            parse_or(ENV_REQUEST_TIMEOUT_SECS, value(ENV_REQUEST_TIMEOUT_SECS), DEFAULT_REQUEST_TIMEOUT_SECS).max(1);

        let locale = match value(ENV_LOCALE) {
            Some(raw) => Locale::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unsupported locale; using default");
                Locale::default()
            }),
            None => Locale::default(),
        };

        Ok(Self {
            api_base_url,
            ws_base_url,
            reconnect: ReconnectPolicy { base_ms, max_ms },
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            session_file: value(ENV_SESSION_FILE).map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from),
            locale,
        })
    }

    /// Chat channel URL, with the bearer token as a query parameter when present.
    #[must_use]
    pub fn chat_url(&self, token: Option<&str>) -> String {
        let base = format!("{}/chat", self.ws_base_url);
        match token.filter(|t| !t.is_empty()) {
            Some(token) => reqwest::Url::parse_with_params(&base, &[("token", token)])
                .map_or_else(|_| format!("{base}?token={token}"), |url| url.to_string()),
            None => base,
        }
    }
}

/// Validate and strip trailing slashes from an http(s) base URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidHttpUrl`] for any other scheme.
pub fn normalize_http_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidHttpUrl { key, value: raw.to_owned() })
    }
}

/// Validate and strip trailing slashes from a ws(s) base URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidWsUrl`] for any other scheme.
pub fn normalize_ws_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidWsUrl { key, value: raw.to_owned() })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy,
{
    match raw {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparseable config value");
            default
        }),
        None => default,
    }
}
