//! API endpoint configuration. The base origin and the cookie-inclusion flag
//! are fixed for the life of a client; they are not negotiated with the server.
//! The `AUTHGATE_*` environment variables are read by the CLI argument parser.
//! Configuration values are public; do not store secrets here.

use crate::errors::AppError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
/// Default request timeout (milliseconds) applied to every call.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_API_BASE_URL: &str = "AUTHGATE_API_BASE_URL";
pub const ENV_INCLUDE_CREDENTIALS: &str = "AUTHGATE_INCLUDE_CREDENTIALS";
pub const ENV_TIMEOUT_MS: &str = "AUTHGATE_TIMEOUT_MS";

/// Client configuration for the backend API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_base_url: String,
    /// Keep a cookie jar so the durable refresh cookie travels with requests.
    pub include_credentials: bool,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            include_credentials: true,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Joins `path` onto the configured base URL.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the base is empty or the result is not an absolute URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        let base = self.api_base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(AppError::Config("API base URL is not configured.".to_string()));
        }

        let joined = format!("{}/{}", base, path.trim().trim_start_matches('/'));
        Url::parse(&joined)
            .map_err(|err| AppError::Config(format!("Invalid API URL {joined}: {err}")))
    }
}

/// Parses boolean-ish flags, accepting the usual spellings.
#[must_use]
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
