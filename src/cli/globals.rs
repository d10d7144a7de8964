use crate::config::{ApiConfig, DEFAULT_TIMEOUT_MS};
use std::time::Duration;

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_base_url: String,
    pub include_credentials: bool,
    pub timeout_ms: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url,
            include_credentials: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            api_base_url: self.api_base_url.clone(),
            include_credentials: self.include_credentials,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}
