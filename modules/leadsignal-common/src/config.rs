use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// `apify_api_key` may legitimately be empty here: campaign execution
/// checks it and rejects with a ConfigurationError instead of panicking,
/// so a read-only deployment can still inspect campaigns.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the external scrape-job service.
    pub apify_api_key: String,

    /// Bound on each job poll loop, in seconds. None waits indefinitely —
    /// the job service is trusted to reach a terminal state eventually.
    pub poll_timeout_secs: Option<u64>,

    /// Wall-clock bound on a whole campaign execution.
    pub execution_timeout_secs: u64,

    /// Cap on primary-scrape records per search string.
    pub max_businesses_per_unit: u32,
}

const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 4 * 60 * 60;
const DEFAULT_MAX_BUSINESSES_PER_UNIT: u32 = 200;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            apify_api_key: env::var("APIFY_API_KEY").unwrap_or_default(),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            execution_timeout_secs: env::var("EXECUTION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXECUTION_TIMEOUT_SECS),
            max_businesses_per_unit: env::var("MAX_BUSINESSES_PER_UNIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BUSINESSES_PER_UNIT),
        }
    }

    /// Log the loaded configuration without exposing the credential.
    pub fn log_redacted(&self) {
        info!(
            api_key_set = !self.apify_api_key.trim().is_empty(),
            poll_timeout_secs = ?self.poll_timeout_secs,
            execution_timeout_secs = self.execution_timeout_secs,
            max_businesses_per_unit = self.max_businesses_per_unit,
            "Configuration loaded"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apify_api_key: String::new(),
            poll_timeout_secs: None,
            execution_timeout_secs: DEFAULT_EXECUTION_TIMEOUT_SECS,
            max_businesses_per_unit: DEFAULT_MAX_BUSINESSES_PER_UNIT,
        }
    }
}
