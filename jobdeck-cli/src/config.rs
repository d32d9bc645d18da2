//! Configuration module
//!
//! Connection settings for the scheduling service, assembled from global
//! command-line options and their environment variables.

use std::time::Duration;

use anyhow::{Context, Result};
use jobdeck_client::SchedulerClient;

pub const DEFAULT_SCHEDULER_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the scheduling service
    pub scheduler_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Config {
    pub fn new(scheduler_url: String, timeout: Duration) -> Self {
        Self {
            scheduler_url,
            timeout,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scheduler_url.is_empty() {
            anyhow::bail!("scheduler_url cannot be empty");
        }

        if !self.scheduler_url.starts_with("http://") && !self.scheduler_url.starts_with("https://")
        {
            anyhow::bail!("scheduler_url must start with http:// or https://");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        Ok(())
    }

    /// HTTP client for the configured service
    pub fn client(&self) -> Result<SchedulerClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(SchedulerClient::with_client(&self.scheduler_url, http))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_SCHEDULER_URL.to_string(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }
}
