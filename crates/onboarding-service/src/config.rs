//! Configuration management for the onboarding service
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::CustomerContext;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Control-plane base URL
    pub api_base_url: String,

    /// Bearer token threaded through every control-plane call
    pub api_token: String,

    /// Customer account scope
    pub customer_id: String,

    /// Optional organization filter for GraphQL reads
    pub organization_id: Option<String>,

    /// Project to associate new registrations with
    pub project_id: Option<String>,

    /// Repository-list configuration string (JSON or `org/repo` tokens)
    pub repositories: String,

    /// Seconds between convergence polls
    pub poll_interval_secs: u64,

    /// Per-repository scan deadline in seconds
    pub scan_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_base_url: env::var("API_BASE_URL").context("API_BASE_URL is required")?,

            api_token: env::var("API_TOKEN").context("API_TOKEN is required")?,

            customer_id: env::var("CUSTOMER_ID").context("CUSTOMER_ID is required")?,

            organization_id: env::var("ORGANIZATION_ID").ok(),

            project_id: env::var("PROJECT_ID").ok(),

            repositories: env::var("HUGGINGFACE_REPOSITORIES").unwrap_or_default(),

            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid POLL_INTERVAL_SECS")?,

            scan_timeout_secs: env::var("SCAN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "1200".to_string())
                .parse()
                .context("Invalid SCAN_TIMEOUT_SECS")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            anyhow::bail!("API_BASE_URL must not be empty");
        }

        if self.customer_id.is_empty() {
            anyhow::bail!("CUSTOMER_ID must not be empty");
        }

        if self.poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be greater than 0");
        }

        if self.scan_timeout_secs == 0 {
            anyhow::bail!("SCAN_TIMEOUT_SECS must be greater than 0");
        }

        Ok(())
    }

    /// Customer scope for control-plane calls
    pub fn customer_context(&self) -> CustomerContext {
        CustomerContext::new(self.customer_id.clone(), self.organization_id.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn scan_deadline(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            api_base_url: "https://api.example.com".to_string(),
            api_token: "tok".to_string(),
            customer_id: "cust-1".to_string(),
            organization_id: None,
            project_id: None,
            repositories: String::new(),
            poll_interval_secs: 10,
            scan_timeout_secs: 1200,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = base_config();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_scan_timeout() {
        let mut config = base_config();
        config.scan_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_customer() {
        let mut config = base_config();
        config.customer_id.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = base_config();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.scan_deadline(), Duration::from_secs(1200));
    }
}
