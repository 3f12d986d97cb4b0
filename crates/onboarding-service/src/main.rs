//! Scan Onboarding Service
//!
//! Batch entry point: parses the configured repository list, onboards each
//! repository into the scanning inventory, and prints the discovered
//! resource ids.

use anyhow::Result;
use hubscan_common::parse_repository_specs;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod config;
mod jobs;
mod models;
mod onboarder;
mod poller;
mod registration;

#[cfg(test)]
mod testing;

use client::ApiClient;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,onboarding_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scan Onboarding Service");

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  API base URL: {}", config.api_base_url);
    info!("  Customer: {}", config.customer_id);
    info!("  Poll interval: {}s", config.poll_interval_secs);
    info!("  Scan timeout: {}s", config.scan_timeout_secs);

    let specs = parse_repository_specs(&config.repositories);
    if specs.is_empty() {
        info!("No repositories configured, nothing to do");
        return Ok(());
    }
    info!("Parsed {} repository spec(s)", specs.len());

    let client = ApiClient::new(config.api_base_url.clone());
    let ctx = config.customer_context();

    let resource_ids = onboarder::onboard_repositories(
        &client,
        &ctx,
        &config.api_token,
        &specs,
        config.project_id.as_deref(),
        config.poll_interval(),
        config.scan_deadline(),
    )
    .await;

    info!("Onboarding finished: {} resource(s)", resource_ids.len());
    for resource_id in &resource_ids {
        println!("{resource_id}");
    }

    Ok(())
}
