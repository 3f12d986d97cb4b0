//! Convergence polling for in-flight scans
//!
//! The control plane never reports an explicit "scan finished" signal, so
//! completion is inferred from quiescence: the discovered-resource set only
//! grows during a scan, and a count that holds steady across consecutive
//! polls is taken as convergence. Discovery happens in bursts (one facet's
//! results may land before another's), hence the debounce threshold.

use std::time::Duration;

use hubscan_common::Result;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::{ControlPlane, GRAPHQL_VERSION, METADATA_TIMEOUT};
use crate::models::{CustomerContext, RepositoriesData, Repository};

/// Consecutive identical non-zero counts required to declare convergence.
pub const STABILITY_THRESHOLD: u32 = 3;

/// Emit a progress line every N polls (once a minute at 10s intervals).
const PROGRESS_LOG_EVERY: u64 = 6;

const MONITOR_QUERY: &str = r#"
query MonitorRepositoryScan($customerId: UUID!, $organizationId: UUID) {
    repositories: getRepositories(
        filter: {customerId: $customerId, organizationId: $organizationId}
    ) {
        id
        name
        organization
        lastVerified
        lastVerifiedSuccess
        lastVerifiedFailedReason
        resourceInstances {
            id
            type
            name
            registeredAt
        }
    }
}
"#;

const RESOURCES_QUERY: &str = r#"
query GetRepositoryResources($customerId: UUID!, $organizationId: UUID) {
    repositories: getRepositories(
        filter: {customerId: $customerId, organizationId: $organizationId}
    ) {
        id
        name
        organization
        resourceInstances {
            id
            type
            name
        }
    }
}
"#;

/// Debounce state for the observed resource count.
///
/// The streak is the length of the current run of identical non-zero counts,
/// so convergence triggers on the first stable run of the threshold length
/// regardless of later growth. A count of zero never contributes to a run:
/// a repository with nothing discoverable only exits via the deadline.
#[derive(Debug)]
pub struct StabilityTracker {
    threshold: u32,
    last_count: usize,
    streak: u32,
}

impl StabilityTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_count: 0,
            streak: 0,
        }
    }

    /// Record one poll reading; returns true once the count has held stable.
    pub fn observe(&mut self, count: usize) -> bool {
        if count > 0 && count == self.last_count {
            self.streak += 1;
        } else {
            self.streak = u32::from(count > 0);
            self.last_count = count;
        }
        self.streak >= self.threshold
    }

    /// Most recently observed count.
    pub fn last_count(&self) -> usize {
        self.last_count
    }
}

/// Result of one convergence-polling run.
#[derive(Debug, Clone, Default)]
pub struct PollOutcome {
    /// Whether the resource set was observed to stabilize before the
    /// deadline. On timeout the ids are empty; the caller decides whether
    /// to attempt a last-chance direct read.
    pub converged: bool,
    pub resource_ids: Vec<String>,
}

/// Poll the registration's resource list until it stabilizes or the
/// deadline elapses.
///
/// Transient poll failures are logged and retried on the same cadence;
/// only the deadline ends the loop early.
pub async fn poll_until_stable<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    repo_config_id: &str,
    interval: Duration,
    deadline: Duration,
) -> PollOutcome {
    let started = Instant::now();
    let mut tracker = StabilityTracker::new(STABILITY_THRESHOLD);
    let mut poll_count: u64 = 0;

    info!("Monitoring scan progress for registration {}", repo_config_id);

    loop {
        let elapsed = started.elapsed();
        if elapsed >= deadline {
            warn!(
                "Timed out after {:.1}s waiting for scan convergence",
                elapsed.as_secs_f64()
            );
            return PollOutcome::default();
        }

        poll_count += 1;

        match fetch_repository(cp, ctx, token, repo_config_id, MONITOR_QUERY).await {
            Ok(Some(repo)) => {
                let count = repo.resource_instances.len();
                let changed = count != tracker.last_count();

                if tracker.observe(count) {
                    let resource_ids = resource_ids(&repo);
                    info!(
                        "Scan converged after {:.1}s ({} polls), {} resource(s)",
                        elapsed.as_secs_f64(),
                        poll_count,
                        resource_ids.len()
                    );
                    return PollOutcome {
                        converged: true,
                        resource_ids,
                    };
                }

                if changed && count > 0 {
                    info!("Discovered {} resource(s) so far", count);
                }
                if poll_count % PROGRESS_LOG_EVERY == 0 {
                    info!(
                        "Still scanning... (elapsed: {:.1}s, resources: {})",
                        elapsed.as_secs_f64(),
                        count
                    );
                }
            }
            Ok(None) => {
                warn!(
                    "Registration {} not present in monitor results",
                    repo_config_id
                );
            }
            Err(e) => {
                // Transient; retry on the same cadence.
                warn!("Error polling scan progress: {}", e);
            }
        }

        sleep(interval).await;
    }
}

/// One-shot read of a registration's discovered resource ids.
pub async fn fetch_discovered_resources<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    repo_config_id: &str,
) -> Result<Vec<String>> {
    match fetch_repository(cp, ctx, token, repo_config_id, RESOURCES_QUERY).await? {
        Some(repo) => {
            for resource in &repo.resource_instances {
                debug!("  - {} ({})", resource.name, resource.resource_type);
            }
            Ok(resource_ids(&repo))
        }
        None => {
            warn!(
                "Registration {} not present in resource query results",
                repo_config_id
            );
            Ok(Vec::new())
        }
    }
}

async fn fetch_repository<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    repo_config_id: &str,
    query: &str,
) -> Result<Option<Repository>> {
    let data = cp
        .run_graphql(
            token,
            query,
            ctx.graphql_variables(),
            GRAPHQL_VERSION,
            METADATA_TIMEOUT,
        )
        .await?;

    let parsed: RepositoriesData = serde_json::from_value(data)?;
    Ok(parsed
        .repositories
        .into_iter()
        .find(|repo| repo.id == repo_config_id))
}

fn resource_ids(repo: &Repository) -> Vec<String> {
    repo.resource_instances
        .iter()
        .filter(|resource| !resource.id.is_empty())
        .map(|resource| resource.id.clone())
        .collect()
}
