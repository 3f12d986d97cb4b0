//! Sequential batch driver
//!
//! Processes repository specs one at a time: registration, scan job, and
//! convergence polling per spec. Repositories are deliberately not scanned
//! concurrently, which keeps load on the control plane low and makes the
//! log stream attributable to one repository at a time. Every per-repository
//! failure is logged and the batch continues.

use std::time::Duration;

use hubscan_common::{RepositorySpec, DEFAULT_REVISION};
use tracing::{error, info, warn};

use crate::client::ControlPlane;
use crate::jobs::{create_scan_job, start_scan_job};
use crate::models::CustomerContext;
use crate::poller::{fetch_discovered_resources, poll_until_stable};
use crate::registration::resolve_registration;

/// Onboard a batch of repositories and return the discovered resource ids.
///
/// Ids accumulate in spec order, then in the order each read returns them;
/// overlapping specs are not deduplicated. The result conflates "nothing
/// discovered" with "repository errored out" — the log stream is the only
/// differentiator.
pub async fn onboard_repositories<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    specs: &[RepositorySpec],
    project_id: Option<&str>,
    poll_interval: Duration,
    scan_deadline: Duration,
) -> Vec<String> {
    if specs.is_empty() {
        info!("No repositories to scan");
        return Vec::new();
    }

    info!("Code scanning {} repository(ies)", specs.len());

    let mut all_resource_ids = Vec::new();

    for spec in specs {
        if spec.organization.is_empty() || spec.repo_name.is_empty() {
            warn!("Skipping spec with missing organization or repo name");
            continue;
        }

        if spec.revision != DEFAULT_REVISION {
            warn!(
                "Revision '{}' specified for {} but scanning uses the default branch",
                spec.revision,
                spec.slug()
            );
        }

        info!("Processing {}", spec.slug());

        let repo_config_id = match resolve_registration(
            cp,
            ctx,
            token,
            &spec.organization,
            &spec.repo_name,
            project_id,
            spec.api_key.as_deref(),
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "Failed to create/find registration for {}: {}",
                    spec.slug(),
                    e
                );
                continue;
            }
        };

        // A repository fully processed in a prior run already has resources;
        // skip re-scanning it.
        match fetch_discovered_resources(cp, ctx, token, &repo_config_id).await {
            Ok(existing) if !existing.is_empty() => {
                info!(
                    "Found {} existing resource(s) for {}, skipping scan",
                    existing.len(),
                    spec.slug()
                );
                all_resource_ids.extend(existing);
                continue;
            }
            Ok(_) => info!("No existing resources for {}, initiating scan", spec.slug()),
            Err(e) => warn!("Error checking for existing resources: {}", e),
        }

        let job_id = match create_scan_job(cp, ctx, token, &repo_config_id).await {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to create scan job for {}: {}", spec.slug(), e);
                continue;
            }
        };

        if let Err(e) = start_scan_job(cp, token, &job_id).await {
            error!("Failed to start scan job for {}: {}", spec.slug(), e);
            continue;
        }

        let outcome = poll_until_stable(
            cp,
            ctx,
            token,
            &repo_config_id,
            poll_interval,
            scan_deadline,
        )
        .await;

        if outcome.converged && !outcome.resource_ids.is_empty() {
            info!(
                "Discovered {} resource(s) from {}",
                outcome.resource_ids.len(),
                spec.slug()
            );
            all_resource_ids.extend(outcome.resource_ids);
        } else if !outcome.converged {
            // Timed out; one last direct read before giving up.
            info!(
                "Scan monitoring timed out for {}, attempting final resource query",
                spec.slug()
            );
            match fetch_discovered_resources(cp, ctx, token, &repo_config_id).await {
                Ok(resource_ids) if !resource_ids.is_empty() => {
                    info!(
                        "Found {} resource(s) in final query for {}",
                        resource_ids.len(),
                        spec.slug()
                    );
                    all_resource_ids.extend(resource_ids);
                }
                Ok(_) => warn!("No resources discovered for {}", spec.slug()),
                Err(e) => warn!("Final resource query failed for {}: {}", spec.slug(), e),
            }
        } else {
            warn!("No resources discovered for {}", spec.slug());
        }
    }

    info!(
        "Discovered {} total resource(s) across the batch",
        all_resource_ids.len()
    );

    all_resource_ids
}
