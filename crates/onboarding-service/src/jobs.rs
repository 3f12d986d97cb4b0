//! Scan job creation and start
//!
//! Job creation only enqueues; a separate start call actually runs the scan.
//! The start response must report `RUNNING` — anything else is a failure even
//! when the HTTP call itself succeeded.

use hubscan_common::{Error, Result};
use reqwest::Method;
use serde_json::json;
use tracing::info;

use crate::client::{ControlPlane, MUTATION_TIMEOUT};
use crate::models::{CreateScanJobRequest, CreateScanJobResponse, CustomerContext, ScanSpec,
    StartScanJobResponse};

/// Remote status reported by a successfully started job.
const RUNNING_STATUS: &str = "RUNNING";

/// The fixed discovery facet set sent with every scan job.
pub fn discovery_scan_specs() -> Vec<ScanSpec> {
    vec![
        ScanSpec::RequirementsFiles {
            identifier_pattern: "{repo_name}-{path}".to_string(),
        },
        ScanSpec::Urls {
            url_whitelist: None,
            url_blacklist: None,
        },
        ScanSpec::HuggingFaceModels {
            model_whitelist: None,
            model_blacklist: None,
        },
        ScanSpec::JupyterNotebooks {
            exclude_checkpoints: true,
        },
        ScanSpec::AiAgents,
        ScanSpec::ModelDiscovery,
    ]
}

/// Create a scan job under a registration and return its id.
pub async fn create_scan_job<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    repo_config_id: &str,
) -> Result<String> {
    let endpoint = format!(
        "/v1/code-scanning/customer/{}/repositories/{}/jobs",
        ctx.customer_id, repo_config_id
    );
    let body = CreateScanJobRequest {
        scan_specs: discovery_scan_specs(),
    };

    info!("Creating scan job for registration {}", repo_config_id);
    let value = cp
        .execute_request(
            &endpoint,
            Method::POST,
            Some(serde_json::to_value(&body)?),
            &[],
            token,
            MUTATION_TIMEOUT,
        )
        .await?;

    let response: CreateScanJobResponse = serde_json::from_value(value)?;
    match response.code_scan_job_id {
        Some(id) => {
            info!("Scan job created: {}", id);
            Ok(id)
        }
        None => Err(Error::JobCreateFailed(
            "response missing code_scan_job_id".to_string(),
        )),
    }
}

/// Start a previously created scan job.
///
/// Succeeds only when the control plane reports the job as `RUNNING`;
/// "request accepted" alone is not enough.
pub async fn start_scan_job<C: ControlPlane>(cp: &C, token: &str, job_id: &str) -> Result<()> {
    let endpoint = format!("/v1/code-scanning/start-job/{}", job_id);
    let params = [
        ("callback_control_plane", "true"),
        ("is_optional", "false"),
    ];

    info!("Starting scan job {}", job_id);
    let value = cp
        .execute_request(
            &endpoint,
            Method::POST,
            Some(json!({})),
            &params,
            token,
            MUTATION_TIMEOUT,
        )
        .await?;

    let response: StartScanJobResponse = serde_json::from_value(value)?;
    match response.status.as_deref() {
        Some(RUNNING_STATUS) => {
            info!(
                "Scan job started (job_id: {})",
                response.job_id.as_deref().unwrap_or(job_id)
            );
            Ok(())
        }
        other => Err(Error::JobStartUnexpectedStatus(
            other.unwrap_or("<missing>").to_string(),
        )),
    }
}
