//! Wire models for the code-scanning control plane

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Version-control kind under which hub repositories are registered.
pub const VCS_KIND: &str = "huggingface_hub";

/// Customer scope threaded through every control-plane call.
#[derive(Debug, Clone)]
pub struct CustomerContext {
    /// Customer account owning the registrations.
    pub customer_id: String,

    /// Optional organization filter for GraphQL reads.
    pub organization_id: Option<String>,
}

impl CustomerContext {
    pub fn new(customer_id: impl Into<String>, organization_id: Option<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            organization_id,
        }
    }

    /// Variables envelope shared by every repository query.
    pub fn graphql_variables(&self) -> Value {
        let mut variables = json!({ "customerId": self.customer_id });
        if let Some(organization_id) = &self.organization_id {
            variables["organizationId"] = json!(organization_id);
        }
        variables
    }
}

/// Body for `POST /v1/code-scanning/customer/{customer_id}/repositories`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepositoryRequest {
    pub vcs: String,
    pub organization: String,
    pub repo_name: String,
    /// Hub API key for private repositories; empty when not needed.
    pub api_key: String,
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRepositoryResponse {
    #[serde(default)]
    pub repository_config_id: Option<String>,
}

/// Body for `POST .../repositories/{repo_config_id}/jobs`
#[derive(Debug, Serialize)]
pub struct CreateScanJobRequest {
    pub scan_specs: Vec<ScanSpec>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScanJobResponse {
    #[serde(default)]
    pub code_scan_job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartScanJobResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One discovery facet of a scan job.
///
/// The facet set is a static capability declaration of this service, not
/// user-configurable; see `jobs::discovery_scan_specs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scan_type")]
pub enum ScanSpec {
    #[serde(rename = "discover-requirements-files")]
    RequirementsFiles { identifier_pattern: String },

    #[serde(rename = "discover-urls")]
    Urls {
        url_whitelist: Option<Vec<String>>,
        url_blacklist: Option<Vec<String>>,
    },

    #[serde(rename = "discover-huggingface-models")]
    HuggingFaceModels {
        model_whitelist: Option<Vec<String>>,
        model_blacklist: Option<Vec<String>>,
    },

    #[serde(rename = "discover-jupyter-notebooks")]
    JupyterNotebooks { exclude_checkpoints: bool },

    #[serde(rename = "discover-ai-agents")]
    AiAgents,

    #[serde(rename = "model-discovery")]
    ModelDiscovery,
}

/// A registration as reported by the GraphQL read API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub vcs: String,

    #[serde(default)]
    pub project: Option<ProjectRef>,

    /// Verification bookkeeping reported by the control plane. Carried for
    /// observability; convergence never branches on these.
    #[serde(default)]
    pub last_verified: Option<String>,

    #[serde(default)]
    pub last_verified_success: Option<bool>,

    #[serde(default)]
    pub last_verified_failed_reason: Option<String>,

    #[serde(default)]
    pub resource_instances: Vec<ResourceInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    pub id: String,
}

/// One discovered artifact (model, notebook, URL, agent, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInstance {
    pub id: String,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub registered_at: Option<String>,
}

/// Envelope under the GraphQL `data` key for repository queries.
#[derive(Debug, Deserialize)]
pub struct RepositoriesData {
    #[serde(default)]
    pub repositories: Vec<Repository>,
}
