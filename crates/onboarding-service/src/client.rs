//! REST/GraphQL transport for the code-scanning control plane
//!
//! The orchestration layers talk to the control plane exclusively through the
//! [`ControlPlane`] trait so tests can substitute a scripted fake for the
//! reqwest-backed [`ApiClient`].

use std::time::Duration;

use async_trait::async_trait;
use hubscan_common::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

/// Timeout for read-only metadata queries.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for mutating calls (registration/job creation and start).
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(60);

/// GraphQL API version used by every repository query.
pub const GRAPHQL_VERSION: &str = "v1";

/// Authenticated access to the control plane's REST and GraphQL surfaces.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Issue a REST call and return the decoded JSON body.
    ///
    /// Non-2xx responses surface as [`Error::Transport`] carrying the status
    /// code so callers can branch on conflicts.
    async fn execute_request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        params: &[(&str, &str)],
        token: &str,
        timeout: Duration,
    ) -> Result<Value>;

    /// Run a GraphQL query and return the `data` payload.
    async fn run_graphql(
        &self,
        token: &str,
        query: &str,
        variables: Value,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Value>;
}

/// reqwest-backed control-plane client.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ControlPlane for ApiClient {
    async fn execute_request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        params: &[(&str, &str)],
        token: &str,
        timeout: Duration,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(token)
            .timeout(timeout);

        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json().await.map_err(transport_error)
    }

    async fn run_graphql(
        &self,
        token: &str,
        query: &str,
        variables: Value,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Value> {
        let url = format!("{}/graphql/{}", self.base_url, api_version);
        debug!("POST {}", url);

        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Transport {
                status: Some(status.as_u16()),
                message,
            });
        }

        let envelope: Value = response.json().await.map_err(transport_error)?;
        extract_graphql_data(envelope)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    Error::Transport {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

/// Unwrap a GraphQL response envelope, surfacing any `errors` array.
fn extract_graphql_data(envelope: Value) -> Result<Value> {
    if let Some(errors) = envelope.get("errors") {
        let has_errors = errors.as_array().map(|a| !a.is_empty()).unwrap_or(!errors.is_null());
        if has_errors {
            return Err(Error::GraphQl(errors.to_string()));
        }
    }

    Ok(envelope.get("data").cloned().unwrap_or(Value::Null))
}
