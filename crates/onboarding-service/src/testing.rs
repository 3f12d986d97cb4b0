//! Scripted control-plane fake for exercising orchestration logic
//!
//! Replies are queued per surface (REST vs GraphQL) and consumed in order;
//! every call is recorded so tests can assert which endpoints were hit.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use hubscan_common::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::client::ControlPlane;
use crate::models::VCS_KIND;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(Value),
    HttpError(u16, &'static str),
    GraphQlError(&'static str),
}

impl Scripted {
    fn into_result(self) -> Result<Value> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::HttpError(status, message) => Err(Error::Transport {
                status: Some(status),
                message: message.to_string(),
            }),
            Scripted::GraphQlError(message) => Err(Error::GraphQl(message.to_string())),
        }
    }
}

/// Recorded REST call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
}

pub struct ScriptedControlPlane {
    rest: Mutex<VecDeque<Scripted>>,
    graphql: Mutex<VecDeque<Scripted>>,
    /// Reply used when the GraphQL queue runs dry (handy for poll loops).
    graphql_repeat: Mutex<Option<Scripted>>,
    pub rest_calls: Mutex<Vec<RecordedRequest>>,
    pub graphql_queries: Mutex<Vec<String>>,
}

impl ScriptedControlPlane {
    pub fn new() -> Self {
        Self {
            rest: Mutex::new(VecDeque::new()),
            graphql: Mutex::new(VecDeque::new()),
            graphql_repeat: Mutex::new(None),
            rest_calls: Mutex::new(Vec::new()),
            graphql_queries: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_rest(&self, reply: Scripted) {
        self.rest.lock().await.push_back(reply);
    }

    pub async fn push_graphql(&self, reply: Scripted) {
        self.graphql.lock().await.push_back(reply);
    }

    pub async fn set_graphql_repeat(&self, reply: Scripted) {
        *self.graphql_repeat.lock().await = Some(reply);
    }

    pub async fn rest_call_count(&self) -> usize {
        self.rest_calls.lock().await.len()
    }
}

#[async_trait]
impl ControlPlane for ScriptedControlPlane {
    async fn execute_request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        params: &[(&str, &str)],
        _token: &str,
        _timeout: Duration,
    ) -> Result<Value> {
        self.rest_calls.lock().await.push(RecordedRequest {
            endpoint: endpoint.to_string(),
            method,
            body,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let reply = self
            .rest
            .lock()
            .await
            .pop_front()
            .expect("unscripted REST call");
        reply.into_result()
    }

    async fn run_graphql(
        &self,
        _token: &str,
        query: &str,
        _variables: Value,
        _api_version: &str,
        _timeout: Duration,
    ) -> Result<Value> {
        self.graphql_queries.lock().await.push(query.to_string());

        let reply = self.graphql.lock().await.pop_front();
        match reply {
            Some(reply) => reply.into_result(),
            None => self
                .graphql_repeat
                .lock()
                .await
                .clone()
                .expect("unscripted GraphQL call")
                .into_result(),
        }
    }
}

/// GraphQL repository object with `resource_count` synthetic resources.
///
/// Resource ids follow the `{id}-res-{i}` pattern for assertions.
pub fn repository_json(
    id: &str,
    organization: &str,
    name: &str,
    project: Option<&str>,
    resource_count: usize,
) -> Value {
    let resource_instances: Vec<Value> = (0..resource_count)
        .map(|i| {
            json!({
                "id": format!("{id}-res-{i}"),
                "type": "model",
                "name": format!("resource-{i}"),
                "registeredAt": null,
            })
        })
        .collect();

    json!({
        "id": id,
        "name": name,
        "organization": organization,
        "vcs": VCS_KIND,
        "project": project.map(|p| json!({ "id": p })),
        "lastVerified": null,
        "lastVerifiedSuccess": null,
        "lastVerifiedFailedReason": null,
        "resourceInstances": resource_instances,
    })
}

/// GraphQL `data` payload wrapping a repository list.
pub fn repositories_data(repositories: Vec<Value>) -> Value {
    json!({ "repositories": repositories })
}
