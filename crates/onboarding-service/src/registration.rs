//! Create-or-find repository registrations
//!
//! Registrations are keyed remotely by (vcs, organization, repo name) per
//! customer; the control plane enforces uniqueness with a 409 on duplicate
//! create, so the resolver must tolerate a lost create race.

use hubscan_common::{Error, Result};
use reqwest::Method;
use tracing::{info, warn};

use crate::client::{ControlPlane, GRAPHQL_VERSION, METADATA_TIMEOUT, MUTATION_TIMEOUT};
use crate::models::{
    CreateRepositoryRequest, CreateRepositoryResponse, CustomerContext, RepositoriesData, VCS_KIND,
};

const FIND_REPOSITORY_QUERY: &str = r#"
query FindRepository($customerId: UUID!, $organizationId: UUID) {
    repositories: getRepositories(
        filter: {customerId: $customerId, organizationId: $organizationId}
    ) {
        id
        name
        organization
        project {
            id
        }
        vcs
    }
}
"#;

/// Search for an existing registration matching (organization, repo name).
///
/// A match bound to a *different* project than the one requested is
/// rejected, but a match with no project association is accepted even when
/// the caller asked for a specific project (best-effort reuse).
pub async fn find_existing_registration<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    organization: &str,
    repo_name: &str,
    project_id: Option<&str>,
) -> Result<Option<String>> {
    let data = cp
        .run_graphql(
            token,
            FIND_REPOSITORY_QUERY,
            ctx.graphql_variables(),
            GRAPHQL_VERSION,
            METADATA_TIMEOUT,
        )
        .await?;

    let parsed: RepositoriesData = serde_json::from_value(data)?;

    for repo in parsed.repositories {
        if repo.organization != organization || repo.name != repo_name || repo.vcs != VCS_KIND {
            continue;
        }

        let repo_project = repo.project.as_ref().map(|p| p.id.as_str());
        match repo_project {
            Some(existing) => info!(
                "Found existing registration {} (project {})",
                repo.id, existing
            ),
            None => info!("Found existing registration {} (no project)", repo.id),
        }

        if project_id.is_none() || repo_project.is_none() || repo_project == project_id {
            return Ok(Some(repo.id));
        }

        warn!(
            "Project mismatch on registration {} (wanted {:?}, found {:?})",
            repo.id, project_id, repo_project
        );
    }

    Ok(None)
}

/// Ensure a registration exists for the repository and return its id.
///
/// Lookup failures are logged and treated as "not found" so a flaky read
/// cannot block onboarding; the create's 409 path re-resolves instead.
pub async fn resolve_registration<C: ControlPlane>(
    cp: &C,
    ctx: &CustomerContext,
    token: &str,
    organization: &str,
    repo_name: &str,
    project_id: Option<&str>,
    api_key: Option<&str>,
) -> Result<String> {
    info!(
        "Checking for existing registration: {}/{}",
        organization, repo_name
    );
    match find_existing_registration(cp, ctx, token, organization, repo_name, project_id).await {
        Ok(Some(id)) => {
            info!("Using existing registration {}", id);
            return Ok(id);
        }
        Ok(None) => {}
        Err(e) => warn!("Error searching for existing registration: {}", e),
    }

    let endpoint = format!(
        "/v1/code-scanning/customer/{}/repositories",
        ctx.customer_id
    );
    let body = CreateRepositoryRequest {
        vcs: VCS_KIND.to_string(),
        organization: organization.to_string(),
        repo_name: repo_name.to_string(),
        api_key: api_key.unwrap_or_default().to_string(),
        project_id: project_id.map(str::to_string),
    };

    info!("Creating registration for {}/{}", organization, repo_name);
    let created = cp
        .execute_request(
            &endpoint,
            Method::POST,
            Some(serde_json::to_value(&body)?),
            &[],
            token,
            MUTATION_TIMEOUT,
        )
        .await;

    match created {
        Ok(value) => {
            let response: CreateRepositoryResponse = serde_json::from_value(value)?;
            match response.repository_config_id {
                Some(id) => {
                    info!("Registration created: {}", id);
                    Ok(id)
                }
                // 2xx without an id is still a create failure.
                None => Err(Error::RegistrationCreateFailed { status: 200 }),
            }
        }
        Err(e) if e.transport_status() == Some(409) => {
            info!("Registration already exists (409), re-resolving");
            match find_existing_registration(cp, ctx, token, organization, repo_name, project_id)
                .await
            {
                Ok(Some(id)) => {
                    info!("Found existing registration after 409: {}", id);
                    Ok(id)
                }
                // Likely a project mismatch the caller cannot override.
                _ => Err(Error::RegistrationConflictUnresolved),
            }
        }
        Err(Error::Transport {
            status: Some(status),
            ..
        }) => Err(Error::RegistrationCreateFailed { status }),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{repositories_data, repository_json, Scripted, ScriptedControlPlane};
    use serde_json::json;

    fn ctx() -> CustomerContext {
        CustomerContext::new("cust-1", Some("org-uuid-1".to_string()))
    }

    #[tokio::test]
    async fn test_reuses_match_with_no_project_even_when_project_requested() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![repository_json(
            "reg-1", "org", "repo", None, 0,
        )])))
        .await;

        let id = resolve_registration(&cp, &ctx(), "tok", "org", "repo", Some("proj-1"), None)
            .await
            .unwrap();

        assert_eq!(id, "reg-1");
        // No create call should have been issued.
        assert_eq!(cp.rest_call_count().await, 0);
    }

    #[tokio::test]
    async fn test_match_bound_to_other_project_is_rejected() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![repository_json(
            "reg-1",
            "org",
            "repo",
            Some("other-project"),
            0,
        )])))
        .await;
        cp.push_rest(Scripted::Ok(json!({ "repository_config_id": "reg-2" })))
            .await;

        let id = resolve_registration(&cp, &ctx(), "tok", "org", "repo", Some("proj-1"), None)
            .await
            .unwrap();

        assert_eq!(id, "reg-2");
        let calls = cp.rest_calls.lock().await;
        assert_eq!(
            calls[0].endpoint,
            "/v1/code-scanning/customer/cust-1/repositories"
        );
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["vcs"], "huggingface_hub");
        assert_eq!(body["project_id"], "proj-1");
        assert_eq!(body["api_key"], "");
    }

    #[tokio::test]
    async fn test_conflict_then_successful_lookup() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![]))).await;
        cp.push_rest(Scripted::HttpError(409, "duplicate")).await;
        cp.push_graphql(Scripted::Ok(repositories_data(vec![repository_json(
            "reg-raced",
            "org",
            "repo",
            None,
            0,
        )])))
        .await;

        let id = resolve_registration(&cp, &ctx(), "tok", "org", "repo", None, None)
            .await
            .unwrap();

        assert_eq!(id, "reg-raced");
    }

    #[tokio::test]
    async fn test_conflict_with_no_acceptable_match_is_unresolved() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![]))).await;
        cp.push_rest(Scripted::HttpError(409, "duplicate")).await;
        cp.push_graphql(Scripted::Ok(repositories_data(vec![]))).await;

        let err = resolve_registration(&cp, &ctx(), "tok", "org", "repo", Some("proj-1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RegistrationConflictUnresolved));
    }

    #[tokio::test]
    async fn test_non_conflict_failure_carries_status() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![]))).await;
        cp.push_rest(Scripted::HttpError(500, "boom")).await;

        let err = resolve_registration(&cp, &ctx(), "tok", "org", "repo", None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::RegistrationCreateFailed { status: 500 }
        ));
    }

    #[tokio::test]
    async fn test_lookup_error_is_tolerated_before_create() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::GraphQlError("read API down")).await;
        cp.push_rest(Scripted::Ok(json!({ "repository_config_id": "reg-3" })))
            .await;

        let id = resolve_registration(&cp, &ctx(), "tok", "org", "repo", None, Some("hf_key"))
            .await
            .unwrap();

        assert_eq!(id, "reg-3");
        let calls = cp.rest_calls.lock().await;
        assert_eq!(calls[0].body.as_ref().unwrap()["api_key"], "hf_key");
    }

    #[tokio::test]
    async fn test_matching_requires_exact_identity() {
        let cp = ScriptedControlPlane::new();
        cp.push_graphql(Scripted::Ok(repositories_data(vec![
            repository_json("reg-other-org", "other-org", "repo", None, 0),
            repository_json("reg-other-name", "org", "other-repo", None, 0),
        ])))
        .await;

        let found = find_existing_registration(&cp, &ctx(), "tok", "org", "repo", None)
            .await
            .unwrap();

        assert!(found.is_none());
    }
}
