//! Repository spec contracts and configuration-string parsing
//!
//! A batch of repositories to onboard is supplied as a single string, either
//! a JSON array/object of full spec objects or a comma-separated list of
//! `organization/repo_name[@revision]` tokens.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Revision assumed when a token carries no `@revision` suffix.
pub const DEFAULT_REVISION: &str = "main";

/// One external repository to onboard into the scanning inventory.
///
/// Serde names match the JSON configuration form (`organization_id`,
/// `repo_name`, ...). Fields default so partially-specified JSON entries
/// still parse; the batch driver skips entries with an empty organization
/// or repo name rather than the parser rejecting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    /// Organization or user owning the repository (e.g. "PaddlePaddle").
    #[serde(rename = "organization_id", default)]
    pub organization: String,

    /// Repository name (e.g. "PaddleOCR-VL-1.5").
    #[serde(default)]
    pub repo_name: String,

    /// API key for private repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Git revision. Informational only: the remote scan always targets the
    /// default branch, so a non-"main" value is retained but never used.
    #[serde(default = "default_revision")]
    pub revision: String,
}

fn default_revision() -> String {
    DEFAULT_REVISION.to_string()
}

impl RepositorySpec {
    /// Build a spec for the default revision with no API key.
    pub fn new(organization: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            repo_name: repo_name.into(),
            api_key: None,
            revision: default_revision(),
        }
    }

    /// Parse one `org/repo[@revision]` token.
    pub fn parse_token(token: &str) -> Result<Self> {
        let Some((organization, rest)) = token.split_once('/') else {
            return Err(Error::InvalidSpec(format!(
                "'{token}' (expected 'org/repo')"
            )));
        };

        let (repo_name, revision) = match rest.split_once('@') {
            Some((name, revision)) => (name.trim(), revision.trim()),
            None => (rest.trim(), DEFAULT_REVISION),
        };

        Ok(Self {
            organization: organization.trim().to_string(),
            repo_name: repo_name.to_string(),
            api_key: None,
            revision: revision.to_string(),
        })
    }

    /// `organization/repo_name` display form.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.organization, self.repo_name)
    }
}

/// Parse the repository-list configuration string.
///
/// Tries JSON first (an array of spec objects, or a single object). Anything
/// else is treated as a comma-separated token list. Invalid entries are
/// skipped with a warning; the result is always a (possibly empty) list.
pub fn parse_repository_specs(raw: &str) -> Vec<RepositorySpec> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        match value {
            Value::Array(entries) => {
                return entries
                    .into_iter()
                    .filter_map(|entry| match serde_json::from_value(entry) {
                        Ok(spec) => Some(spec),
                        Err(e) => {
                            warn!("Skipping invalid repository spec entry: {}", e);
                            None
                        }
                    })
                    .collect();
            }
            Value::Object(_) => match serde_json::from_value(value) {
                Ok(spec) => return vec![spec],
                Err(e) => {
                    warn!("Skipping invalid repository spec object: {}", e);
                    return Vec::new();
                }
            },
            // Scalar JSON (a bare number, etc.) falls through to the
            // simple token format, matching the lenient input contract.
            _ => {}
        }
    }

    parse_simple_tokens(raw)
}

/// Parse the `org/repo[@revision]` comma-separated form.
fn parse_simple_tokens(raw: &str) -> Vec<RepositorySpec> {
    let mut specs = Vec::new();

    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        match RepositorySpec::parse_token(token) {
            Ok(spec) => {
                if spec.revision != DEFAULT_REVISION {
                    warn!(
                        "Revision '@{}' on '{}' will be ignored (scanning uses the default branch)",
                        spec.revision, token
                    );
                }
                specs.push(spec);
            }
            Err(e) => warn!("Skipping repository token: {}", e),
        }
    }

    specs
}
