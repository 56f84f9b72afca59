// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret resolver (§4.C): fetches each non-plugin pipeline secret from the
//! control plane, keyed by scope (`org`/`repo`/`shared`).

use vela_core::{Secret, SecretError, SecretType};
use vela_runtime::VelaClient;

/// The repo a build is running against, needed to resolve relative
/// (org-default / repo-default) secret paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub org: String,
    pub name: String,
}

impl RepoContext {
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }
}

/// Wildcard used for the repo coordinate of an `org`-scoped secret fetch.
pub const ORG_SECRET_WILDCARD: &str = "*";

fn split_n(key: &str, n: usize) -> Option<Vec<&str>> {
    let parts: Vec<&str> = key.splitn(n, '/').collect();
    if parts.len() == n && parts.iter().all(|p| !p.is_empty()) {
        Some(parts)
    } else {
        None
    }
}

/// Parses an `org`-scoped key: optional `org/path`. If the org segment
/// matches the current repo's org it is passed through, otherwise the
/// current repo's org is used as the default. The repo coordinate is
/// always the wildcard `*`.
pub fn parse_org_path(key: &str, repo_org: &str) -> (String, String, String) {
    match split_n(key, 2) {
        Some(parts) if parts[0] == repo_org => {
            (parts[0].to_string(), ORG_SECRET_WILDCARD.to_string(), parts[1].to_string())
        }
        _ => (repo_org.to_string(), ORG_SECRET_WILDCARD.to_string(), key.to_string()),
    }
}

/// Parses a `repo`-scoped key: optional `org/repo/path`. Org and repo
/// segments are used when they match the current repo, otherwise default
/// to the current repo's coordinates.
pub fn parse_repo_path(key: &str, repo_org: &str, repo_name: &str) -> (String, String, String) {
    match split_n(key, 3) {
        Some(parts) => {
            let org = if parts[0] == repo_org {
                parts[0].to_string()
            } else {
                repo_org.to_string()
            };
            let repo = if parts[1] == repo_name {
                parts[1].to_string()
            } else {
                repo_name.to_string()
            };
            (org, repo, parts[2].to_string())
        }
        None => (repo_org.to_string(), repo_name.to_string(), key.to_string()),
    }
}

/// Parses a `shared`-scoped key: `org/team/path`. Both org and team are
/// required and must be non-empty (§8 "Secret path parsing" scenario).
pub fn parse_shared_path(key: &str) -> Result<(String, String, String), SecretError> {
    split_n(key, 3)
        .map(|parts| (parts[0].to_string(), parts[1].to_string(), parts[2].to_string()))
        .ok_or_else(|| SecretError::MalformedPath {
            kind: "shared".to_string(),
            path: key.to_string(),
        })
}

fn resolve_path(
    secret: &Secret,
    repo: &RepoContext,
) -> Result<(String, String, String), SecretError> {
    match secret.kind {
        SecretType::Org => Ok(parse_org_path(&secret.key, &repo.org)),
        SecretType::Repo => Ok(parse_repo_path(&secret.key, &repo.org, &repo.name)),
        SecretType::Shared => parse_shared_path(&secret.key),
    }
}

/// Fetches one non-plugin secret from the control plane and returns a copy
/// of `secret` with `value` overwritten from the response. The pipeline's
/// own copy is left untouched (it is read-only once attached, §3
/// "Ownership") — callers store the returned copy in the engine's
/// `Secrets` map instead of mutating the pipeline in place.
pub async fn resolve_secret<C: VelaClient>(
    secret: &Secret,
    repo: &RepoContext,
    client: &C,
) -> Result<Secret, SecretError> {
    let (org, repo_or_team_or_star, key) = resolve_path(secret, repo)?;
    let fetched = client
        .get_secret(secret.engine, secret.kind, &org, &repo_or_team_or_star, &key)
        .await
        .map_err(|err| SecretError::UnableToRetrieve {
            name: secret.name.clone(),
            reason: err.to_string(),
        })?;
    Ok(Secret {
        value: fetched.value,
        ..secret.clone()
    })
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
