//! GitHub-backed implementation of the [`Forge`] seam.
//!
//! Requests go through octocrab's generic verbs against the REST routes
//! directly, deserialized into crate-local response models that carry only
//! the fields the check reads.

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Deserialize;

use crate::types::{
    CommitStatus, ConfigError, Forge, PullRequestSnapshot, Repo, STATUS_CONTEXT, StatusReport,
};

/// Resolves the API token from the host environment.
///
/// Workflow action inputs arrive as `INPUT_*` variables and take priority;
/// the runner-provided `GITHUB_TOKEN` is the fallback.
pub fn resolve_token() -> Result<String> {
    for key in ["INPUT_TOKEN", "GITHUB_TOKEN"] {
        if let Ok(token) = std::env::var(key) {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }
    Err(ConfigError::MissingToken.into())
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

#[derive(Debug, Deserialize)]
struct HeadRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BaseRepo {
    private: bool,
}

#[derive(Debug, Deserialize)]
struct BaseRef {
    #[serde(rename = "ref")]
    ref_name: String,
    repo: BaseRepo,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    title: String,
    // Null when the description is empty or the account is deleted.
    body: Option<String>,
    user: Option<Account>,
    head: HeadRef,
    base: BaseRef,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    // The platform account linked to the commit author, if any. Distinct
    // from the git-level author identity.
    author: Option<Account>,
}

/// Authenticated GitHub client.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(token: String) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .context("failed to create GitHub client")?;
        Ok(Self { client })
    }

    /// Builds a client from the workflow environment's token.
    pub fn from_env() -> Result<Self> {
        Self::new(resolve_token()?)
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn get_pull_request(&self, repo: &Repo, number: u64) -> Result<PullRequestSnapshot> {
        let route = format!("/repos/{}/{}/pulls/{}", repo.owner(), repo.name(), number);
        let pull: PullResponse = self
            .client
            .get(route, None::<&()>)
            .await
            .with_context(|| format!("failed to fetch pull request {repo}#{number}"))?;

        let commit_route = format!(
            "/repos/{}/{}/commits/{}",
            repo.owner(),
            repo.name(),
            pull.head.sha
        );
        let commit: CommitResponse = self
            .client
            .get(commit_route, None::<&()>)
            .await
            .with_context(|| {
                format!(
                    "failed to fetch head commit {} of {repo}#{number}",
                    pull.head.sha
                )
            })?;

        Ok(PullRequestSnapshot {
            repo: repo.clone(),
            number: pull.number,
            title: pull.title,
            author_login: pull.user.map(|user| user.login).unwrap_or_default(),
            body: pull.body.unwrap_or_default(),
            head_sha: pull.head.sha,
            head_commit_author_login: commit.author.map(|author| author.login),
            base_branch: pull.base.ref_name,
            base_repo_private: pull.base.repo.private,
        })
    }

    async fn list_commit_statuses(&self, repo: &Repo, sha: &str) -> Result<Vec<CommitStatus>> {
        let route = format!(
            "/repos/{}/{}/commits/{}/statuses",
            repo.owner(),
            repo.name(),
            sha
        );
        self.client
            .get(route, None::<&()>)
            .await
            .with_context(|| format!("failed to list commit statuses for {sha} in {repo}"))
    }

    async fn create_commit_status(
        &self,
        repo: &Repo,
        sha: &str,
        report: &StatusReport,
    ) -> Result<()> {
        let route = format!("/repos/{}/{}/statuses/{}", repo.owner(), repo.name(), sha);
        let body = serde_json::json!({
            "state": report.state.as_str(),
            "description": report.description,
            "context": STATUS_CONTEXT,
        });
        let _: serde_json::Value = self
            .client
            .post(route, Some(&body))
            .await
            .with_context(|| format!("failed to create commit status for {sha} in {repo}"))?;
        Ok(())
    }

    async fn update_body(&self, repo: &Repo, number: u64, body: &str) -> Result<()> {
        let route = format!("/repos/{}/{}/pulls/{}", repo.owner(), repo.name(), number);
        let payload = serde_json::json!({ "body": body });
        let _: serde_json::Value = self
            .client
            .patch(route, Some(&payload))
            .await
            .with_context(|| format!("failed to update body of {repo}#{number}"))?;
        Ok(())
    }

    async fn approve(&self, repo: &Repo, number: u64) -> Result<()> {
        let route = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            repo.owner(),
            repo.name(),
            number
        );
        let payload = serde_json::json!({ "event": "APPROVE" });
        let _: serde_json::Value = self
            .client
            .post(route, Some(&payload))
            .await
            .with_context(|| format!("failed to approve {repo}#{number}"))?;
        Ok(())
    }
}
