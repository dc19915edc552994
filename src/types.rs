use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

/// Name under which this check's status reports appear in the platform UI.
pub const STATUS_CONTEXT: &str = "titlegate";

/// The platform rejects status descriptions longer than this.
pub const STATUS_DESCRIPTION_LIMIT: usize = 140;

/// Outcome state of a title check, as reported to the commit status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Success,
    Pending,
    Failure,
}

impl CheckState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckState::Success => "success",
            CheckState::Pending => "pending",
            CheckState::Failure => "failure",
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status report this check intends to attach to a commit.
///
/// The platform stores reports as an append-only log, so an identical report
/// is never re-emitted; [`StatusReport::matches`] implements that tuple
/// comparison against an existing log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: CheckState,
    pub description: String,
}

impl StatusReport {
    /// Builds a report, truncating the description to the platform bound.
    pub fn new(state: CheckState, description: impl Into<String>) -> Self {
        let mut description = description.into();
        if description.len() > STATUS_DESCRIPTION_LIMIT {
            description.truncate(
                (0..=STATUS_DESCRIPTION_LIMIT)
                    .rev()
                    .find(|n| description.is_char_boundary(*n))
                    .unwrap_or(0),
            );
        }
        Self { state, description }
    }

    /// True when an existing log entry already carries this exact report.
    pub fn matches(&self, existing: &CommitStatus) -> bool {
        existing.context == STATUS_CONTEXT
            && existing.state == self.state.as_str()
            && existing.description.as_deref() == Some(self.description.as_str())
    }
}

/// One entry of a commit's existing status log, as returned by the platform.
///
/// `state` stays a plain string: other tools post states this check never
/// emits (the platform also knows "error"), and an unknown state must not
/// break deserialization of the whole log.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitStatus {
    pub context: String,
    pub state: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Issue-tracker reference extracted from a PR title, e.g. "PROD-123".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerReference {
    pub key: String,
}

impl TrackerReference {
    /// Deep link to the referenced issue under the given tracker base URL.
    pub fn browse_url(&self, base: &Url) -> String {
        format!("{}/browse/{}", base.as_str().trim_end_matches('/'), self.key)
    }
}

/// Validation failures for [`Repo`] coordinates.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("repository owner must be non-empty and contain no '/'")]
    InvalidOwner,
    #[error("repository name must be non-empty and contain no '/'")]
    InvalidName,
}

/// Owner/name coordinates of a repository, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    owner: String,
    name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || owner.contains('/') {
            return Err(RepoError::InvalidOwner);
        }
        if name.is_empty() || name.contains('/') {
            return Err(RepoError::InvalidName);
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything the rules need to know about one pull request, captured once
/// per run. Immutable for the duration of that run.
#[derive(Debug, Clone)]
pub struct PullRequestSnapshot {
    pub repo: Repo,
    pub number: u64,
    pub title: String,
    pub author_login: String,
    pub body: String,
    pub head_sha: String,
    /// Platform account that authored the head commit; absent when the
    /// commit has no linked account. Absent never counts as a bot.
    pub head_commit_author_login: Option<String>,
    pub base_branch: String,
    pub base_repo_private: bool,
}

/// Result of evaluating the rule chain against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub report: StatusReport,
    /// Set when the private-branch tracker rule matched; drives the
    /// body-link side effect.
    pub tracker: Option<TrackerReference>,
    /// Set when the PR author and head commit author are both exempt
    /// identities; independent of the title outcome.
    pub approve: bool,
}

/// How to treat titles that start with the "TASK: " escape prefix.
///
/// The source history disagrees with itself here, so the choice is explicit
/// configuration rather than a silently inherited behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPrefixPolicy {
    /// Report success but flag the prefix as not recommended.
    #[default]
    Warn,
    /// Report failure.
    Fail,
}

impl std::str::FromStr for TaskPrefixPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(TaskPrefixPolicy::Warn),
            "fail" => Ok(TaskPrefixPolicy::Fail),
            other => Err(format!(
                "invalid task prefix policy '{other}' (expected 'warn' or 'fail')"
            )),
        }
    }
}

/// Tunable behaviour of one check run, assembled from CLI flags and the
/// host-provided environment.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Bot identities exempt from the title rules.
    pub exempt: BTreeSet<String>,
    pub task_prefix_policy: TaskPrefixPolicy,
    /// Tracker base URL; link appending is disabled when unset.
    pub tracker_base: Option<Url>,
    /// Evaluate and log, but perform no write calls.
    pub dry_run: bool,
}

impl CheckConfig {
    pub fn is_exempt(&self, login: &str) -> bool {
        self.exempt.contains(login)
    }
}

/// What one run actually did, for logging and assertions.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: StatusReport,
    pub tracker: Option<TrackerReference>,
    /// False when the existing log already carried this exact report, or
    /// under --dry-run.
    pub status_written: bool,
    pub link_appended: bool,
    pub approved: bool,
}

/// Required configuration the host environment failed to supply.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no authentication token found; set INPUT_TOKEN or GITHUB_TOKEN")]
    MissingToken,
    #[error("event name not provided; set --event-name or GITHUB_EVENT_NAME")]
    MissingEventName,
    #[error("event payload path not provided; set --event-path or GITHUB_EVENT_PATH")]
    MissingEventPath,
}

/// The run was triggered by an event this check does not handle.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("invalid event: {0} (titlegate only handles pull_request events)")]
    UnsupportedEvent(String),
}

/// The hosting platform seam.
///
/// Everything the check needs from the platform, as plain request/response
/// calls. Production uses [`crate::GitHub`]; tests substitute a recording
/// mock.
#[async_trait]
pub trait Forge {
    /// Fetches a fresh snapshot of the pull request, including the head
    /// commit's author.
    async fn get_pull_request(&self, repo: &Repo, number: u64) -> Result<PullRequestSnapshot>;

    /// Lists the existing status log for a commit, newest first.
    async fn list_commit_statuses(&self, repo: &Repo, sha: &str) -> Result<Vec<CommitStatus>>;

    /// Appends a status report to a commit's log under [`STATUS_CONTEXT`].
    async fn create_commit_status(
        &self,
        repo: &Repo,
        sha: &str,
        report: &StatusReport,
    ) -> Result<()>;

    /// Replaces the pull request description.
    async fn update_body(&self, repo: &Repo, number: u64, body: &str) -> Result<()>;

    /// Submits an approving review on the pull request.
    async fn approve(&self, repo: &Repo, number: u64) -> Result<()>;
}
