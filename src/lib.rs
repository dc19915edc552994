//! Titlegate: pull request title checking for CI.
//!
//! Validates a pull request's title against a small rule set (bot-author
//! exemption, work-in-progress marker, task-prefix escape, issue-tracker
//! reference pattern) and reports the verdict as a commit status. On a
//! matching title it can append a tracker deep link to the PR description,
//! and fully bot-authored PRs are approved automatically. Designed to run
//! inside a workflow trigger, once per qualifying event.

pub mod cli;
pub mod event;
pub mod github;
pub mod rules;
pub mod run;
pub mod types;

pub use cli::{RunOptions, parse_args};
pub use event::TriggerEvent;
pub use github::GitHub;
pub use run::run_title_check;
pub use types::{
    CheckConfig, CheckState, CommitStatus, ConfigError, Forge, PullRequestSnapshot, Repo,
    RepoError, RunSummary, STATUS_CONTEXT, StatusReport, TaskPrefixPolicy, TrackerReference,
    TriggerError, Verdict,
};
