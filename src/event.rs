//! Workflow trigger handling.
//!
//! Actions hands us an event name and a JSON payload file. Only
//! `pull_request` events carry a PR to check; anything else is a
//! misconfigured workflow and is rejected before the payload file is
//! even opened.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::types::{Repo, TriggerError};

/// The only workflow event this check runs on.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: PullRequestEvent,
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    number: u64,
    base: BaseRef,
}

#[derive(Debug, Deserialize)]
struct BaseRef {
    repo: RepoInfo,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    name: String,
    owner: OwnerInfo,
}

#[derive(Debug, Deserialize)]
struct OwnerInfo {
    login: String,
}

/// Identifies the pull request a workflow run was triggered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub repo: Repo,
    pub number: u64,
}

impl TriggerEvent {
    /// Reads the trigger out of the workflow environment.
    ///
    /// The event name is checked first so that a run on the wrong trigger
    /// fails the same way whether or not a payload file exists.
    pub fn load(event_name: &str, payload_path: &Path) -> anyhow::Result<Self> {
        info!(event = event_name, "workflow trigger");
        if event_name != PULL_REQUEST_EVENT {
            return Err(TriggerError::UnsupportedEvent(event_name.to_string()).into());
        }

        let raw = fs::read_to_string(payload_path).with_context(|| {
            format!("failed to read event payload {}", payload_path.display())
        })?;

        Self::from_json(&raw)
    }

    /// Parses a `pull_request` event payload.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let payload: EventPayload =
            serde_json::from_str(raw).context("failed to parse event payload")?;

        let repo = Repo::new(
            &payload.pull_request.base.repo.owner.login,
            &payload.pull_request.base.repo.name,
        )?;

        Ok(Self {
            repo,
            number: payload.pull_request.number,
        })
    }
}
