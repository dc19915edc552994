//! One end-to-end check run.
//!
//! Strictly sequential: fetch the snapshot, evaluate the rules, then apply
//! the side effects in order (status write, body link, approval). A failing
//! collaborator call aborts the remaining steps; applied effects stay
//! applied.

use anyhow::Result;
use tracing::info;

use crate::event::TriggerEvent;
use crate::rules;
use crate::types::{
    CheckConfig, CommitStatus, Forge, PullRequestSnapshot, RunSummary, STATUS_CONTEXT,
    StatusReport, TrackerReference,
};

/// The most recent status this check previously attached, if any.
fn latest_for_context(statuses: &[CommitStatus]) -> Option<&CommitStatus> {
    statuses
        .iter()
        .filter(|status| status.context == STATUS_CONTEXT)
        .max_by_key(|status| status.created_at)
}

fn body_with_link(body: &str, tracker: &TrackerReference, link: &str) -> String {
    let block = format!("Tracker: [{}]({})", tracker.key, link);
    if body.trim().is_empty() {
        block
    } else {
        format!("{body}\n\n{block}")
    }
}

async fn write_status<F>(
    pr: &PullRequestSnapshot,
    report: &StatusReport,
    config: &CheckConfig,
    forge: &F,
) -> Result<bool>
where
    F: Forge + Sync,
{
    // The status log is append-only, so an unchanged report is not
    // re-emitted. Read back what is there first.
    let statuses = forge.list_commit_statuses(&pr.repo, &pr.head_sha).await?;
    if latest_for_context(&statuses).is_some_and(|existing| report.matches(existing)) {
        info!("commit status already up to date");
        return Ok(false);
    }

    if config.dry_run {
        info!(state = %report.state, "dry run, skipping status write");
        return Ok(false);
    }

    info!(state = %report.state, "updating commit status");
    forge.create_commit_status(&pr.repo, &pr.head_sha, report).await?;
    Ok(true)
}

async fn append_tracker_link<F>(
    pr: &PullRequestSnapshot,
    tracker: Option<&TrackerReference>,
    config: &CheckConfig,
    forge: &F,
) -> Result<bool>
where
    F: Forge + Sync,
{
    let (Some(tracker), Some(base)) = (tracker, config.tracker_base.as_ref()) else {
        return Ok(false);
    };

    let link = tracker.browse_url(base);
    if pr.body.contains(&link) {
        info!(key = %tracker.key, "tracker link already present in body");
        return Ok(false);
    }

    if config.dry_run {
        info!(key = %tracker.key, "dry run, skipping body update");
        return Ok(false);
    }

    info!(key = %tracker.key, link = %link, "appending tracker link to body");
    forge
        .update_body(&pr.repo, pr.number, &body_with_link(&pr.body, tracker, &link))
        .await?;
    Ok(true)
}

async fn submit_approval<F>(
    pr: &PullRequestSnapshot,
    approve: bool,
    config: &CheckConfig,
    forge: &F,
) -> Result<bool>
where
    F: Forge + Sync,
{
    if !approve {
        return Ok(false);
    }

    if config.dry_run {
        info!("dry run, skipping approval");
        return Ok(false);
    }

    info!(author = %pr.author_login, "approving bot pull request");
    forge.approve(&pr.repo, pr.number).await?;
    Ok(true)
}

/// Runs the title check for the pull request named by the trigger.
///
/// Everything is fetched fresh; nothing outlives this call. The returned
/// summary states which side effects were actually performed.
pub async fn run_title_check<F>(
    trigger: &TriggerEvent,
    config: &CheckConfig,
    forge: &F,
) -> Result<RunSummary>
where
    F: Forge + Sync,
{
    let pr = forge.get_pull_request(&trigger.repo, trigger.number).await?;
    info!(
        repo = %pr.repo,
        number = pr.number,
        title = %pr.title,
        author = %pr.author_login,
        "checking pull request title"
    );

    let verdict = rules::evaluate(&pr, config);
    info!(
        state = %verdict.report.state,
        description = %verdict.report.description,
        "verdict"
    );

    let status_written = write_status(&pr, &verdict.report, config, forge).await?;
    let link_appended =
        append_tracker_link(&pr, verdict.tracker.as_ref(), config, forge).await?;
    let approved = submit_approval(&pr, verdict.approve, config, forge).await?;

    Ok(RunSummary {
        report: verdict.report,
        tracker: verdict.tracker,
        status_written,
        link_appended,
        approved,
    })
}
