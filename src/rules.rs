//! The title rule chain.
//!
//! Pure and total: every snapshot produces exactly one verdict, chosen by
//! the first matching rule. Private and public repositories run different
//! chains because a tracker key that is mandatory internally must not leak
//! from a public repository; the branch is picked up front on repository
//! visibility rather than woven into one chain.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{
    CheckConfig, CheckState, PullRequestSnapshot, StatusReport, TaskPrefixPolicy, TrackerReference,
    Verdict,
};

/// Literal marker anywhere in a title that parks the PR as not mergeable.
pub const WIP_MARKER: &str = "WIP";

/// Escape prefix that bypasses the tracker-reference requirement.
pub const TASK_PREFIX: &str = "TASK: ";

static TRACKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]+-\d+): .*$").expect("tracker reference pattern must compile")
});

/// Extracts the tracker issue key from a title shaped like "PROD-123: ...".
pub fn tracker_reference(title: &str) -> Option<TrackerReference> {
    TRACKER_PATTERN.captures(title).map(|captures| TrackerReference {
        key: captures[1].to_string(),
    })
}

/// Runs the rule chain for one snapshot.
pub fn evaluate(pr: &PullRequestSnapshot, config: &CheckConfig) -> Verdict {
    // Approval is an authorship question, decided independently of whatever
    // the title rules conclude.
    let approve = config.is_exempt(&pr.author_login)
        && pr
            .head_commit_author_login
            .as_deref()
            .is_some_and(|login| config.is_exempt(login));

    let (report, tracker) = if pr.base_repo_private {
        evaluate_private(pr, config)
    } else {
        evaluate_public(pr, config)
    };

    Verdict {
        report,
        tracker,
        approve,
    }
}

fn evaluate_private(
    pr: &PullRequestSnapshot,
    config: &CheckConfig,
) -> (StatusReport, Option<TrackerReference>) {
    if config.is_exempt(&pr.author_login) {
        return (
            StatusReport::new(
                CheckState::Success,
                format!("No tracker reference required - PR is from {}", pr.author_login),
            ),
            None,
        );
    }

    if pr.title.contains(WIP_MARKER) {
        return (
            StatusReport::new(
                CheckState::Pending,
                "Work In Progress - change PR title to enable merging",
            ),
            None,
        );
    }

    if pr.title.starts_with(TASK_PREFIX) {
        let report = match config.task_prefix_policy {
            TaskPrefixPolicy::Warn => StatusReport::new(
                CheckState::Success,
                "WARNING! Use of 'TASK' prefix is not currently recommended",
            ),
            TaskPrefixPolicy::Fail => StatusReport::new(
                CheckState::Failure,
                "Use of 'TASK' prefix is not allowed - use a tracker reference",
            ),
        };
        return (report, None);
    }

    if let Some(tracker) = tracker_reference(&pr.title) {
        return (
            StatusReport::new(CheckState::Success, "PR title contains tracker reference"),
            Some(tracker),
        );
    }

    (
        StatusReport::new(
            CheckState::Failure,
            "PR title does not start with tracker reference, eg. 'PROD-123: '",
        ),
        None,
    )
}

// Public repositories invert the tracker rule: internal issue keys must not
// appear at all. No escape prefix exists on this branch, and no tracker link
// is ever appended.
fn evaluate_public(
    pr: &PullRequestSnapshot,
    config: &CheckConfig,
) -> (StatusReport, Option<TrackerReference>) {
    if config.is_exempt(&pr.author_login) {
        return (
            StatusReport::new(
                CheckState::Success,
                format!("No tracker reference check - PR is from {}", pr.author_login),
            ),
            None,
        );
    }

    if pr.title.contains(WIP_MARKER) {
        return (
            StatusReport::new(
                CheckState::Pending,
                "Work In Progress - change PR title to enable merging",
            ),
            None,
        );
    }

    if tracker_reference(&pr.title).is_some() {
        return (
            StatusReport::new(
                CheckState::Failure,
                "PR title must not expose internal tracker references in a public repository",
            ),
            None,
        );
    }

    (
        StatusReport::new(CheckState::Success, "No tracker reference required"),
        None,
    )
}
