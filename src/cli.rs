use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use crate::types::{CheckConfig, ConfigError, TaskPrefixPolicy};

const BUILD_INFO: &str = env!("BUILD_INFO");

/// Identities exempt from the title rules when no --exempt flag is given.
pub const DEFAULT_EXEMPT: &[&str] = &["dependabot[bot]", "dependabot-preview[bot]"];

fn parse_task_prefix_policy(s: &str) -> Result<TaskPrefixPolicy, String> {
    s.parse()
}

#[derive(Parser, Default, Debug)]
#[command(
    about = "Check a pull request title for issue-tracker references and report the verdict as a commit status"
)]
#[command(long_version = BUILD_INFO)]
struct CliArgs {
    /// Workflow event name (only 'pull_request' is handled)
    #[arg(long = "event-name", env = "GITHUB_EVENT_NAME", value_name = "NAME")]
    pub event_name: Option<String>,

    /// Path to the workflow event payload JSON
    #[arg(long = "event-path", env = "GITHUB_EVENT_PATH", value_name = "PATH")]
    pub event_path: Option<PathBuf>,

    /// Tracker base URL for body deep links (link appending is skipped when unset)
    #[arg(
        long = "tracker-url",
        env = "INPUT_TRACKER_URL",
        value_name = "URL",
        value_parser = Url::parse
    )]
    pub tracker_url: Option<Url>,

    /// Exempt identity (can specify multiple or comma-separated; replaces the default dependabot set)
    #[arg(
        long = "exempt",
        env = "INPUT_EXEMPT_AUTHORS",
        value_name = "LOGIN",
        value_delimiter = ','
    )]
    pub exempt: Vec<String>,

    /// How to treat the 'TASK: ' escape prefix: warn or fail
    #[arg(
        long = "task-prefix-policy",
        env = "INPUT_TASK_PREFIX_POLICY",
        value_name = "POLICY",
        default_value = "warn",
        value_parser = parse_task_prefix_policy
    )]
    pub task_prefix_policy: TaskPrefixPolicy,

    /// Evaluate and log, but perform no write calls
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// Everything one check run needs, assembled from flags and environment.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub event_name: String,
    pub event_path: PathBuf,
    pub config: CheckConfig,
}

fn build_run_options(cli: CliArgs) -> Result<RunOptions> {
    let event_name = cli.event_name.ok_or(ConfigError::MissingEventName)?;
    let event_path = cli.event_path.ok_or(ConfigError::MissingEventPath)?;

    let exempt: BTreeSet<String> = if cli.exempt.is_empty() {
        DEFAULT_EXEMPT.iter().map(|s| s.to_string()).collect()
    } else {
        cli.exempt.into_iter().collect()
    };

    Ok(RunOptions {
        event_name,
        event_path,
        config: CheckConfig {
            exempt,
            task_prefix_policy: cli.task_prefix_policy,
            tracker_base: cli.tracker_url,
            dry_run: cli.dry_run,
        },
    })
}

/// Parses command-line arguments into the options for one check run.
///
/// Every flag falls back to the corresponding workflow environment
/// variable, so a bare invocation inside a runner needs no arguments.
pub fn parse_args<I, T>(args: I) -> Result<RunOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = CliArgs::try_parse_from(args)?;
    build_run_options(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_flags() {
        let options = parse_args([
            "titlegate",
            "--event-name",
            "pull_request",
            "--event-path",
            "/tmp/event.json",
            "--tracker-url",
            "https://tracker.example.com",
            "--exempt",
            "renovate[bot],dependabot[bot]",
            "--task-prefix-policy",
            "fail",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(options.event_name, "pull_request");
        assert_eq!(options.event_path, PathBuf::from("/tmp/event.json"));
        assert_eq!(
            options.config.tracker_base.as_ref().unwrap().as_str(),
            "https://tracker.example.com/"
        );
        assert!(options.config.is_exempt("renovate[bot]"));
        assert!(options.config.is_exempt("dependabot[bot]"));
        assert!(!options.config.is_exempt("dependabot-preview[bot]"));
        assert_eq!(options.config.task_prefix_policy, TaskPrefixPolicy::Fail);
        assert!(options.config.dry_run);
    }

    #[test]
    fn defaults_apply_without_optional_flags() {
        // Built directly so the assertions cannot be disturbed by INPUT_*
        // variables present in a hosting workflow.
        let cli = CliArgs {
            event_name: Some("pull_request".to_string()),
            event_path: Some(PathBuf::from("/tmp/event.json")),
            ..CliArgs::default()
        };
        let options = build_run_options(cli).unwrap();

        for login in DEFAULT_EXEMPT {
            assert!(options.config.is_exempt(login));
        }
        assert_eq!(options.config.task_prefix_policy, TaskPrefixPolicy::Warn);
        assert!(options.config.tracker_base.is_none());
        assert!(!options.config.dry_run);
    }

    #[test]
    fn missing_event_name_is_a_config_error() {
        let cli = CliArgs {
            event_path: Some(PathBuf::from("/tmp/event.json")),
            ..CliArgs::default()
        };
        let err = build_run_options(cli).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingEventName)
        );
    }

    #[test]
    fn missing_event_path_is_a_config_error() {
        let cli = CliArgs {
            event_name: Some("pull_request".to_string()),
            ..CliArgs::default()
        };
        let err = build_run_options(cli).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingEventPath)
        );
    }

    #[test]
    fn rejects_unknown_task_prefix_policy() {
        let err = parse_args([
            "titlegate",
            "--event-name",
            "pull_request",
            "--event-path",
            "/tmp/event.json",
            "--task-prefix-policy",
            "strict",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("task prefix policy"));
    }

    #[test]
    fn rejects_malformed_tracker_url() {
        let result = parse_args([
            "titlegate",
            "--event-name",
            "pull_request",
            "--event-path",
            "/tmp/event.json",
            "--tracker-url",
            "not a url",
        ]);
        assert!(result.is_err());
    }
}
