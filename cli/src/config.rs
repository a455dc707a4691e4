//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;
use conflictbot_core::component::DEFAULT_COMPONENT_ROOT;
use conflictbot_core::snapshot::RepoRef;
use conflictbot_github::GITHUB_API_BASE;

/// Detects open pull requests touching the same recipe and posts idempotent
/// conflict notifications.
#[derive(Debug, Parser)]
#[command(name = "conflictbot", version)]
pub struct Cli {
    /// Repository to watch, as owner/name.
    #[arg(long, default_value = "conan-io/conan-center-index", value_parser = parse_repo)]
    pub repo: RepoRef,

    /// API token. Without one, reads are rate-limited and mutations fail.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Tracking issue whose body mirrors the report.
    #[arg(long, env = "CONFLICTBOT_ISSUE")]
    pub issue: Option<u64>,

    /// Where to persist the rendered report.
    #[arg(long, default_value = "index.md")]
    pub report_path: PathBuf,

    /// Top-level directory holding the components.
    #[arg(long, default_value = DEFAULT_COMPONENT_ROOT)]
    pub component_root: String,

    /// Compute and log all decisions without mutating anything remote.
    #[arg(long)]
    pub dry_run: bool,

    /// API base URL override (GitHub Enterprise, tests).
    #[arg(long, default_value = GITHUB_API_BASE, hide = true)]
    pub api_base: String,
}

fn parse_repo(value: &str) -> Result<RepoRef, String> {
    match value.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(RepoRef::new(owner, repo))
        }
        _ => Err(format!("expected owner/name, got `{value}`")),
    }
}
