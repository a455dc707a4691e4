//! Wire types for the slice of the GitHub REST v3 API the bot consumes,
//! plus conversion into the engine's snapshot types.

use chrono::{DateTime, Utc};
use conflictbot_core::snapshot::{ChangedFile, PullRequest};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullSummary {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullSummary {
    /// Joins the summary with its fetched file list into the engine's
    /// snapshot type. A missing body normalizes to the empty string.
    pub fn into_pull_request(self, files: Vec<PullFile>) -> PullRequest {
        PullRequest {
            number: self.number,
            body: self.body.unwrap_or_default(),
            updated_at: self.updated_at,
            labels: self.labels.into_iter().map(|label| label.name).collect(),
            files: files
                .into_iter()
                .map(|file| ChangedFile {
                    path: file.filename,
                    previous_path: file.previous_filename,
                })
                .collect(),
        }
    }
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{n}/files`.
///
/// `previous_filename` is only present for renamed files.
#[derive(Debug, Clone, Deserialize)]
pub struct PullFile {
    pub filename: String,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

/// The author of a comment, or the authenticated user from `GET /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub id: u64,
    pub login: String,
}

/// One entry of `GET /repos/{owner}/{repo}/issues/{n}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub user: Actor,
}

/// `GET /repos/{owner}/{repo}/issues/{n}`. Only the body is interesting,
/// for report change-detection.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub body: Option<String>,
}
