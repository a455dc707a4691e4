//! Immutable per-run snapshot of the remote state.
//!
//! The collaborator assembles one [`PullSnapshot`] per run from the GitHub
//! API and hands it to the engine. The engine never mutates it and never
//! reaches back to the network; remote entities it may later overwrite (pull
//! request bodies, prior bot comments) appear here as plain read-only text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One changed file of a pull request.
///
/// `previous_path` is present for renamed/moved files. A rename can move a
/// file out of or into a component directory, so classification must consider
/// both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path after the change.
    pub path: String,
    /// Path before the change, when the file was renamed.
    pub previous_path: Option<String>,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous_path: None,
        }
    }

    pub fn renamed(path: impl Into<String>, previous_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous_path: Some(previous_path.into()),
        }
    }
}

/// A single open pull request as fetched at the start of the run.
///
/// A missing body on the wire is normalized to the empty string before the
/// snapshot is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub body: String,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub files: Vec<ChangedFile>,
}

impl PullRequest {
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label == name)
    }
}

/// The full set of open pull requests, in listing order (newest first as the
/// collaborator provides them). Listing order is what makes report rows and
/// notification payloads reproducible for a given snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullSnapshot {
    pulls: Vec<PullRequest>,
}

impl PullSnapshot {
    pub fn new(pulls: Vec<PullRequest>) -> Self {
        Self { pulls }
    }

    pub fn pulls(&self) -> &[PullRequest] {
        &self.pulls
    }

    pub fn get(&self, number: u64) -> Option<&PullRequest> {
        self.pulls.iter().find(|pull| pull.number == number)
    }

    pub fn len(&self) -> usize {
        self.pulls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulls.is_empty()
    }
}

/// A comment on a pull request authored by the bot identity.
///
/// Which comments count as bot-authored is the collaborator's call (it knows
/// the authenticated user id); the engine only ever sees the surviving ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingComment {
    pub id: u64,
    pub body: String,
}

/// Repository coordinates, used to render pull request links in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Web URL of a pull request in this repository.
    pub fn pull_url(&self, number: u64) -> String {
        let Self { owner, repo } = self;
        format!("https://github.com/{owner}/{repo}/pull/{number}")
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_lookup_by_number() {
        let snapshot = PullSnapshot::new(vec![
            PullRequest {
                number: 9,
                body: String::new(),
                updated_at: Utc::now(),
                labels: vec![],
                files: vec![],
            },
            PullRequest {
                number: 4,
                body: String::new(),
                updated_at: Utc::now(),
                labels: vec!["stale".to_string()],
                files: vec![],
            },
        ]);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(4).is_some_and(|pull| pull.has_label("stale")));
        assert!(snapshot.get(7).is_none());
    }

    #[test]
    fn pull_url_formatting() {
        let repo = RepoRef::new("conan-io", "conan-center-index");
        assert_eq!(
            repo.pull_url(42),
            "https://github.com/conan-io/conan-center-index/pull/42"
        );
        assert_eq!(repo.to_string(), "conan-io/conan-center-index");
    }
}
