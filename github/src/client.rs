//! The GitHub REST client.
//!
//! One `reqwest::Client` with default headers set at construction. Mutating
//! verbs honor the dry-run flag: the call is logged and succeeds without
//! touching the network, while reads always flow so a dry run still computes
//! and logs every decision.

use conflictbot_core::snapshot::RepoRef;
use reqwest::Response;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::GithubError;
use crate::types::{Actor, Issue, IssueComment, PullFile, PullSummary};

/// Production API endpoint. Tests inject a local mock server instead.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT_VALUE: &str = "conflictbot";

const PER_PAGE: usize = 100;

/// Warn once fewer than this many API calls remain in the current window.
const RATE_LIMIT_WARN_THRESHOLD: u64 = 10;

pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
    repo: RepoRef,
    dry_run: bool,
}

impl GithubClient {
    pub fn new(repo: RepoRef, token: Option<&str>, dry_run: bool) -> Result<Self, GithubError> {
        Self::with_base_url(GITHUB_API_BASE, repo, token, dry_run)
    }

    /// Creates a client against an arbitrary base URL. Used by tests to point
    /// at a mock server.
    pub fn with_base_url(
        base_url: &str,
        repo: RepoRef,
        token: Option<&str>,
        dry_run: bool,
    ) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|_| GithubError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        // Joining relative paths requires the base to end with a slash.
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            repo,
            dry_run,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// All open pull requests, newest first, across every page.
    pub async fn list_open_pulls(&self) -> Result<Vec<PullSummary>, GithubError> {
        let path = format!("repos/{}/pulls", self.repo);
        self.get_paginated(
            &path,
            &[("state", "open"), ("sort", "created"), ("direction", "desc")],
        )
        .await
    }

    /// Changed files of one pull request, across every page.
    pub async fn list_pull_files(&self, number: u64) -> Result<Vec<PullFile>, GithubError> {
        let path = format!("repos/{}/pulls/{number}/files", self.repo);
        self.get_paginated(&path, &[]).await
    }

    /// All comments on a pull request (issue comments), across every page.
    pub async fn list_issue_comments(&self, number: u64) -> Result<Vec<IssueComment>, GithubError> {
        let path = format!("repos/{}/issues/{number}/comments", self.repo);
        self.get_paginated(&path, &[]).await
    }

    /// Comments on a pull request authored by the given user id.
    pub async fn list_comments_by_user(
        &self,
        number: u64,
        user_id: u64,
    ) -> Result<Vec<IssueComment>, GithubError> {
        Ok(self
            .list_issue_comments(number)
            .await?
            .into_iter()
            .filter(|comment| comment.user.id == user_id)
            .collect())
    }

    /// The authenticated user, i.e. the bot identity comments are matched
    /// against.
    pub async fn authenticated_user(&self) -> Result<Actor, GithubError> {
        self.get_json("user", &[]).await
    }

    pub async fn get_issue(&self, number: u64) -> Result<Issue, GithubError> {
        let path = format!("repos/{}/issues/{number}", self.repo);
        self.get_json(&path, &[]).await
    }

    pub async fn create_comment(&self, number: u64, body: &str) -> Result<(), GithubError> {
        if self.dry_run {
            tracing::info!("dry-run: would create comment on #{number}");
            return Ok(());
        }
        let url = self.url(&format!("repos/{}/issues/{number}/comments", self.repo))?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    pub async fn update_comment(&self, comment_id: u64, body: &str) -> Result<(), GithubError> {
        if self.dry_run {
            tracing::info!("dry-run: would update comment {comment_id}");
            return Ok(());
        }
        let url = self.url(&format!("repos/{}/issues/comments/{comment_id}", self.repo))?;
        let response = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    pub async fn update_issue_body(&self, number: u64, body: &str) -> Result<(), GithubError> {
        if self.dry_run {
            tracing::info!("dry-run: would update issue #{number} body");
            return Ok(());
        }
        let url = self.url(&format!("repos/{}/issues/{number}", self.repo))?;
        let response = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url, GithubError> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GithubError> {
        let response = self.http.get(self.url(path)?).query(query).send().await?;
        let response = self.check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Pages through a list endpoint until a short or empty page.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<Vec<T>, GithubError> {
        let mut results = Vec::new();
        let mut page = 1u32;
        loop {
            let mut query: Vec<(&str, String)> = extra
                .iter()
                .map(|&(key, value)| (key, value.to_string()))
                .collect();
            query.push(("per_page", PER_PAGE.to_string()));
            query.push(("page", page.to_string()));

            let batch: Vec<T> = self.get_json(path, &query).await?;
            let batch_len = batch.len();
            results.extend(batch);
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(results)
    }

    async fn check(&self, response: Response) -> Result<Response, GithubError> {
        observe_rate_limit(response.headers());
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(GithubError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Emits a warning when the rate-limit window is nearly exhausted, with the
/// reset time, mirroring what operators need to schedule runs around.
fn observe_rate_limit(headers: &HeaderMap) {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
    };

    let Some(remaining) = header_u64("x-ratelimit-remaining") else {
        return;
    };
    if remaining >= RATE_LIMIT_WARN_THRESHOLD {
        return;
    }

    let used = header_u64("x-ratelimit-used").unwrap_or(0);
    let limit = header_u64("x-ratelimit-limit").unwrap_or(0);
    let reset = header_u64("x-ratelimit-reset")
        .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0))
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::warn!(
        "{used}/{limit} github api calls used, {remaining} remaining until {reset}"
    );
}
