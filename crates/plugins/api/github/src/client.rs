//! GitHub API client implementation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use epicwatch_core::{Error, IssueSource, IssueSummary, RawComment, RepoRef, Result};
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::types::{GitHubComment, GitHubIssue};
use crate::DEFAULT_GITHUB_URL;

/// Items requested per page.
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for a single listing.
const MAX_PAGES: u32 = 50;

/// Issue state requested when listing a repository.
const LIST_STATE: &str = "open";

/// Longest server-requested wait we are willing to sleep through before retrying.
const MAX_RATE_LIMIT_WAIT_SECS: u64 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Author shown for comments whose account no longer exists.
const GHOST_LOGIN: &str = "ghost";

/// GitHub API client.
pub struct GitHubClient {
    base_url: String,
    token: Option<String>,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for api.github.com. Without a token, requests are
    /// sent unauthenticated and subject to the lower anonymous rate limit.
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_GITHUB_URL, token)
    }

    /// Create a client with a custom base URL (GitHub Enterprise, tests).
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("epicwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            retry_delay: DEFAULT_RETRY_DELAY,
            client,
        })
    }

    /// Override the pause before retrying a failed request.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn repo_url(&self, repo: &RepoRef, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, repo.owner, repo.name, endpoint
        )
    }

    /// Build request with common headers.
    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// GET with typed deserialization and a single retry for transient failures.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        match self.get_once(url).await {
            Ok(value) => Ok(value),
            Err(err) => {
                let Some(delay) = self.retry_after(&err) else {
                    return Err(err);
                };
                warn!(
                    url = url,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "GitHub request failed, retrying once"
                );
                tokio::time::sleep(delay).await;
                self.get_once(url).await
            }
        }
    }

    async fn get_once<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = url, "GitHub GET request");

        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// How long to wait before retrying `err`, or `None` when it should not be retried.
    fn retry_after(&self, err: &Error) -> Option<Duration> {
        match err {
            Error::RateLimited {
                retry_after: Some(secs),
                ..
            } if *secs <= MAX_RATE_LIMIT_WAIT_SECS => Some(Duration::from_secs(*secs)),
            Error::RateLimited { .. } => None,
            e if e.is_retryable() => Some(self.retry_delay),
            _ => None,
        }
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let rate_limit = rate_limit_wait(status_code, response.headers());
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "GitHub API error response"
            );

            if let Some(retry_after) = rate_limit {
                return Err(Error::RateLimited {
                    message: rate_limit_message(&message),
                    retry_after,
                });
            }
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

// =============================================================================
// Rate limit detection
// =============================================================================

/// Returns `Some(wait)` when a 403/429 response is a rate limit.
///
/// The inner value is the number of seconds the server asked us to wait,
/// when it said so.
fn rate_limit_wait(status: u16, headers: &HeaderMap) -> Option<Option<u64>> {
    if status != 403 && status != 429 {
        return None;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    };

    let retry_after = header("retry-after").and_then(|v| v.parse::<u64>().ok());
    let exhausted = header("x-ratelimit-remaining").as_deref() == Some("0");

    if retry_after.is_some() {
        return Some(retry_after);
    }
    if exhausted {
        let reset = header("x-ratelimit-reset").and_then(|v| v.parse::<u64>().ok());
        return Some(reset.map(seconds_until));
    }
    if status == 429 {
        return Some(None);
    }
    None
}

fn seconds_until(epoch_secs: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    epoch_secs.saturating_sub(now)
}

fn rate_limit_message(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| "GitHub API rate limit exceeded".to_string());
    format!("{}. Set GITHUB_TOKEN for a higher limit", detail)
}

// =============================================================================
// Mapping functions: GitHub types -> epicwatch types
// =============================================================================

fn map_issue(gh_issue: &GitHubIssue) -> IssueSummary {
    IssueSummary {
        number: gh_issue.number,
        title: gh_issue.title.clone(),
        state: gh_issue.state.clone(),
        html_url: gh_issue.html_url.clone(),
    }
}

fn map_comment(gh_comment: &GitHubComment, issue_number: u64) -> RawComment {
    RawComment {
        id: gh_comment.id,
        author: gh_comment
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_else(|| GHOST_LOGIN.to_string()),
        created_at: gh_comment.created_at.clone(),
        body: gh_comment.body.clone().unwrap_or_default(),
        issue_number,
    }
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl IssueSource for GitHubClient {
    fn source_name(&self) -> &'static str {
        "github"
    }

    async fn list_issues(&self, repo: &RepoRef, since: &str) -> Result<Vec<IssueSummary>> {
        let mut issues = Vec::new();

        for page in 1..=MAX_PAGES {
            let params = [
                format!("state={}", LIST_STATE),
                format!("since={}T00:00:00Z", since),
                format!("per_page={}", PER_PAGE),
                format!("page={}", page),
            ];
            let url = self.repo_url(repo, &format!("/issues?{}", params.join("&")));
            let batch: Vec<GitHubIssue> = self.get(&url).await?;
            let last_page = batch.len() < PER_PAGE;
            issues.extend(
                batch
                    .iter()
                    .filter(|i| i.pull_request.is_none())
                    .map(map_issue),
            );

            if last_page {
                break;
            }
            if page == MAX_PAGES {
                warn!(
                    repo = %repo,
                    pages = MAX_PAGES,
                    "Issue page limit reached, remaining issues skipped"
                );
            }
        }

        debug!(repo = %repo, since = since, count = issues.len(), "Listed issues");
        Ok(issues)
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueSummary> {
        let url = self.repo_url(repo, &format!("/issues/{}", number));
        let gh_issue: GitHubIssue = self.get(&url).await.map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("Issue #{} not found in {}", number, repo)),
            other => other,
        })?;
        Ok(map_issue(&gh_issue))
    }

    async fn get_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<RawComment>> {
        let mut comments = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = self.repo_url(
                repo,
                &format!(
                    "/issues/{}/comments?per_page={}&page={}",
                    number, PER_PAGE, page
                ),
            );
            let batch: Vec<GitHubComment> = self.get(&url).await?;
            let last_page = batch.len() < PER_PAGE;
            comments.extend(batch.iter().map(|c| map_comment(c, number)));

            if last_page {
                break;
            }
            if page == MAX_PAGES {
                warn!(
                    issue = number,
                    pages = MAX_PAGES,
                    "Comment page limit reached, remaining comments skipped"
                );
            }
        }

        debug!(issue = number, count = comments.len(), "Fetched comments");
        Ok(comments)
    }
}
