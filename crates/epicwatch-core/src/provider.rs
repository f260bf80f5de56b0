//! Issue source trait for git hosting services.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IssueSummary, RawComment, RepoRef};

/// Read access to issues and their comments (GitHub, fixtures, mocks).
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Get the source name (e.g., "github")
    fn source_name(&self) -> &'static str;

    /// List open issues updated on or after `since` (`YYYY-MM-DD`).
    /// Pull requests are not issues and are left out.
    async fn list_issues(&self, repo: &RepoRef, since: &str) -> Result<Vec<IssueSummary>>;

    /// Get a single issue by number
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueSummary>;

    /// Get all comments of an issue, oldest first
    async fn get_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<RawComment>>;
}
