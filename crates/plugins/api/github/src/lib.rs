//! GitHub issue source for epicwatch.
//!
//! Fetches issues and their comments from the GitHub REST API and maps them
//! to the epicwatch data model.

mod client;
mod types;
mod url;

pub use client::GitHubClient;
pub use types::*;
pub use url::parse_issue_url;

/// Default GitHub API URL.
pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
