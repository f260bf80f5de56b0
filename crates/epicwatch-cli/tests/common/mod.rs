//! Shared test infrastructure.
//!
//! `FixtureSource` replays GitHub API responses saved under
//! `tests/fixtures/github/` (`issue_{n}.json`, `comments_{n}.json`). An issue
//! without fixtures behaves like a 404; listing returns every open fixture
//! issue updated on or after `since`.

#![allow(dead_code)]

use std::path::PathBuf;

use async_trait::async_trait;
use epicwatch_core::{Error, IssueSource, IssueSummary, RawComment, RepoRef, Result};
use epicwatch_github::{GitHubComment, GitHubIssue};
use serde::de::DeserializeOwned;

/// Directory holding the GitHub fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("github")
}

/// Raw fixture file contents, for serving from a mock server.
pub fn fixture_text(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e))
}

/// Issue source backed by JSON fixtures.
#[derive(Debug, Default)]
pub struct FixtureSource;

impl FixtureSource {
    fn load<T: DeserializeOwned>(&self, name: &str, repo: &RepoRef, number: u64) -> Result<T> {
        let path = fixtures_dir().join(name);
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "Issue #{} not found in {}",
                number, repo
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn summary(issue: GitHubIssue) -> IssueSummary {
    IssueSummary {
        number: issue.number,
        title: issue.title,
        state: issue.state,
        html_url: issue.html_url,
    }
}

#[async_trait]
impl IssueSource for FixtureSource {
    fn source_name(&self) -> &'static str {
        "fixture"
    }

    async fn list_issues(&self, _repo: &RepoRef, since: &str) -> Result<Vec<IssueSummary>> {
        let mut issues = Vec::new();
        for entry in std::fs::read_dir(fixtures_dir())? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if !name.starts_with("issue_") {
                continue;
            }
            let content = std::fs::read_to_string(fixtures_dir().join(&name))?;
            let issue: GitHubIssue = serde_json::from_str(&content)?;
            let updated = issue.updated_at.as_deref().unwrap_or(&issue.created_at);
            if issue.state == "open" && &updated[..10] >= since {
                issues.push(summary(issue));
            }
        }
        Ok(issues)
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueSummary> {
        let issue: GitHubIssue = self.load(&format!("issue_{}.json", number), repo, number)?;
        Ok(summary(issue))
    }

    async fn get_comments(&self, repo: &RepoRef, number: u64) -> Result<Vec<RawComment>> {
        let comments: Vec<GitHubComment> =
            self.load(&format!("comments_{}.json", number), repo, number)?;
        Ok(comments
            .into_iter()
            .map(|c| RawComment {
                id: c.id,
                author: c.user.map_or_else(|| "ghost".to_string(), |u| u.login),
                created_at: c.created_at,
                body: c.body.unwrap_or_default(),
                issue_number: number,
            })
            .collect())
    }
}
