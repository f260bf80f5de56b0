//! GitHub API response types.
//!
//! These types represent the raw JSON responses from GitHub API.
//! They are deserialized and then mapped to epicwatch types.

use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// GitHub user representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
}

// =============================================================================
// Issue
// =============================================================================

/// GitHub issue representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub user: Option<GitHubUser>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Present when the "issue" is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

// =============================================================================
// Comments
// =============================================================================

/// GitHub issue comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComment {
    pub id: u64,
    /// Null for some bot and migrated comments
    #[serde(default)]
    pub body: Option<String>,
    /// Null when the author account was deleted
    #[serde(default)]
    pub user: Option<GitHubUser>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}
