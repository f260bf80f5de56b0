//! Domain types shared by the collector, renderers, and issue sources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// Repository
// =============================================================================

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if is_repo_segment(owner) && is_repo_segment(name) => {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::Validation(format!(
                "Invalid repository format: '{}'. Use 'org/repo' format.",
                s
            ))),
        }
    }
}

fn is_repo_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

// =============================================================================
// Issue source data
// =============================================================================

/// Issue metadata as returned by an issue source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// A comment on an issue, as fetched. Never modified after the fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    pub id: u64,
    pub author: String,
    pub created_at: String,
    pub body: String,
    pub issue_number: u64,
}

// =============================================================================
// Parsed EPIC updates
// =============================================================================

/// Structured fields extracted from an EPIC update comment.
///
/// Scalars are `None` when their label is absent; lists are empty, never null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    /// Always `YYYY-MM-DD` when present
    pub date: Option<String>,
    pub owner: Option<String>,
    pub epic_name: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    #[serde(default)]
    pub what_happened: Vec<String>,
    #[serde(default)]
    pub scope_changes: Vec<String>,
    #[serde(default)]
    pub risks_blockers: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub metrics_deliverables: Vec<String>,
}

impl ParsedFields {
    /// Whether any of the list sections carries an item.
    pub fn has_items(&self) -> bool {
        !(self.what_happened.is_empty()
            && self.scope_changes.is_empty()
            && self.risks_blockers.is_empty()
            && self.next_steps.is_empty()
            && self.metrics_deliverables.is_empty())
    }
}

/// An EPIC update comment that passed the template matcher and was parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpicUpdateRecord {
    pub issue_number: u64,
    pub issue_title: String,
    pub comment_id: u64,
    pub comment_body: String,
    pub author: String,
    pub created_at: String,
    pub repo: String,
    pub parsed_data: ParsedFields,
}

/// An issue that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFailure {
    pub issue_number: u64,
    /// Failure category, see [`Error::kind`]
    pub kind: String,
    pub message: String,
}

impl IssueFailure {
    pub fn from_error(issue_number: u64, error: &Error) -> Self {
        Self {
            issue_number,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

// =============================================================================
// Collection
// =============================================================================

/// All EPIC updates gathered in one run, plus the issues that failed.
///
/// Built once and read-only afterwards; `total_updates` always equals the
/// number of updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EpicCollectionRepr")]
pub struct EpicCollection {
    total_updates: usize,
    repo: String,
    issue_numbers: Vec<u64>,
    updates: Vec<EpicUpdateRecord>,
    #[serde(default)]
    failures: Vec<IssueFailure>,
}

#[derive(Deserialize)]
struct EpicCollectionRepr {
    repo: String,
    #[serde(default)]
    issue_numbers: Vec<u64>,
    #[serde(default)]
    updates: Vec<EpicUpdateRecord>,
    #[serde(default)]
    failures: Vec<IssueFailure>,
}

impl From<EpicCollectionRepr> for EpicCollection {
    fn from(repr: EpicCollectionRepr) -> Self {
        Self::new(repr.repo, repr.issue_numbers, repr.updates, repr.failures)
    }
}

impl EpicCollection {
    pub fn new(
        repo: impl Into<String>,
        issue_numbers: Vec<u64>,
        updates: Vec<EpicUpdateRecord>,
        failures: Vec<IssueFailure>,
    ) -> Self {
        Self {
            total_updates: updates.len(),
            repo: repo.into(),
            issue_numbers,
            updates,
            failures,
        }
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn issue_numbers(&self) -> &[u64] {
        &self.issue_numbers
    }

    pub fn updates(&self) -> &[EpicUpdateRecord] {
        &self.updates
    }

    pub fn failures(&self) -> &[IssueFailure] {
        &self.failures
    }

    pub fn total_updates(&self) -> usize {
        self.total_updates
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

// =============================================================================
// Date filter
// =============================================================================

/// Which parsed dates a collection keeps.
///
/// Dates are normalized to `YYYY-MM-DD`, so string comparison orders them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateFilter {
    /// Keep every record, dated or not
    #[default]
    Any,
    /// Keep records dated exactly this day
    On(String),
    /// Keep records dated within `start..=end`
    Range { start: String, end: String },
}

impl DateFilter {
    /// Whether a record with this parsed date is kept.
    pub fn matches(&self, date: Option<&str>) -> bool {
        match (self, date) {
            (DateFilter::Any, _) => true,
            (_, None) => false,
            (DateFilter::On(target), Some(date)) => date == target,
            (DateFilter::Range { start, end }, Some(date)) => {
                start.as_str() <= date && date <= end.as_str()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DateFilter::Any)
    }
}
