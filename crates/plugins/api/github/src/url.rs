//! Issue URL helpers.

use std::sync::LazyLock;

use epicwatch_core::{Error, RepoRef, Result};
use regex::Regex;

static ISSUE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/\s]+/([^/\s]+)/([^/\s]+)/issues/(\d+)/?(?:[?#]\S*)?$").unwrap()
});

/// Split `https://github.com/{owner}/{repo}/issues/{number}` into its parts.
pub fn parse_issue_url(url: &str) -> Result<(RepoRef, u64)> {
    let invalid = || {
        Error::Validation(format!(
            "Invalid GitHub issue URL '{}'. Expected: https://github.com/owner/repo/issues/number",
            url
        ))
    };

    let caps = ISSUE_URL.captures(url.trim()).ok_or_else(invalid)?;
    let number = caps[3].parse::<u64>().map_err(|_| invalid())?;
    Ok((RepoRef::new(&caps[1], &caps[2]), number))
}
