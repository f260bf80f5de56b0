//! EPIC update template detection.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum trimmed body length, in characters, for a comment to count as an
/// EPIC update. Trigger comments such as `@epic-update` fall well below it.
pub const DEFAULT_MIN_BODY_LEN: usize = 40;

static TEMPLATE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!--\s*epic-update-template\s*-->").unwrap());

static EPIC_UPDATE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]{0,3}#{1,6}[ \t]+.*\bepic\s+update").unwrap());

/// Classifies comment bodies as EPIC updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateMatcher {
    min_body_len: usize,
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self {
            min_body_len: DEFAULT_MIN_BODY_LEN,
        }
    }
}

impl TemplateMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_body_len(min_body_len: usize) -> Self {
        Self { min_body_len }
    }

    pub fn min_body_len(&self) -> usize {
        self.min_body_len
    }

    /// True when the body carries the template marker or an "Epic Update"
    /// heading, and is longer than the minimum length.
    pub fn is_epic_update(&self, body: &str) -> bool {
        let trimmed = body.trim();
        if trimmed.chars().count() <= self.min_body_len {
            return false;
        }
        TEMPLATE_MARKER.is_match(trimmed) || EPIC_UPDATE_HEADING.is_match(trimmed)
    }
}

/// [`TemplateMatcher::is_epic_update`] with the default threshold.
pub fn is_epic_update(body: &str) -> bool {
    TemplateMatcher::default().is_epic_update(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_BODY: &str = "<!-- epic-update-template -->\n## 🚀 Epic Update\n**Date:** 2024-01-15\n**Owner:** @alice\n**Epic:** Test\n### Status\n- **Current status:** _On Track_\n- **Progress (%):** 50%\n### What happened since last update\n- did X\n### Next steps (with owners & dates)\n- do Y";

    #[test]
    fn test_full_template_matches() {
        assert!(is_epic_update(FULL_BODY));
    }

    #[test]
    fn test_trigger_comment_rejected() {
        assert!(!is_epic_update("@epic-update"));
        assert!(!is_epic_update("  @epic-update  \n"));
    }

    #[test]
    fn test_marker_alone_is_too_short() {
        assert!(!is_epic_update("<!-- epic-update-template -->"));
        assert!(!is_epic_update("## Epic Update"));
    }

    #[test]
    fn test_marker_variants() {
        let body = "<!--epic-update-template-->\nSome notes on how the work went this week.";
        assert!(is_epic_update(body));
        let body = "<!--   EPIC-UPDATE-TEMPLATE   -->\nSome notes on how the work went this week.";
        assert!(is_epic_update(body));
    }

    #[test]
    fn test_heading_variants() {
        for heading in [
            "# Epic Update",
            "### 📈 EPIC UPDATE",
            "###### epic update for August",
            "## ✅ Weekly Epic Update",
        ] {
            let body = format!("{}\n**Date:** 2025-08-07\n**Owner:** @bob", heading);
            assert!(is_epic_update(&body), "heading not matched: {}", heading);
        }
    }

    #[test]
    fn test_words_outside_heading_do_not_match() {
        let body = "Please post an epic update here when you get a chance, thanks a lot!";
        assert!(!is_epic_update(body));
    }

    #[test]
    fn test_unrelated_long_comment() {
        let body = "Looks good to me. I left a few notes on the data loader, nothing blocking.";
        assert!(!is_epic_update(body));
    }

    #[test]
    fn test_custom_threshold() {
        let body = "## Epic Update\n- done";
        assert!(!is_epic_update(body));
        assert!(TemplateMatcher::with_min_body_len(5).is_epic_update(body));
        assert!(!TemplateMatcher::with_min_body_len(500).is_epic_update(FULL_BODY));
    }

    #[test]
    fn test_threshold_counts_characters() {
        // 41 characters, more bytes
        let body = format!("## Epic Update {}", "é".repeat(26));
        assert_eq!(body.chars().count(), 41);
        assert!(is_epic_update(&body));

        let body = format!("## Epic Update {}", "é".repeat(25));
        assert!(!is_epic_update(&body));
    }
}
