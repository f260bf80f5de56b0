//! Condensed status summary.

use std::collections::BTreeMap;

use epicwatch_core::{EpicCollection, EpicUpdateRecord};

use crate::{update_day, NO_UPDATES_MESSAGE};

const UNKNOWN: &str = "n/a";

/// Status counts, then one block per issue (ascending) with a line per
/// update showing only date, status and progress.
pub fn render_status_summary(collection: &EpicCollection) -> String {
    if collection.is_empty() {
        return NO_UPDATES_MESSAGE.to_string();
    }

    let mut output = String::new();
    output.push_str("# EPIC Status Summary\n\n");
    output.push_str(&format!("**Repository:** {}\n", collection.repo()));
    output.push_str(&format!(
        "**Total EPIC Updates:** {}\n\n",
        collection.total_updates()
    ));

    output.push_str("## Status Breakdown\n\n");
    for (status, count) in status_counts(collection.updates()) {
        let noun = if count == 1 { "update" } else { "updates" };
        output.push_str(&format!("- **{}:** {} {}\n", status, count, noun));
    }
    output.push('\n');

    let mut by_issue: BTreeMap<u64, Vec<&EpicUpdateRecord>> = BTreeMap::new();
    for update in collection.updates() {
        by_issue.entry(update.issue_number).or_default().push(update);
    }

    for (number, updates) in by_issue {
        output.push_str(&format!("## Issue #{}: {}\n\n", number, updates[0].issue_title));
        for update in updates {
            let parsed = &update.parsed_data;
            output.push_str(&format!(
                "- {} | {} | {}\n",
                update_day(update),
                parsed.status.as_deref().unwrap_or(UNKNOWN),
                parsed.progress.as_deref().unwrap_or(UNKNOWN)
            ));
        }
        output.push('\n');
    }

    output
}

/// Status counts, most common first, ties by name.
fn status_counts(updates: &[EpicUpdateRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for update in updates {
        let status = update
            .parsed_data
            .status
            .clone()
            .unwrap_or_else(|| "Not reported".to_string());
        *counts.entry(status).or_default() += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
