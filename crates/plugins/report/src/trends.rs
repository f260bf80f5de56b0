//! Trend analysis over a collection.

use std::collections::{BTreeMap, BTreeSet};

use epicwatch_core::EpicCollection;

use crate::posted_day;

const TOP_N: usize = 5;

/// Totals, contributors, most active issues and the busiest day.
pub fn render_trend_analysis(collection: &EpicCollection) -> String {
    if collection.is_empty() {
        return "No EPIC updates found for analysis.".to_string();
    }

    let updates = collection.updates();
    let total = updates.len();

    let mut authors: BTreeMap<&str, usize> = BTreeMap::new();
    let mut issues: BTreeMap<u64, usize> = BTreeMap::new();
    let mut titles: BTreeMap<u64, &str> = BTreeMap::new();
    let mut days: BTreeMap<&str, usize> = BTreeMap::new();
    for update in updates {
        *authors.entry(update.author.as_str()).or_default() += 1;
        *issues.entry(update.issue_number).or_default() += 1;
        titles
            .entry(update.issue_number)
            .or_insert(update.issue_title.as_str());
        *days.entry(posted_day(update)).or_default() += 1;
    }
    let unique_issues = updates
        .iter()
        .map(|u| u.issue_number)
        .collect::<BTreeSet<_>>()
        .len();

    let mut output = String::new();
    output.push_str("# EPIC Updates Trend Analysis\n\n");
    output.push_str(&format!("**Repository:** {}\n\n", collection.repo()));

    output.push_str("## Key Metrics\n\n");
    output.push_str(&format!("- **Total EPIC Updates:** {}\n", total));
    output.push_str(&format!(
        "- **Unique Issues with Updates:** {}\n",
        unique_issues
    ));
    output.push_str(&format!("- **Active Contributors:** {}\n", authors.len()));
    output.push_str(&format!(
        "- **Average Updates per Issue:** {:.1}\n\n",
        total as f64 / unique_issues as f64
    ));

    output.push_str("## Top Contributors\n\n");
    for (author, count) in most_common(authors).into_iter().take(TOP_N) {
        output.push_str(&format!("- **@{}:** {} updates\n", author, count));
    }

    output.push_str("\n## Most Active Issues\n\n");
    for (number, count) in most_common(issues).into_iter().take(TOP_N) {
        output.push_str(&format!(
            "- **Issue #{}:** {} updates - {}\n",
            number,
            count,
            titles.get(&number).copied().unwrap_or_default()
        ));
    }

    output.push_str("\n## Update Frequency\n\n");
    output.push_str(&format!(
        "- **Average daily updates:** {:.1}\n",
        total as f64 / days.len() as f64
    ));
    if let Some((day, count)) = most_common(days).into_iter().next() {
        output.push_str(&format!("- **Busiest day:** {} ({} updates)\n", day, count));
    }

    output
}

/// Entries by descending count; equal counts keep key order.
fn most_common<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
