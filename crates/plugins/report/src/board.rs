//! Board report and detailed report.

use epicwatch_core::{EpicCollection, EpicUpdateRecord, IssueFailure};

use crate::{update_day, ReportConfig, NO_UPDATES_MESSAGE};

const NOT_REPORTED: &str = "Not reported";

/// Board report: one section per update, issues that could not be fetched last.
pub(crate) fn board_report(collection: &EpicCollection, config: &ReportConfig) -> String {
    if collection.is_empty() {
        return with_failures(NO_UPDATES_MESSAGE.to_string(), collection.failures());
    }

    let mut output = String::new();
    output.push_str("# EPIC Update Board Report\n\n");
    output.push_str(&format!("**Repository:** {}\n", collection.repo()));
    output.push_str(&format!(
        "**Issues:** {}\n",
        issue_list(collection.issue_numbers())
    ));
    output.push_str(&format!(
        "**Total Updates:** {}\n\n",
        collection.total_updates()
    ));

    for update in collection.updates() {
        output.push_str("---\n\n");
        output.push_str(&update_section(update, &config.web_url));
    }

    with_failures(output, collection.failures())
}

fn update_section(update: &EpicUpdateRecord, web_url: &str) -> String {
    let parsed = &update.parsed_data;
    let mut output = String::new();

    output.push_str(&format!(
        "## Issue #{}: {}\n\n",
        update.issue_number, update.issue_title
    ));
    output.push_str(&format!(
        "🔗 {}/{}/issues/{}\n\n",
        web_url, update.repo, update.issue_number
    ));
    output.push_str(&format!(
        "**Update:** {} by @{}\n\n",
        update_day(update),
        update.author
    ));

    // Work summary
    let work = work_items(update);
    output.push_str("### Work Summary\n\n");
    if work.is_empty() {
        output.push_str("- No work items reported\n");
    } else {
        for item in &work {
            output.push_str(&format!("- {}\n", item));
        }
    }
    output.push('\n');

    // Status
    output.push_str("### Status\n\n");
    if let Some(epic) = &parsed.epic_name {
        output.push_str(&format!("- **Epic:** {}\n", epic));
    }
    if let Some(owner) = &parsed.owner {
        output.push_str(&format!("- **Owner:** {}\n", owner));
    }
    output.push_str(&format!(
        "- **Status:** {}\n",
        parsed.status.as_deref().unwrap_or(NOT_REPORTED)
    ));
    output.push_str(&format!(
        "- **Progress:** {}\n\n",
        parsed.progress.as_deref().unwrap_or(NOT_REPORTED)
    ));

    // Next steps
    output.push_str("### Next Steps\n\n");
    if parsed.next_steps.is_empty() {
        output.push_str("- None reported\n");
    } else {
        for step in &parsed.next_steps {
            output.push_str(&format!("- {}\n", step));
        }
    }
    output.push('\n');

    if !work.is_empty() {
        output.push_str("### Summary\n\n");
        output.push_str(&short_summary(update));
        output.push_str("\n\n");
    }

    output
}

/// Work summary bullets: progress first, then prefixed scope changes, risks
/// and deliverables.
fn work_items(update: &EpicUpdateRecord) -> Vec<String> {
    let parsed = &update.parsed_data;
    let prefixed = |prefix: &str, items: &[String]| {
        items
            .iter()
            .map(|i| format!("{} {}", prefix, i))
            .collect::<Vec<_>>()
    };

    let mut items = parsed.what_happened.clone();
    items.extend(prefixed("Scope change:", &parsed.scope_changes));
    items.extend(prefixed("Risk:", &parsed.risks_blockers));
    items.extend(prefixed("Delivered:", &parsed.metrics_deliverables));
    items
}

fn short_summary(update: &EpicUpdateRecord) -> String {
    let parsed = &update.parsed_data;
    let subject = parsed
        .epic_name
        .clone()
        .unwrap_or_else(|| format!("Issue #{}", update.issue_number));

    let mut parts = Vec::new();
    for (count, singular, plural) in [
        (parsed.what_happened.len(), "progress item", "progress items"),
        (parsed.scope_changes.len(), "scope change", "scope changes"),
        (parsed.risks_blockers.len(), "risk", "risks"),
        (parsed.metrics_deliverables.len(), "deliverable", "deliverables"),
    ] {
        match count {
            0 => {}
            1 => parts.push(format!("1 {}", singular)),
            n => parts.push(format!("{} {}", n, plural)),
        }
    }

    let mut summary = format!("{}: {}", subject, parts.join(", "));
    if let Some(status) = &parsed.status {
        summary.push_str(&format!("; status {}", status));
    }
    if let Some(progress) = &parsed.progress {
        summary.push_str(&format!(", {} complete", progress));
    }
    summary.push('.');
    summary
}

fn issue_list(numbers: &[u64]) -> String {
    numbers
        .iter()
        .map(|n| format!("#{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_failures(mut output: String, failures: &[IssueFailure]) -> String {
    if failures.is_empty() {
        return output;
    }
    if !output.ends_with("\n\n") {
        output.push_str(if output.ends_with('\n') { "\n" } else { "\n\n" });
    }
    output.push_str("---\n\n");
    output.push_str("## Issues Not Retrieved\n\n");
    for failure in failures {
        output.push_str(&format!(
            "- **#{}** ({}): {}\n",
            failure.issue_number, failure.kind, failure.message
        ));
    }
    output
}

/// Full comment bodies, one section per update.
pub fn render_detailed_report(collection: &EpicCollection) -> String {
    if collection.is_empty() {
        return with_failures(NO_UPDATES_MESSAGE.to_string(), collection.failures());
    }

    let mut output = String::new();
    output.push_str("# Detailed EPIC Updates\n\n");
    output.push_str(&format!("**Repository:** {}\n", collection.repo()));
    output.push_str(&format!(
        "**Total Updates:** {}\n\n",
        collection.total_updates()
    ));

    for update in collection.updates() {
        output.push_str(&format!(
            "## Issue #{}: {}\n\n",
            update.issue_number, update.issue_title
        ));
        output.push_str(&format!("**Author:** @{}\n", update.author));
        output.push_str(&format!("**Posted:** {}\n\n", update.created_at));
        output.push_str("**Full Update:**\n\n");
        let fence = code_fence(&update.comment_body);
        output.push_str(&format!("{}markdown\n", fence));
        output.push_str(update.comment_body.trim_end());
        output.push_str(&format!("\n{}\n\n", fence));
        output.push_str("---\n\n");
    }

    with_failures(output, collection.failures())
}

/// A backtick fence longer than any backtick run inside `body`.
fn code_fence(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
