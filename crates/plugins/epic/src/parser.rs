//! EPIC update field parser.
//!
//! Walks a comment line by line. Headings select the current section and
//! bold labels (`**Date:** 2025-08-07`) fill scalar fields. Bullets under a
//! known list heading are collected in order until the next heading, labels
//! included.

use std::sync::LazyLock;

use epicwatch_core::input::is_calendar_date;
use epicwatch_core::{ParseError, ParsedFields};
use regex::Regex;
use tracing::debug;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]{0,3}#{1,6}[ \t]+(.*?)[ \t#]*$").unwrap());

/// `**Label:** value`, `- **Label:** value` and `**Label**: value`.
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]\s+)?\*\*([^*]+?)\*\*\s*(.*)$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());

/// `---`, `***`, `___` (spaces allowed between the marks).
static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]{0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]{0,3}>").unwrap());

/// First `_span_`, `*span*`/`**span**` or `` `span` `` standing apart from
/// surrounding words, so `snake_case_name` is left alone.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\W)(?:_([^_]+)_|\*{1,2}([^*]+)\*{1,2}|`([^`]+)`)(?:\W|$)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Date,
    Owner,
    Epic,
    Status,
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// The status block; holds labels only
    Status,
    WhatHappened,
    ScopeChanges,
    RisksBlockers,
    NextSteps,
    MetricsDeliverables,
}

/// Reduce an EPIC update comment to its fields.
///
/// Absent labels and sections stay null or empty. Fails with
/// [`ParseError::NoSections`] when nothing recognizable is found.
pub fn parse_epic_update(body: &str) -> Result<ParsedFields, ParseError> {
    let mut fields = ParsedFields::default();
    let mut section: Option<Section> = None;
    let mut pending: Option<Scalar> = None;
    let mut recognized = false;

    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            pending = None;
            section = section_for(&caps[1]);
            recognized |= section.is_some();
            continue;
        }

        if THEMATIC_BREAK.is_match(line) {
            pending = None;
            continue;
        }

        // Inside a list section a labelled bullet is just another item
        let in_list = matches!(section, Some(s) if s != Section::Status);
        if let Some((scalar, value)) = label_line(line).filter(|_| !in_list) {
            recognized = true;
            pending = None;
            match clean_value(value) {
                Some(value) => set_scalar(&mut fields, scalar, &value),
                None => pending = Some(scalar),
            }
            continue;
        }

        if let Some(scalar) = pending.take() {
            if BLOCKQUOTE.is_match(line) {
                continue;
            }
            let value = BULLET
                .captures(line)
                .and_then(|c| c.get(1))
                .map_or(line, |m| m.as_str());
            if let Some(value) = clean_value(value) {
                set_scalar(&mut fields, scalar, &value);
            }
            continue;
        }

        let Some(list) = list_mut(&mut fields, section) else {
            continue;
        };
        if let Some(item) = BULLET.captures(line).map(|c| c[1].trim().to_string()) {
            if !item.is_empty() {
                list.push(item);
            }
        }
    }

    if !recognized {
        return Err(ParseError::NoSections);
    }
    Ok(fields)
}

/// Accept a literal, calendar-valid `YYYY-MM-DD` date.
pub fn normalize_date(token: &str) -> Result<String, ParseError> {
    let token = token.trim();
    if is_calendar_date(token) {
        Ok(token.to_string())
    } else {
        Err(ParseError::InvalidDate(token.to_string()))
    }
}

fn set_scalar(fields: &mut ParsedFields, scalar: Scalar, value: &str) {
    let slot = match scalar {
        Scalar::Date => &mut fields.date,
        Scalar::Owner => &mut fields.owner,
        Scalar::Epic => &mut fields.epic_name,
        Scalar::Status => &mut fields.status,
        Scalar::Progress => &mut fields.progress,
    };
    // First value wins
    if slot.is_some() {
        return;
    }

    if scalar == Scalar::Date {
        match normalize_date(value) {
            Ok(date) => *slot = Some(date),
            Err(e) => debug!(error = %e, "Ignoring unparseable EPIC update date"),
        }
    } else {
        *slot = Some(value.to_string());
    }
}

fn list_mut(fields: &mut ParsedFields, section: Option<Section>) -> Option<&mut Vec<String>> {
    match section? {
        Section::Status => None,
        Section::WhatHappened => Some(&mut fields.what_happened),
        Section::ScopeChanges => Some(&mut fields.scope_changes),
        Section::RisksBlockers => Some(&mut fields.risks_blockers),
        Section::NextSteps => Some(&mut fields.next_steps),
        Section::MetricsDeliverables => Some(&mut fields.metrics_deliverables),
    }
}

/// Known scalar label and the text after it, if `line` is a label line.
fn label_line(line: &str) -> Option<(Scalar, &str)> {
    let caps = LABEL.captures(line)?;
    let label = caps.get(1)?.as_str().trim();
    let rest = caps.get(2)?.as_str();

    let (label, value) = match label.strip_suffix(':') {
        Some(label) => (label, rest),
        None => (label, rest.strip_prefix(':')?),
    };

    let scalar = match label.trim().to_lowercase().as_str() {
        "date" => Scalar::Date,
        "owner" => Scalar::Owner,
        "epic" | "epic name" => Scalar::Epic,
        "current status" | "status" => Scalar::Status,
        "progress (%)" | "progress" => Scalar::Progress,
        _ => return None,
    };
    Some((scalar, value))
}

fn section_for(heading: &str) -> Option<Section> {
    let key = heading_key(heading);
    let sections = [
        ("what happened", Section::WhatHappened),
        ("scope change", Section::ScopeChanges),
        ("risk", Section::RisksBlockers),
        ("blocker", Section::RisksBlockers),
        ("next step", Section::NextSteps),
        ("metric", Section::MetricsDeliverables),
        ("deliverable", Section::MetricsDeliverables),
    ];

    if key == "status" || key == "current status" {
        return Some(Section::Status);
    }
    sections
        .iter()
        .find(|(prefix, _)| key.starts_with(prefix))
        .map(|(_, section)| *section)
}

/// Lowercase words of a heading, emoji and punctuation dropped.
fn heading_key(heading: &str) -> String {
    heading
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Trimmed value; an emphasized span, when present, is the value.
fn clean_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let value = EMPHASIS
        .captures(raw)
        .and_then(|caps| caps.iter().skip(1).flatten().next())
        .map_or(raw, |m| m.as_str())
        .trim_matches(|c| c == '_' || c == '*' || c == '`')
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}
