//! Validation of user-supplied input: repository, dates, and issue lists.
//!
//! Everything here runs before any network call; failures are
//! [`Error::Validation`].

use std::path::Path;
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use tracing::warn;

use crate::types::{DateFilter, RepoRef};
use crate::{Error, Result};

/// Look-back used by a repository crawl without explicit dates.
pub const DEFAULT_DAYS_BACK: u32 = 30;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Validate an `org/repo` string.
pub fn validate_repo(repo: &str) -> Result<RepoRef> {
    repo.parse()
}

/// Validate a `YYYY-MM-DD` date and return it unchanged.
pub fn validate_date(date: &str) -> Result<String> {
    let date = date.trim();
    if is_calendar_date(date) {
        Ok(date.to_string())
    } else {
        Err(Error::Validation(format!(
            "Invalid date format: '{}'. Use YYYY-MM-DD format.",
            date
        )))
    }
}

/// Whether `s` is literally `YYYY-MM-DD` and names a real day.
pub fn is_calendar_date(s: &str) -> bool {
    DATE_SHAPE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Build a date filter from a target date and an optional inclusive end.
pub fn date_filter(date: Option<&str>, end_date: Option<&str>) -> Result<DateFilter> {
    match (date, end_date) {
        (None, None) => Ok(DateFilter::Any),
        (Some(date), None) => Ok(DateFilter::On(validate_date(date)?)),
        (None, Some(_)) => Err(Error::Validation(
            "An end date requires a start date".to_string(),
        )),
        (Some(start), Some(end)) => {
            let start = validate_date(start)?;
            let end = validate_date(end)?;
            if end < start {
                return Err(Error::Validation(format!(
                    "End date {} is before start date {}",
                    end, start
                )));
            }
            Ok(DateFilter::Range { start, end })
        }
    }
}

/// Inclusive `(start, end)` window for a repository crawl.
///
/// An explicit start wins over `days_back` and runs to `end_date`, or to
/// `today` without one. Otherwise the window is the last `days_back` days
/// (default [`DEFAULT_DAYS_BACK`]) up to `today`.
pub fn crawl_window(
    days_back: Option<u32>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> Result<(String, String)> {
    let start = match (start_date, end_date) {
        (Some(start), _) => start.to_string(),
        (None, Some(_)) => {
            return Err(Error::Validation(
                "An end date requires a start date".to_string(),
            ))
        }
        (None, None) => {
            let days = days_back.unwrap_or(DEFAULT_DAYS_BACK);
            today
                .checked_sub_days(Days::new(u64::from(days)))
                .ok_or_else(|| Error::Validation(format!("days_back {} is out of range", days)))?
                .format("%Y-%m-%d")
                .to_string()
        }
    };
    let today = today.format("%Y-%m-%d").to_string();

    match date_filter(Some(start.as_str()), Some(end_date.unwrap_or(today.as_str())))? {
        DateFilter::Range { start, end } => Ok((start, end)),
        _ => Err(Error::Validation("Invalid crawl window".to_string())),
    }
}

/// Parse issue numbers separated by commas and/or newlines.
///
/// Lines starting with `#` are comments. Invalid tokens are skipped with a
/// warning; duplicates keep their first position.
pub fn parse_issue_numbers(input: &str) -> Vec<u64> {
    let mut numbers = Vec::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for token in line.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.parse::<u64>() {
                Ok(number) if number > 0 => {
                    if !numbers.contains(&number) {
                        numbers.push(number);
                    }
                }
                _ => warn!(token = token, "Skipping invalid issue number"),
            }
        }
    }

    numbers
}

/// Read issue numbers from a file (one per line or comma-separated).
pub fn read_issues_from_file(path: &Path) -> Result<Vec<u64>> {
    if !path.is_file() {
        return Err(Error::Validation(format!(
            "Issue file '{}' not found",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Validation(format!(
            "Failed to read issue file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(parse_issue_numbers(&contents))
}

/// Fail when no usable issue number was given.
pub fn require_issues(numbers: Vec<u64>) -> Result<Vec<u64>> {
    if numbers.is_empty() {
        Err(Error::Validation("No valid issue numbers found".to_string()))
    } else {
        Ok(numbers)
    }
}
