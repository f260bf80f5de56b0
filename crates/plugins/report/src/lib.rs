//! Report rendering for collected EPIC updates.
//!
//! Turns an [`EpicCollection`] into the formats people read:
//!
//! - **Board report**: one Markdown section per update
//! - **Status summary**: status counts plus one line per update
//! - **Detailed report**: full comment bodies
//! - **Trend analysis**: contributors, active issues, busiest day
//! - **JSON envelope**: everything above plus the raw collection
//!
//! Rendering is pure. The only timestamp in any output is the one the caller
//! puts in [`ReportMetadata`].
//!
//! # Example
//!
//! ```ignore
//! use epicwatch_report::{ReportMetadata, ReportRenderer};
//!
//! let renderer = ReportRenderer::new();
//! let envelope = renderer.json(&collection, &ReportMetadata {
//!     target_date: Some("2025-08-07".into()),
//!     generated_at: now,
//! });
//! epicwatch_report::write_report(&path, &envelope)?;
//! ```

pub mod board;
pub mod envelope;
pub mod summary;
pub mod trends;

pub use envelope::{render_json, write_report, ReportEnvelope, ReportMetadata};

use std::fmt;
use std::str::FromStr;

use epicwatch_core::{EpicCollection, EpicUpdateRecord, Error, Result};

/// Default base for issue links.
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Message used when a collection holds no updates.
pub const NO_UPDATES_MESSAGE: &str = "No EPIC updates found for the specified period.";

/// Output format selector for tools that render on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// The collection as pretty JSON
    Json,
    #[default]
    BoardReport,
    Summary,
    Detailed,
    Trends,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "raw_data" => Ok(ReportFormat::Json),
            "board_report" | "board" | "executive" => Ok(ReportFormat::BoardReport),
            "summary" | "status_summary" => Ok(ReportFormat::Summary),
            "detailed" => Ok(ReportFormat::Detailed),
            "trends" => Ok(ReportFormat::Trends),
            other => Err(Error::Validation(format!(
                "Unknown format '{}'. Use one of: json, board_report, summary, detailed, trends",
                other
            ))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Json => "json",
            ReportFormat::BoardReport => "board_report",
            ReportFormat::Summary => "summary",
            ReportFormat::Detailed => "detailed",
            ReportFormat::Trends => "trends",
        };
        f.write_str(name)
    }
}

/// Configuration for report rendering.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Base for issue links, e.g. `https://github.com`
    pub web_url: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

/// Renders collections with a shared configuration.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Use a different base for issue links.
    pub fn with_web_url(web_url: impl Into<String>) -> Self {
        Self::with_config(ReportConfig {
            web_url: web_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn board_report(&self, collection: &EpicCollection) -> String {
        board::board_report(collection, &self.config)
    }

    pub fn status_summary(&self, collection: &EpicCollection) -> String {
        summary::render_status_summary(collection)
    }

    pub fn detailed_report(&self, collection: &EpicCollection) -> String {
        board::render_detailed_report(collection)
    }

    pub fn trend_analysis(&self, collection: &EpicCollection) -> String {
        trends::render_trend_analysis(collection)
    }

    pub fn json(&self, collection: &EpicCollection, metadata: &ReportMetadata) -> ReportEnvelope {
        envelope::envelope(collection, metadata, &self.config)
    }

    /// Render in the requested format.
    pub fn render(&self, format: ReportFormat, collection: &EpicCollection) -> Result<String> {
        Ok(match format {
            ReportFormat::Json => serde_json::to_string_pretty(collection)?,
            ReportFormat::BoardReport => self.board_report(collection),
            ReportFormat::Summary => self.status_summary(collection),
            ReportFormat::Detailed => self.detailed_report(collection),
            ReportFormat::Trends => self.trend_analysis(collection),
        })
    }
}

/// Board report with default links.
pub fn render_board_report(collection: &EpicCollection) -> String {
    ReportRenderer::default().board_report(collection)
}

pub use board::render_detailed_report;
pub use summary::render_status_summary;
pub use trends::render_trend_analysis;

/// The day an update refers to: its parsed date, else the day it was posted.
pub(crate) fn update_day(update: &EpicUpdateRecord) -> &str {
    update
        .parsed_data
        .date
        .as_deref()
        .unwrap_or_else(|| posted_day(update))
}

/// `YYYY-MM-DD` prefix of the comment timestamp.
pub(crate) fn posted_day(update: &EpicUpdateRecord) -> &str {
    update.created_at.get(..10).unwrap_or(&update.created_at)
}
