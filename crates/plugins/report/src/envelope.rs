//! JSON report envelope and report file output.

use std::path::Path;

use epicwatch_core::{EpicCollection, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{board, summary, ReportConfig};

/// Caller-supplied report metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportMetadata {
    pub target_date: Option<String>,
    /// RFC 3339 generation time
    pub generated_at: String,
}

/// The report document written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub repo: String,
    pub target_date: Option<String>,
    pub issue_numbers: Vec<u64>,
    pub generated_at: String,
    pub board_report: String,
    pub status_summary: String,
    pub raw_epic_data: EpicCollection,
}

pub(crate) fn envelope(
    collection: &EpicCollection,
    metadata: &ReportMetadata,
    config: &ReportConfig,
) -> ReportEnvelope {
    ReportEnvelope {
        repo: collection.repo().to_string(),
        target_date: metadata.target_date.clone(),
        issue_numbers: collection.issue_numbers().to_vec(),
        generated_at: metadata.generated_at.clone(),
        board_report: board::board_report(collection, config),
        status_summary: summary::render_status_summary(collection),
        raw_epic_data: collection.clone(),
    }
}

/// JSON envelope with default links.
pub fn render_json(collection: &EpicCollection, metadata: &ReportMetadata) -> ReportEnvelope {
    envelope(collection, metadata, &ReportConfig::default())
}

/// Write the envelope as pretty JSON. The parent directory must exist.
pub fn write_report(path: &Path, envelope: &ReportEnvelope) -> Result<()> {
    let mut content = serde_json::to_string_pretty(envelope)?;
    content.push('\n');
    std::fs::write(path, content)?;
    debug!(path = %path.display(), "Report written");
    Ok(())
}
