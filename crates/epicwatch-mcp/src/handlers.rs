//! Tool handlers for MCP server.
//!
//! Each tool validates its arguments, runs the collector or parser, and
//! renders the result through the report renderer.

use std::sync::Arc;

use chrono::Utc;
use epicwatch_core::input::{
    crawl_window, date_filter, parse_issue_numbers, require_issues, validate_date, validate_repo,
};
use epicwatch_core::{DateFilter, EpicCollection, Error, IssueSource, Result};
use epicwatch_epic::{
    parse_epic_update, CollectRequest, CrawlRequest, EpicCollector, TemplateMatcher,
};
use epicwatch_github::parse_issue_url;
use epicwatch_report::{ReportFormat, ReportRenderer};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::protocol::{ToolCallResult, ToolDefinition};

const NO_SOURCE: &str = "No GitHub source configured";

/// Tool handler that executes tools against an optional issue source.
pub struct ToolHandler {
    source: Option<Arc<dyn IssueSource>>,
    matcher: TemplateMatcher,
    renderer: ReportRenderer,
}

impl ToolHandler {
    pub fn new(source: Option<Arc<dyn IssueSource>>) -> Self {
        Self {
            source,
            matcher: TemplateMatcher::default(),
            renderer: ReportRenderer::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: TemplateMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_renderer(mut self, renderer: ReportRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        crate::tools::available_tools()
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let result = match name {
            "collect_epic_updates" => self.collect_epic_updates(arguments).await,
            "crawl_epic_updates" => self.crawl_epic_updates(arguments).await,
            "get_epic_updates_from_issue" => self.get_epic_updates_from_issue(arguments).await,
            "parse_epic_update" => self.parse_epic_update(arguments),
            "generate_board_report" => self.render_collection(arguments, ReportFormat::BoardReport),
            "generate_epic_status_summary" => {
                self.render_collection(arguments, ReportFormat::Summary)
            }
            "analyze_epic_trends" => self.render_collection(arguments, ReportFormat::Trends),
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };

        match result {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    fn collector(&self) -> Result<EpicCollector> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| Error::Config(NO_SOURCE.to_string()))?;
        Ok(EpicCollector::new(source).with_matcher(self.matcher))
    }

    async fn collect_epic_updates(&self, arguments: Option<Value>) -> Result<String> {
        let params: CollectParams = parse_params(arguments)?;

        let repo = validate_repo(&params.repo)?;
        let issue_numbers = require_issues(params.issue_numbers.into_numbers())?;
        let filter = match (params.date, params.start_date, params.end_date) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(Error::Validation(
                    "Use either date or start_date/end_date, not both".to_string(),
                ))
            }
            (Some(date), None, None) => DateFilter::On(validate_date(&date)?),
            (None, Some(start), Some(end)) => date_filter(Some(start.as_str()), Some(end.as_str()))?,
            (None, None, None) => DateFilter::Any,
            (None, _, _) => {
                return Err(Error::Validation(
                    "start_date and end_date must be given together".to_string(),
                ))
            }
        };
        let format = parse_format(params.format.as_deref())?;

        let collector = self.collector()?;
        info!(repo = %repo, issues = issue_numbers.len(), "collect_epic_updates");
        let collection = collector
            .collect(&CollectRequest {
                repo,
                issue_numbers,
                filter,
            })
            .await;

        self.renderer.render(format, &collection)
    }

    async fn crawl_epic_updates(&self, arguments: Option<Value>) -> Result<String> {
        let params: CrawlParams = parse_params(arguments)?;

        let repo = validate_repo(&params.repo)?;
        let (start, end) = crawl_window(
            params.days_back,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            Utc::now().date_naive(),
        )?;
        let format = parse_format(params.format.as_deref())?;

        let collector = self.collector()?;
        info!(repo = %repo, start = %start, end = %end, "crawl_epic_updates");
        let collection = collector
            .crawl(&CrawlRequest {
                repo: repo.clone(),
                start: start.clone(),
                end: end.clone(),
            })
            .await?;

        let nothing_found = collection.is_empty() && collection.failures().is_empty();
        if nothing_found && format != ReportFormat::Json {
            return Ok(format!(
                "No EPIC updates found for {} between {} and {}",
                repo, start, end
            ));
        }
        self.renderer.render(format, &collection)
    }

    async fn get_epic_updates_from_issue(&self, arguments: Option<Value>) -> Result<String> {
        let params: IssueUrlParams = parse_params(arguments)?;

        let (repo, number) = parse_issue_url(&params.issue_url)?;
        let filter = match &params.target_date {
            Some(date) => DateFilter::On(validate_date(date)?),
            None => DateFilter::Any,
        };
        let format = parse_format(params.format.as_deref())?;

        let collector = self.collector()?;
        let collection = collector
            .collect(&CollectRequest {
                repo,
                issue_numbers: vec![number],
                filter,
            })
            .await;

        if let Some(failure) = collection.failures().first() {
            return Err(fetch_failed(&params.issue_url, &failure.message));
        }
        if collection.is_empty() {
            if let Some(date) = &params.target_date {
                return Ok(format!(
                    "No EPIC updates found for issue {} on {}",
                    params.issue_url, date
                ));
            }
        }

        self.renderer.render(format, &collection)
    }

    fn parse_epic_update(&self, arguments: Option<Value>) -> Result<String> {
        let params: ParseParams = parse_params(arguments)?;

        let is_update = self.matcher.is_epic_update(&params.body);
        let parsed = parse_epic_update(&params.body)?;
        debug!(is_epic_update = is_update, "parse_epic_update");

        let output = serde_json::json!({
            "is_epic_update": is_update,
            "parsed_data": parsed,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }

    fn render_collection(&self, arguments: Option<Value>, format: ReportFormat) -> Result<String> {
        let params: CollectionParams = parse_params(arguments)?;
        let collection = collection_from_value(params.epic_updates_data)?;
        self.renderer.render(format, &collection)
    }
}

fn fetch_failed(issue_url: &str, message: &str) -> Error {
    Error::Other(anyhow::anyhow!("Could not fetch {}: {}", issue_url, message))
}

fn parse_params<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T> {
    let arguments = arguments.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(arguments)
        .map_err(|e| Error::Validation(format!("Invalid arguments: {}", e)))
}

fn parse_format(format: Option<&str>) -> Result<ReportFormat> {
    format.map_or(Ok(ReportFormat::default()), str::parse)
}

/// Accept a collection as a JSON string or object, or a whole report
/// envelope carrying it under `raw_epic_data`.
fn collection_from_value(data: Value) -> Result<EpicCollection> {
    let value = match data {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| Error::Validation(format!("epic_updates_data is not valid JSON: {}", e)))?,
        other => other,
    };
    let value = match value {
        Value::Object(mut envelope) if envelope.contains_key("raw_epic_data") => envelope
            .remove("raw_epic_data")
            .unwrap_or_default(),
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| Error::Validation(format!("epic_updates_data is not an EPIC collection: {}", e)))
}

// =============================================================================
// Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct CollectParams {
    repo: String,
    issue_numbers: IssueNumbers,
    date: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    format: Option<String>,
}

/// Issue numbers as a JSON array or a comma/newline separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IssueNumbers {
    List(Vec<u64>),
    Text(String),
}

impl IssueNumbers {
    fn into_numbers(self) -> Vec<u64> {
        match self {
            IssueNumbers::List(numbers) => {
                let joined = numbers
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                parse_issue_numbers(&joined)
            }
            IssueNumbers::Text(text) => parse_issue_numbers(&text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CrawlParams {
    repo: String,
    days_back: Option<u32>,
    start_date: Option<String>,
    end_date: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueUrlParams {
    issue_url: String,
    target_date: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseParams {
    body: String,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    epic_updates_data: Value,
}
