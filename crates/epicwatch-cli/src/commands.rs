//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use epicwatch_core::config::Config;
use epicwatch_core::input::{
    date_filter, parse_issue_numbers, read_issues_from_file, require_issues, validate_date,
    validate_repo,
};
use epicwatch_core::{DateFilter, RepoRef};
use epicwatch_epic::{CollectRequest, EpicCollector, TemplateMatcher};
use epicwatch_github::{GitHubClient, DEFAULT_GITHUB_URL};
use epicwatch_mcp::McpServer;
use epicwatch_report::{write_report, ReportMetadata, ReportRenderer};
use epicwatch_storage::{
    resolve_github_token, token_key, CredentialStore, KeychainStore, TokenOrigin,
};
use tracing::{info, warn};

use crate::ReportArgs;

/// Validated `report` input.
#[derive(Debug)]
struct ReportPlan {
    repo: RepoRef,
    target_date: String,
    filter: DateFilter,
    issue_numbers: Vec<u64>,
}

/// Check every argument before anything touches the network.
fn plan(args: &ReportArgs) -> Result<ReportPlan> {
    let repo = validate_repo(&args.repo)?;
    let target_date = validate_date(&args.date)?;
    let filter = date_filter(Some(target_date.as_str()), args.end_date.as_deref())?;

    let numbers = match (&args.issues, &args.issues_file) {
        (Some(list), _) => parse_issue_numbers(list),
        (None, Some(path)) => read_issues_from_file(path)?,
        (None, None) => bail!("Either --issues or --issues-file is required"),
    };
    let issue_numbers = require_issues(numbers)?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            bail!("Output directory '{}' does not exist", parent.display());
        }
    }

    Ok(ReportPlan {
        repo,
        target_date,
        filter,
        issue_numbers,
    })
}

/// `epicwatch report`: collect, render and write the JSON report.
pub async fn report(args: ReportArgs) -> Result<()> {
    let plan = plan(&args)?;
    let config = load_config()?;
    let client = github_client(args.base_url.as_deref(), &config)?;

    info!(
        repo = %plan.repo,
        date = %plan.target_date,
        issues = ?plan.issue_numbers,
        "Generating EPIC summary"
    );

    let collector = EpicCollector::new(Arc::new(client)).with_matcher(matcher(&config));
    let collection = collector
        .collect(&CollectRequest {
            repo: plan.repo,
            issue_numbers: plan.issue_numbers,
            filter: plan.filter,
        })
        .await;

    let metadata = ReportMetadata {
        target_date: Some(plan.target_date),
        generated_at: Utc::now().to_rfc3339(),
    };
    let envelope = renderer(&config).json(&collection, &metadata);
    write_report(&args.output, &envelope)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    println!(
        "Found {} EPIC update(s) in {} issue(s)",
        collection.total_updates(),
        collection.issue_numbers().len()
    );
    if !collection.failures().is_empty() {
        println!(
            "{} issue(s) could not be retrieved, see the report for details",
            collection.failures().len()
        );
    }
    println!("Report saved to: {}", args.output.display());
    Ok(())
}

/// `epicwatch serve`: MCP server on stdio.
pub async fn serve() -> Result<()> {
    let config = load_config()?;
    let client = github_client(None, &config)?;

    let mut server = McpServer::with_source(Arc::new(client))
        .with_matcher(matcher(&config))
        .with_renderer(renderer(&config));
    server.run().await.context("MCP server failed")?;
    Ok(())
}

pub fn config_show() -> Result<()> {
    let path = Config::config_path()?;
    let config = load_config()?;

    println!("Config file: {}", path.display());
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    if rendered.trim().is_empty() {
        println!("(no settings)");
    } else {
        println!();
        print!("{}", rendered);
    }

    let token = resolve_github_token(&KeychainStore::new());
    println!("GitHub token: {}", token.origin);
    Ok(())
}

pub fn config_get(key: &str) -> Result<()> {
    let config = load_config()?;
    match config.get(key)? {
        Some(value) => println!("{}", value),
        None => println!("(not set)"),
    }
    Ok(())
}

pub fn config_set(key: &str, value: &str) -> Result<()> {
    let mut config = load_config()?;
    config.set(key, value)?;
    config.save().context("Failed to save configuration")?;
    println!("Set {} = {}", key, value);
    Ok(())
}

pub fn config_token(value: Option<&str>, delete: bool) -> Result<()> {
    let store = KeychainStore::new();
    let key = token_key("github");

    if delete {
        store.delete(&key)?;
        println!("GitHub token removed from keychain");
        return Ok(());
    }

    let Some(token) = value.map(str::trim).filter(|t| !t.is_empty()) else {
        bail!("Token must not be empty");
    };
    store.store(&key, token)?;
    println!("GitHub token stored in keychain");
    Ok(())
}

fn load_config() -> Result<Config> {
    Config::load().context("Failed to load configuration")
}

/// GitHub client for the flag URL, else the configured one, else github.com.
fn github_client(base_url: Option<&str>, config: &Config) -> Result<GitHubClient> {
    let base_url = base_url
        .or(config.github_base_url())
        .unwrap_or(DEFAULT_GITHUB_URL);

    let resolved = resolve_github_token(&KeychainStore::new());
    if resolved.origin == TokenOrigin::Absent {
        warn!(
            "No GitHub token found. Set GITHUB_TOKEN or run `epicwatch config token`; \
             public repositories still work"
        );
    }
    info!(base_url, token = %resolved.origin, "GitHub source");

    Ok(GitHubClient::with_base_url(base_url, resolved.token)?)
}

fn matcher(config: &Config) -> TemplateMatcher {
    config
        .min_body_len()
        .map_or_else(TemplateMatcher::default, TemplateMatcher::with_min_body_len)
}

fn renderer(config: &Config) -> ReportRenderer {
    config
        .github_web_url()
        .map_or_else(ReportRenderer::default, ReportRenderer::with_web_url)
}
