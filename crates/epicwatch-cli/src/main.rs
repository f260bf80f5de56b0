//! epicwatch CLI - EPIC update reports from GitHub issue comments.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "epicwatch")]
#[command(author, version, about = "Collect EPIC update comments from GitHub issues", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect EPIC updates and write a JSON report
    Report(ReportArgs),

    /// Start the MCP server on stdin/stdout
    Serve,

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args)]
pub(crate) struct ReportArgs {
    /// Repository in org/repo format (e.g. microsoft/vscode)
    #[arg(short, long)]
    pub repo: String,

    /// Target date in YYYY-MM-DD format
    #[arg(short, long)]
    pub date: String,

    /// Path of the JSON report to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma-separated issue numbers (e.g. 151,152,153)
    #[arg(long, required_unless_present = "issues_file", conflicts_with = "issues_file")]
    pub issues: Option<String>,

    /// File with issue numbers, one per line or comma-separated
    #[arg(short = 'f', long)]
    pub issues_file: Option<PathBuf>,

    /// Inclusive end date; turns --date into the start of a range
    #[arg(long)]
    pub end_date: Option<String>,

    /// GitHub API base URL (GitHub Enterprise)
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print one value (e.g. github.base_url)
    Get { key: String },

    /// Set one value (e.g. epic.min_body_len 60)
    Set { key: String, value: String },

    /// Store the GitHub token in the OS keychain
    Token {
        /// Token value
        #[arg(required_unless_present = "delete")]
        value: Option<String>,

        /// Remove the stored token
        #[arg(long, conflicts_with = "value")]
        delete: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP transport; logs go to stderr.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Report(args)) => commands::report(args).await?,
        Some(Commands::Serve) => commands::serve().await?,
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => commands::config_show()?,
            ConfigCommands::Get { key } => commands::config_get(&key)?,
            ConfigCommands::Set { key, value } => commands::config_set(&key, &value)?,
            ConfigCommands::Token { value, delete } => {
                commands::config_token(value.as_deref(), delete)?
            }
        },
        None => {
            println!("epicwatch - EPIC update reports from GitHub issues");
            println!("Run with --help for usage information");
        }
    }

    Ok(())
}
