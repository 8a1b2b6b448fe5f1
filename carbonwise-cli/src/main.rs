//! Carbonwise CLI: serves the emissions tools over MCP, or answers a single
//! query from the terminal.

mod commands;

use carbonwise_core::client::DateWindow;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Carbonwise: CodeCarbon emissions data and lowest-emission recommendations
#[derive(Parser, Debug)]
#[command(name = "carbonwise", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (holds `.carbonwise/config.toml`)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Override the CodeCarbon API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,
    /// Recommend the lowest-emission experiment of a project
    Recommend {
        /// Project identifier
        project_id: String,
        /// Minimum accuracy, as a percentage (92) or decimal (0.92)
        #[arg(long)]
        min_accuracy: Option<f64>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Total emissions, energy and duration of one experiment
    Consumption {
        /// Experiment identifier
        #[arg(long, conflicts_with_all = ["project", "name"], required_unless_present = "project")]
        experiment_id: Option<String>,
        /// Project to search when looking an experiment up by name
        #[arg(long, requires = "name")]
        project: Option<String>,
        /// Full or partial experiment name
        #[arg(long, requires = "project")]
        name: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// List the tools exposed over MCP
    Tools,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Write a default `.carbonwise/config.toml` in the workspace
    Init,
    /// Print the effective configuration (API token masked)
    Show,
}

/// Optional date bounds shared by the query subcommands.
#[derive(clap::Args, Debug, Clone, Default)]
struct WindowArgs {
    /// Only include runs on or after this ISO 8601 date
    #[arg(long)]
    start: Option<String>,
    /// Only include runs on or before this ISO 8601 date
    #[arg(long)]
    end: Option<String>,
}

impl From<WindowArgs> for DateWindow {
    fn from(args: WindowArgs) -> Self {
        DateWindow::new(args.start, args.end)
    }
}

fn stderr_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Stdout carries MCP traffic, so human-readable logs go to stderr.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(stderr_filter(cli.verbose, cli.quiet)));

    let log_dir = directories::ProjectDirs::from("dev", "carbonwise", "carbonwise")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "carbonwise.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut config = carbonwise_core::config::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    config.validate()?;

    let command = cli.command.unwrap_or(Commands::Serve);
    commands::handle_command(command, config, &workspace).await
}
