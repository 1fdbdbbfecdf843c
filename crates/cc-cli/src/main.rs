//! Clusters checker CLI
//!
//! Scans OCM environments for clusters older than the age threshold and
//! posts the findings to Slack.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod config;

use cc_connectors::SecureString;
use commands::{list_environments, run_scan, ScanOptions};
use config::AppConfig;

#[derive(Parser)]
#[command(name = "clusters-checker")]
#[command(version)]
#[command(about = "Reports stale OCM clusters to Slack", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scans for clusters older than 24hr.
    Scan {
        /// `environment:organization-id` pair to scan, e.g. `staging:fooid1234`.
        /// Repeat for more environments
        #[arg(long = "envs-and-org-ids", value_name = "ENV:ORG_ID")]
        envs_and_org_ids: Vec<String>,

        /// ID of the Slack channel receiving the results of the scan
        #[arg(long)]
        slack_channel_id: Option<String>,

        /// OCM token capable of querying the clusters of your organization
        #[arg(long, env = "OCM_TOKEN", hide_env_values = true)]
        ocm_token: Option<String>,

        /// Slack token capable of posting to the target channel
        #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
        slack_token: Option<String>,

        /// Print the report instead of sending it to Slack
        #[arg(long)]
        dry_run: bool,
    },

    /// Lists the environments that can be scanned
    Environments,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = if cli.config.is_some() {
        AppConfig::load(&config_path)?
    } else {
        AppConfig::load_or_default(&config_path)?
    };

    let json_format = match cli.log_format {
        Some(format) => format == LogFormat::Json,
        None => config.logging.json_format,
    };
    let logging = if cli.verbose {
        cc_observability::LoggingConfig::development()
    } else if json_format {
        cc_observability::LoggingConfig::production()
    } else {
        cc_observability::LoggingConfig::default()
    };
    cc_observability::init_logging_with_config(cc_observability::LoggingConfig {
        json_format,
        ..logging
    });
    tracing::debug!(path = %config_path.display(), "Configuration resolved");

    match cli.command {
        Commands::Scan {
            envs_and_org_ids,
            slack_channel_id,
            ocm_token,
            slack_token,
            dry_run,
        } => {
            let options = ScanOptions {
                envs_and_org_ids,
                slack_channel_id,
                ocm_token: ocm_token.map(SecureString::new),
                slack_token: slack_token.map(SecureString::new),
                dry_run,
            };
            run_scan(options, &config).await
        }
        Commands::Environments => {
            list_environments(&config);
            Ok(())
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "mt-sre", "clusters-checker") {
        dirs.config_dir().join("config.yaml")
    } else {
        PathBuf::from("config/clusters-checker.yaml")
    }
}
