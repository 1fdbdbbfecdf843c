//! Scan command - checks environments for stale clusters and reports them.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::sync::Arc;

use cc_connectors::{Notifier, OcmSessionProvider, SecureString, SlackConfig, SlackConnector};
use cc_core::{CheckupRunner, Environment};

use crate::config::AppConfig;

/// Scan arguments as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// `environment:organization-id` selectors.
    pub envs_and_org_ids: Vec<String>,
    /// Slack channel receiving the report.
    pub slack_channel_id: Option<String>,
    /// OCM access, refresh, or offline token.
    pub ocm_token: Option<SecureString>,
    /// Slack bot token.
    pub slack_token: Option<SecureString>,
    /// Print the report instead of sending it.
    pub dry_run: bool,
}

/// Where the consolidated report goes.
#[derive(Debug)]
pub enum Delivery {
    Stdout,
    Slack {
        channel_id: String,
        token: SecureString,
    },
}

/// A validated scan, ready to run.
#[derive(Debug)]
pub struct ScanPlan {
    pub environments: Vec<Environment>,
    pub ocm_token: SecureString,
    pub delivery: Delivery,
}

impl ScanPlan {
    /// Validates `options` against `config`.
    ///
    /// Every run-fatal input problem is reported here, before any remote call.
    pub fn build(options: ScanOptions, config: &AppConfig) -> Result<Self> {
        let ocm_token = match options.ocm_token {
            Some(token) if !token.is_blank() => token,
            _ => bail!("OCM token not found to be provided"),
        };

        if options.envs_and_org_ids.is_empty() {
            bail!("no environments provided, expected at least one --envs-and-org-ids env:orgid");
        }
        let environments = config
            .registry()
            .parse_selectors(&options.envs_and_org_ids)
            .context("invalid --envs-and-org-ids value")?;

        let delivery = if options.dry_run {
            Delivery::Stdout
        } else {
            let channel_id = options
                .slack_channel_id
                .or_else(|| config.notification.default_channel.clone())
                .filter(|c| !c.trim().is_empty())
                .context("slack channel id not found to be provided")?;
            let token = match options.slack_token {
                Some(token) if !token.is_blank() => token,
                _ => bail!("Slack token not found to be provided"),
            };
            Delivery::Slack { channel_id, token }
        };

        Ok(Self {
            environments,
            ocm_token,
            delivery,
        })
    }
}

/// Runs the scan command.
pub async fn run_scan(options: ScanOptions, config: &AppConfig) -> Result<()> {
    let plan = ScanPlan::build(options, config)?;

    println!(
        "{} Checking {} environment(s) for stale clusters...",
        "[scan]".cyan(),
        plan.environments.len()
    );

    let sessions = OcmSessionProvider::new()
        .context("Failed to set up the OCM login client")?
        .with_timeout(config.scan.request_timeout_secs);
    let runner = CheckupRunner::with_config(
        Arc::new(sessions),
        plan.ocm_token.clone(),
        config.scan_config(),
    );

    match &plan.delivery {
        Delivery::Stdout => {
            let report = runner.run_all(&plan.environments).await;
            println!("{}", report);
            println!("{}", "Dry run: report not sent".yellow());
        }
        Delivery::Slack { channel_id, token } => {
            let slack_config = SlackConfig {
                timeout_secs: config.scan.request_timeout_secs,
                ..SlackConfig::new(token.clone())
            };
            let slack =
                SlackConnector::new(slack_config).context("Failed to set up the Slack client")?;
            deliver(&runner, &plan.environments, &slack, channel_id).await?;
            println!("  {} Report sent to {}", "✓".green(), channel_id);
        }
    }

    println!("{}", "Cluster Checkup performed successfully".green());
    Ok(())
}

/// Runs every environment and sends the consolidated report.
async fn deliver(
    runner: &CheckupRunner,
    environments: &[Environment],
    notifier: &dyn Notifier,
    channel_id: &str,
) -> Result<String> {
    runner
        .run_and_notify(environments, notifier, channel_id)
        .await
        .context("failed to notify about the stale cluster instances on slack")
}
