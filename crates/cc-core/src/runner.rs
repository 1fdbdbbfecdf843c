//! Per-environment checkups and the consolidated run report.

use crate::discovery::{ScanConfig, StaleClusterScanner};
use crate::environment::Environment;
use crate::error::CheckupError;
use crate::models::CheckupResult;
use crate::report::ReportGenerator;
use cc_connectors::{Notifier, SecureString, SessionProvider};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Separates environments in the consolidated report.
pub const DIVIDER: &str = "---------------------";

/// Runs the full checkup for each configured environment.
pub struct CheckupRunner {
    sessions: Arc<dyn SessionProvider>,
    token: SecureString,
    scan: ScanConfig,
    report: ReportGenerator,
}

impl CheckupRunner {
    pub fn new(sessions: Arc<dyn SessionProvider>, token: SecureString) -> Self {
        Self::with_config(sessions, token, ScanConfig::default())
    }

    pub fn with_config(
        sessions: Arc<dyn SessionProvider>,
        token: SecureString,
        scan: ScanConfig,
    ) -> Self {
        let report = ReportGenerator::new(scan.max_age);
        Self {
            sessions,
            token,
            scan,
            report,
        }
    }

    pub fn scan_config(&self) -> &ScanConfig {
        &self.scan
    }

    /// Logs in, discovers, and renders the report for one environment.
    ///
    /// Never fails: every problem is recorded on the returned result.
    #[instrument(skip(self, environment), fields(environment = %environment.name))]
    pub async fn perform_checkup(&self, environment: &Environment) -> CheckupResult {
        info!(
            url = %environment.url,
            organization_id = %environment.organization_id,
            "Performing clusters checkup"
        );

        let failed = |error: CheckupError| {
            warn!(error = %error, "Clusters checkup failed");
            CheckupResult {
                environment: environment.name.clone(),
                success: None,
                failure: Some(format!(
                    "failed to perform Clusters Checkup for the environment {}",
                    environment.name
                )),
                error: Some(error),
            }
        };

        let session = match self.sessions.login(&self.token, &environment.url).await {
            Ok(session) => session,
            Err(source) => {
                return failed(CheckupError::Login {
                    url: environment.url.clone(),
                    source,
                })
            }
        };

        let client = match self.sessions.connect(&session).await {
            Ok(client) => client,
            Err(source) => {
                return failed(CheckupError::Connection {
                    url: environment.url.clone(),
                    source,
                })
            }
        };

        let outcome = StaleClusterScanner::new(client, self.scan.clone())
            .discover(&environment.organization_id)
            .await;

        let failure = outcome.error.as_ref().map(|e| {
            format!(
                "Some errors were encountered while fetching the stale cluster instances: {}",
                e
            )
        });

        CheckupResult {
            environment: environment.name.clone(),
            success: Some(self.report.render(&outcome.instances, &environment.name)),
            failure,
            error: None,
        }
    }

    /// Checks every environment in order and returns the consolidated report.
    pub async fn run_all(&self, environments: &[Environment]) -> String {
        let mut results = Vec::with_capacity(environments.len());
        for environment in environments {
            results.push(self.perform_checkup(environment).await);
        }
        consolidate(&results)
    }

    /// Runs every environment and sends the consolidated report to `channel_id`.
    ///
    /// Delivery failure is the only error; environment failures are part of
    /// the report.
    pub async fn run_and_notify(
        &self,
        environments: &[Environment],
        notifier: &dyn Notifier,
        channel_id: &str,
    ) -> Result<String, CheckupError> {
        let report = self.run_all(environments).await;

        notifier
            .send(channel_id, &report)
            .await
            .map_err(|source| {
                error!(channel_id, error = %source, "Failed to deliver the checkup report");
                CheckupError::Notification {
                    channel: channel_id.to_string(),
                    source,
                }
            })?;

        info!(channel_id, "Clusters checkup performed successfully");
        Ok(report)
    }
}

/// Joins per-environment results, each followed by the divider.
pub fn consolidate(results: &[CheckupResult]) -> String {
    let mut message = String::new();
    for result in results {
        for line in result.lines() {
            message.push_str(&line);
            message.push('\n');
        }
        message.push_str(DIVIDER);
        message.push_str("\n\n");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_connectors::{ConnectorError, MockNotifier, MockSessionProvider};

    fn staging() -> Environment {
        Environment {
            name: "staging".to_string(),
            url: "https://api.stage.openshift.com".to_string(),
            organization_id: "org".to_string(),
        }
    }

    #[test]
    fn test_consolidate_layout() {
        let results = vec![
            CheckupResult {
                environment: "a".to_string(),
                success: Some("report a".to_string()),
                failure: Some("partial".to_string()),
                error: None,
            },
            CheckupResult {
                environment: "b".to_string(),
                success: None,
                failure: Some("failed b".to_string()),
                error: Some(CheckupError::Connection {
                    url: "https://b".to_string(),
                    source: ConnectorError::ConnectionFailed("refused".to_string()),
                }),
            },
        ];

        assert_eq!(
            consolidate(&results),
            "report a\npartial\n---------------------\n\n\
             failed b\nfailed to establish a connection with https://b: Connection failed: refused\n\
             ---------------------\n\n"
        );
    }

    #[test]
    fn test_consolidate_empty() {
        assert_eq!(consolidate(&[]), "");
    }

    #[tokio::test]
    async fn test_login_failure_is_recorded() {
        let sessions = Arc::new(MockSessionProvider::new());
        sessions.fail_login("https://api.stage.openshift.com").await;
        let runner = CheckupRunner::new(sessions, SecureString::from("token"));

        let result = runner.perform_checkup(&staging()).await;
        assert!(result.success.is_none());
        assert_eq!(
            result.failure.as_deref(),
            Some("failed to perform Clusters Checkup for the environment staging")
        );
        assert!(matches!(result.error, Some(CheckupError::Login { .. })));
    }

    #[tokio::test]
    async fn test_connect_failure_is_recorded() {
        let sessions = Arc::new(MockSessionProvider::new());
        sessions.fail_connect("https://api.stage.openshift.com").await;
        let runner = CheckupRunner::new(sessions, SecureString::from("token"));

        let result = runner.perform_checkup(&staging()).await;
        assert!(matches!(result.error, Some(CheckupError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_notification_failure_is_an_error() {
        let sessions = Arc::new(MockSessionProvider::new());
        let runner = CheckupRunner::new(sessions, SecureString::from("token"));
        let notifier = MockNotifier::new();
        notifier.set_should_fail(true).await;

        let err = runner
            .run_and_notify(&[staging()], &notifier, "C123")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckupError::Notification { .. }));
        assert!(err.to_string().contains("C123"));
    }

    #[tokio::test]
    async fn test_report_is_delivered() {
        let sessions = Arc::new(MockSessionProvider::new());
        let runner = CheckupRunner::new(sessions, SecureString::from("token"));
        let notifier = MockNotifier::new();

        let report = runner
            .run_and_notify(&[staging()], &notifier, "C123")
            .await
            .unwrap();

        let messages = notifier.get_messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].channel, "C123");
        assert_eq!(messages[0].text, report);
        assert!(report.contains("No clusters were found"));
    }
}
