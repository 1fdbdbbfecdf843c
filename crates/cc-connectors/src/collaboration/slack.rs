//! Slack connector for delivering checkup reports.
//!
//! Posts plain-text messages through the Web API `chat.postMessage`
//! method using a bot token.

use crate::http::HttpClient;
use crate::secure_string::SecureString;
use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult, Notifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Default Slack Web API base URL.
pub const SLACK_API_URL: &str = "https://slack.com/api";

/// Slack connector configuration.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot token for Slack API access.
    pub bot_token: SecureString,
    /// Web API base URL.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl SlackConfig {
    /// Creates a configuration for the public Slack API.
    pub fn new(bot_token: SecureString) -> Self {
        Self {
            bot_token,
            api_url: SLACK_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Body of a `chat.postMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    /// Linkify channel names and usernames.
    pub parse: &'static str,
}

/// The envelope every Slack Web API method responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SlackApiResponse {
    /// Turns a `"ok": false` envelope into an error.
    pub fn into_result(self, method: &str) -> ConnectorResult<()> {
        if self.ok {
            Ok(())
        } else {
            Err(ConnectorError::RequestFailed(format!(
                "the Slack API {} request didn't succeed: {}",
                method,
                self.error.as_deref().unwrap_or("unknown error")
            )))
        }
    }
}

/// Slack connector for sending messages.
pub struct SlackConnector {
    client: HttpClient,
}

impl SlackConnector {
    /// Creates a new Slack connector.
    pub fn new(config: SlackConfig) -> ConnectorResult<Self> {
        if config.bot_token.is_blank() {
            return Err(ConnectorError::ConfigError(
                "Slack bot token cannot be empty".to_string(),
            ));
        }

        let mut headers = HashMap::new();
        headers.insert("Accept-Charset".to_string(), "utf-8".to_string());

        let client = HttpClient::new(ConnectorConfig {
            name: "slack".to_string(),
            base_url: config.api_url,
            auth: AuthConfig::BearerToken {
                token: config.bot_token,
            },
            timeout_secs: config.timeout_secs,
            verify_tls: true,
            headers,
        })?;

        Ok(Self { client })
    }

    /// Sends a plain text message to a channel.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn send_message_to_channel(&self, channel: &str, text: &str) -> ConnectorResult<()> {
        if channel.is_empty() {
            return Err(ConnectorError::InvalidRequest(
                "Slack channel id cannot be empty".to_string(),
            ));
        }

        let payload = PostMessageRequest {
            channel,
            text,
            parse: "full",
        };
        let response: SlackApiResponse =
            self.client.post_json("/chat.postMessage", &payload).await?;
        response.into_result("chat.postMessage")?;

        info!("Message delivered to Slack");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackConnector {
    async fn send(&self, channel_id: &str, text: &str) -> ConnectorResult<()> {
        self.send_message_to_channel(channel_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_token() {
        let result = SlackConnector::new(SlackConfig::new(SecureString::from(" ")));
        assert!(matches!(result, Err(ConnectorError::ConfigError(_))));
    }

    #[test]
    fn test_post_message_serialization() {
        let payload = PostMessageRequest {
            channel: "C01V4S8GXPD",
            text: "hello",
            parse: "full",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["channel"], "C01V4S8GXPD");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["parse"], "full");
    }

    #[test]
    fn test_api_response_not_ok_is_error() {
        let response: SlackApiResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        let err = response.into_result("chat.postMessage").unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));

        let response: SlackApiResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(response.into_result("chat.postMessage").is_ok());
    }

    #[tokio::test]
    async fn test_empty_channel_is_rejected_before_sending() {
        let connector = SlackConnector::new(SlackConfig::new("xoxb-test".into())).unwrap();
        let result = connector.send("", "report").await;
        assert!(matches!(result, Err(ConnectorError::InvalidRequest(_))));
    }
}
