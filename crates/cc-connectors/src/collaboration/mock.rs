//! Mock notifier for testing.
//!
//! Records all sent messages for test verification without making real API calls.

use crate::traits::{ConnectorError, ConnectorResult, Notifier};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A recorded message sent through the mock notifier.
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub channel: String,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Mock notifier for testing report delivery.
#[derive(Clone, Default)]
pub struct MockNotifier {
    messages: Arc<RwLock<Vec<RecordedMessage>>>,
    should_fail: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether subsequent sends fail.
    pub async fn set_should_fail(&self, should_fail: bool) {
        *self.should_fail.write().await = should_fail;
    }

    /// Gets all recorded messages.
    pub async fn get_messages(&self) -> Vec<RecordedMessage> {
        self.messages.read().await.clone()
    }

    /// Returns the total number of messages sent.
    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> ConnectorResult<()> {
        if *self.should_fail.read().await {
            return Err(ConnectorError::RequestFailed("Mock failure".to_string()));
        }

        self.messages.write().await.push(RecordedMessage {
            channel: channel_id.to_string(),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages() {
        let notifier = MockNotifier::new();
        notifier.send("C1", "first").await.unwrap();
        notifier.send("C2", "second").await.unwrap();

        let messages = notifier.get_messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].channel, "C1");
        assert_eq!(messages[1].text, "second");
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let notifier = MockNotifier::new();
        notifier.set_should_fail(true).await;
        assert!(notifier.send("C1", "dropped").await.is_err());
        assert_eq!(notifier.message_count().await, 0);
    }
}
