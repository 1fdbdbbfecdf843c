//! Connector trait definitions for the clusters checker.
//!
//! These are the seams between the discovery pipeline and the remote
//! services it talks to: the cluster inventory, the login gateway, and
//! the notification channel.

use crate::secure_string::SecureString;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur in connectors.
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Configuration for an HTTP-backed connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Connector name/identifier.
    pub name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    None,
    /// Bearer token authentication.
    BearerToken {
        /// The bearer token (zeroized on drop).
        token: SecureString,
    },
}

/// A reference to another remote object, as embedded in inventory records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Identifier of the referenced object, when the server includes it.
    #[serde(default)]
    pub id: Option<String>,
    /// API link to the referenced object.
    #[serde(default)]
    pub href: Option<String>,
}

impl ObjectReference {
    /// Creates a reference carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            href: None,
        }
    }

    /// Returns the identifier if it is present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A managed cluster snapshot as returned by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Unique inventory identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// External identifier.
    #[serde(default)]
    pub external_id: String,
    /// When the cluster was created.
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// The subscription this cluster is billed under.
    #[serde(default)]
    pub subscription: Option<ObjectReference>,
}

/// One page of inventory results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterPage {
    /// Page number, starting at 1.
    pub page: u32,
    /// Number of items in this page.
    pub size: u32,
    /// Total number of items reported by the server. Informational only.
    #[serde(default)]
    pub total: Option<u32>,
    /// The clusters in this page.
    #[serde(default)]
    pub items: Vec<ClusterRecord>,
}

/// Subscription details used to resolve cluster ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    /// The account that created the subscription.
    #[serde(default)]
    pub creator: Option<ObjectReference>,
}

impl SubscriptionRecord {
    /// Returns the organization id if it is present and non-empty.
    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Returns the creator account id if it is present and non-empty.
    pub fn creator_id(&self) -> Option<&str> {
        self.creator.as_ref().and_then(ObjectReference::id)
    }
}

/// An owner account. An all-empty record stands in for an unresolved owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl AccountRecord {
    /// The placeholder used when the owner could not be resolved.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Returns true if this is the unresolved-owner placeholder.
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

/// Read access to the managed cluster inventory.
///
/// Implementations must tolerate concurrent calls from many tasks.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Lists one page of clusters. Pages start at 1.
    async fn list_clusters(&self, page: u32, size: u32) -> ConnectorResult<ClusterPage>;

    /// Fetches a subscription by id.
    async fn get_subscription(&self, id: &str) -> ConnectorResult<SubscriptionRecord>;

    /// Fetches an account by id.
    async fn get_account(&self, id: &str) -> ConnectorResult<AccountRecord>;
}

/// An authenticated session against one API gateway.
#[derive(Debug, Clone)]
pub struct Session {
    /// Gateway the session was established for.
    pub gateway_url: String,
    /// Access token used for API calls.
    pub access_token: SecureString,
    /// Refresh token, when the login flow produced one.
    pub refresh_token: Option<SecureString>,
}

/// Establishes sessions and hands out inventory clients bound to them.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Exchanges the supplied token for a session on `gateway_url`.
    async fn login(&self, token: &SecureString, gateway_url: &str) -> ConnectorResult<Session>;

    /// Builds an inventory client for an established session.
    async fn connect(&self, session: &Session) -> ConnectorResult<Arc<dyn InventoryClient>>;
}

/// A message sink for operator notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `text` to `channel_id`.
    async fn send(&self, channel_id: &str, text: &str) -> ConnectorResult<()>;
}
