//! # cc-connectors
//!
//! Connectors for the remote services the clusters checker consumes: the
//! OCM cluster inventory and login gateway, and the Slack notification
//! channel.
//!
//! This crate provides the trait definitions, the HTTP-backed
//! implementations, and in-memory mocks for testing.

pub mod collaboration;
pub mod http;
pub mod ocm;
pub mod secure_string;
pub mod testing;
pub mod traits;

pub use secure_string::SecureString;

// Re-export traits
pub use traits::{
    AccountRecord,
    AuthConfig,
    ClusterPage,
    ClusterRecord,
    ConnectorConfig,
    ConnectorError,
    ConnectorResult,
    // Inventory
    InventoryClient,
    // Notifications
    Notifier,
    ObjectReference,
    Session,
    // Login
    SessionProvider,
    SubscriptionRecord,
};

// Re-export connector implementations
pub use collaboration::{MockNotifier, SlackConfig, SlackConnector};
pub use ocm::{MockInventoryClient, MockSessionProvider, OcmInventoryClient, OcmSessionProvider};
