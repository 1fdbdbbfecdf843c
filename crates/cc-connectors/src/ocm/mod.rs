//! OpenShift Cluster Manager (OCM) connectors.
//!
//! Provides the SSO-backed login flow and the inventory client used to
//! enumerate managed clusters and resolve their ownership.

pub mod auth;
pub mod inventory;
pub mod mock;

pub use auth::{classify_token, OcmSessionProvider, TokenKind, DEFAULT_CLIENT_ID, DEFAULT_TOKEN_URL};
pub use inventory::OcmInventoryClient;
pub use mock::{MockInventoryClient, MockSessionProvider};
