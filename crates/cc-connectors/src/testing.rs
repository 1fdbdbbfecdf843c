//! Testing harness for connector implementations and the discovery pipeline.
//!
//! Provides builders for inventory records and tokens.

use crate::traits::{
    AccountRecord, AuthConfig, ClusterRecord, ConnectorConfig, ObjectReference,
    SubscriptionRecord,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Creates a test connector config with sensible defaults.
pub fn test_connector_config(name: &str, base_url: &str) -> ConnectorConfig {
    ConnectorConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        auth: AuthConfig::None,
        timeout_secs: 30,
        verify_tls: true,
        headers: HashMap::new(),
    }
}

/// Creates a cluster record created at `created_at`, optionally linked to a subscription.
pub fn sample_cluster(
    id: &str,
    created_at: DateTime<Utc>,
    subscription_id: Option<&str>,
) -> ClusterRecord {
    ClusterRecord {
        id: id.to_string(),
        name: format!("{}-name", id),
        external_id: format!("{}-external", id),
        creation_timestamp: Some(created_at),
        subscription: subscription_id.map(ObjectReference::with_id),
    }
}

/// Creates a subscription owned by `organization_id` and created by `creator_id`.
pub fn sample_subscription(
    id: &str,
    organization_id: Option<&str>,
    creator_id: Option<&str>,
) -> SubscriptionRecord {
    SubscriptionRecord {
        id: id.to_string(),
        organization_id: organization_id.map(str::to_string),
        creator: creator_id.map(ObjectReference::with_id),
    }
}

/// Creates an account with the given username.
pub fn sample_account(id: &str, username: &str) -> AccountRecord {
    AccountRecord {
        id: id.to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        ..Default::default()
    }
}

/// Builds an unsigned JWT carrying the given claims.
pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_cluster() {
        let cluster = sample_cluster("c-1", Utc::now(), Some("sub-1"));
        assert_eq!(cluster.name, "c-1-name");
        assert_eq!(
            cluster.subscription.as_ref().and_then(|s| s.id()),
            Some("sub-1")
        );
    }

    #[test]
    fn test_unsigned_jwt_has_three_segments() {
        let token = unsigned_jwt(&serde_json::json!({"typ": "Bearer"}));
        assert_eq!(token.split('.').count(), 3);
    }
}
