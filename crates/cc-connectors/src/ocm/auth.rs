//! OCM login.
//!
//! The supplied token is a JWT issued by Red Hat SSO. Its `typ` claim
//! decides what happens next: access tokens are used as-is, refresh and
//! offline tokens are exchanged for an access token at the SSO token
//! endpoint. The token signature is not verified here; the gateway does
//! that on every request.

use super::inventory::OcmInventoryClient;
use crate::http::HttpClient;
use crate::secure_string::SecureString;
use crate::traits::{
    AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult, InventoryClient, Session,
    SessionProvider,
};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default Red Hat SSO token endpoint.
pub const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Default OAuth client id used by the OCM tooling.
pub const DEFAULT_CLIENT_ID: &str = "cloud-services";

/// Kind of OCM token, taken from the JWT `typ` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Bearer,
    Refresh,
    Offline,
}

type Claims = HashMap<String, serde_json::Value>;

/// Decodes the payload segment of a JWT without verifying its signature.
fn decode_claims(token: &str) -> ConnectorResult<Claims> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(ConnectorError::AuthenticationFailed(
                "failed to parse the provided token: expected three dot-separated segments"
                    .to_string(),
            ))
        }
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| {
            ConnectorError::AuthenticationFailed(format!(
                "failed to parse the provided token: {}",
                e
            ))
        })?;

    serde_json::from_slice(&decoded).map_err(|e| {
        ConnectorError::AuthenticationFailed(format!(
            "failed to parse the provided token: {}",
            e
        ))
    })
}

/// Reads the `typ` claim from a JWT without verifying its signature.
///
/// Returns `Ok(None)` when the claim is absent.
pub fn token_type(token: &str) -> ConnectorResult<Option<String>> {
    match decode_claims(token)?.get("typ") {
        None => Ok(None),
        Some(serde_json::Value::String(typ)) => Ok(Some(typ.clone())),
        Some(other) => Err(ConnectorError::AuthenticationFailed(format!(
            "expected string 'typ' claim but got {}",
            other
        ))),
    }
}

/// Reads the `exp` claim from a JWT without verifying its signature.
///
/// Returns `Ok(None)` when the claim is absent.
pub fn token_expiry(token: &str) -> ConnectorResult<Option<DateTime<Utc>>> {
    let exp = match decode_claims(token)?.get("exp") {
        None => return Ok(None),
        Some(value) => value.as_i64().or_else(|| value.as_f64().map(|f| f as i64)),
    };
    match exp.and_then(|secs| DateTime::from_timestamp(secs, 0)) {
        Some(at) => Ok(Some(at)),
        None => Err(ConnectorError::AuthenticationFailed(
            "expected numeric 'exp' claim in the provided token".to_string(),
        )),
    }
}

/// Fails when an access token's `exp` claim is not after `now`.
///
/// A token without the claim is accepted; the gateway has the final say.
pub fn ensure_not_expired(token: &str, now: DateTime<Utc>) -> ConnectorResult<()> {
    match token_expiry(token)? {
        Some(expires_at) if expires_at <= now => Err(ConnectorError::AuthenticationFailed(
            format!("the provided ocm access token expired at {}", expires_at.to_rfc3339()),
        )),
        _ => Ok(()),
    }
}

/// Classifies a token by its `typ` claim.
pub fn classify_token(token: &str) -> ConnectorResult<TokenKind> {
    match token_type(token)?.as_deref() {
        Some("Bearer") => Ok(TokenKind::Bearer),
        Some("Refresh") => Ok(TokenKind::Refresh),
        Some("Offline") => Ok(TokenKind::Offline),
        None | Some("") => Err(ConnectorError::AuthenticationFailed(
            "no ocm token found to be provided".to_string(),
        )),
        Some(other) => Err(ConnectorError::AuthenticationFailed(format!(
            "unknown type of the ocm token found '{}'",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Session provider backed by Red Hat SSO and the OCM API gateways.
pub struct OcmSessionProvider {
    token_url: String,
    client_id: String,
    timeout_secs: u64,
    sso: HttpClient,
}

impl OcmSessionProvider {
    /// Creates a provider using the default SSO endpoint and client id.
    pub fn new() -> ConnectorResult<Self> {
        Self::with_token_url(DEFAULT_TOKEN_URL, DEFAULT_CLIENT_ID)
    }

    /// Creates a provider using a custom SSO endpoint.
    pub fn with_token_url(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
    ) -> ConnectorResult<Self> {
        let token_url = token_url.into();
        let sso = HttpClient::new(ConnectorConfig {
            name: "ocm-sso".to_string(),
            base_url: token_url.clone(),
            auth: AuthConfig::None,
            timeout_secs: 30,
            verify_tls: true,
            headers: HashMap::new(),
        })?;

        Ok(Self {
            token_url,
            client_id: client_id.into(),
            timeout_secs: 30,
            sso,
        })
    }

    /// Sets the request timeout of the inventory clients this provider builds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    async fn exchange_refresh_token(&self, token: &SecureString) -> ConnectorResult<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", token.expose_secret()),
        ];

        self.sso
            .post_form_absolute(&self.token_url, &form)
            .await
            .map_err(|e| {
                ConnectorError::AuthenticationFailed(format!(
                    "failed to exchange the refresh token at {}: {}",
                    self.token_url, e
                ))
            })
    }
}

#[async_trait]
impl SessionProvider for OcmSessionProvider {
    #[instrument(skip(self, token))]
    async fn login(&self, token: &SecureString, gateway_url: &str) -> ConnectorResult<Session> {
        let kind = classify_token(token.expose_secret())?;
        debug!(?kind, "Classified OCM token");

        let session = match kind {
            TokenKind::Bearer => {
                ensure_not_expired(token.expose_secret(), Utc::now())?;
                Session {
                    gateway_url: gateway_url.to_string(),
                    access_token: token.clone(),
                    refresh_token: None,
                }
            }
            TokenKind::Refresh | TokenKind::Offline => {
                let response = self.exchange_refresh_token(token).await?;
                Session {
                    gateway_url: gateway_url.to_string(),
                    access_token: SecureString::new(response.access_token),
                    refresh_token: Some(
                        response
                            .refresh_token
                            .map(SecureString::new)
                            .unwrap_or_else(|| token.clone()),
                    ),
                }
            }
        };

        info!("Logged in to OCM gateway");
        Ok(session)
    }

    async fn connect(&self, session: &Session) -> ConnectorResult<Arc<dyn InventoryClient>> {
        let client = OcmInventoryClient::new(ConnectorConfig {
            name: "ocm".to_string(),
            base_url: session.gateway_url.clone(),
            auth: AuthConfig::BearerToken {
                token: session.access_token.clone(),
            },
            timeout_secs: self.timeout_secs,
            verify_tls: true,
            headers: HashMap::new(),
        })?;
        Ok(Arc::new(client))
    }
}
