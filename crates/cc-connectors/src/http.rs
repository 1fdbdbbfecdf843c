//! HTTP utilities for connectors.
//!
//! Every call is sent exactly once. Failures are mapped onto
//! [`ConnectorError`] and returned to the caller, which decides whether
//! the failure is fatal.

use crate::traits::{AuthConfig, ConnectorConfig, ConnectorError, ConnectorResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest response body excerpt carried in an error message.
const BODY_EXCERPT_CHARS: usize = 500;

/// HTTP client bound to one connector's base URL and credentials.
pub struct HttpClient {
    client: Client,
    config: ConnectorConfig,
}

impl HttpClient {
    /// Creates a new HTTP client from connector configuration.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        if !config.verify_tls {
            warn!(
                base_url = %config.base_url,
                connector_name = %config.name,
                "TLS certificate verification disabled"
            );
        }

        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, val);
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .default_headers(headers)
            .build()
            .map_err(|e| ConnectorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Builds a URL from a path.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Executes a GET request and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ConnectorResult<T> {
        let request = self.client.get(self.build_url(path));
        let response = self.execute(request).await?;
        parse_json_response(response).await
    }

    /// Executes a GET request with query parameters and deserializes the JSON response.
    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> ConnectorResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.client.get(self.build_url(path)).query(query);
        let response = self.execute(request).await?;
        parse_json_response(response).await
    }

    /// Executes a POST request with a JSON body and deserializes the JSON response.
    pub async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> ConnectorResult<R> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.execute(request).await?;
        parse_json_response(response).await
    }

    /// Executes a form-encoded POST against an absolute URL without adding
    /// the connector's credentials. Used for token exchange.
    pub async fn post_form_absolute<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        url: &str,
        form: &T,
    ) -> ConnectorResult<R> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;
        parse_json_response(response).await
    }

    async fn execute(&self, request: RequestBuilder) -> ConnectorResult<Response> {
        let request = self.add_auth(request);
        let response = request.send().await.map_err(map_transport_error)?;
        debug!(status = %response.status(), url = %response.url(), "Received response");
        check_status(response).await
    }

    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::BearerToken { token } => {
                request.header("Authorization", format!("Bearer {}", token.expose_secret()))
            }
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> ConnectorError {
    if e.is_timeout() {
        ConnectorError::Timeout(e.to_string())
    } else if e.is_connect() {
        ConnectorError::ConnectionFailed(e.to_string())
    } else {
        ConnectorError::RequestFailed(e.to_string())
    }
}

async fn check_status(response: Response) -> ConnectorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_status(status, &body))
}

fn map_status(status: StatusCode, body: &str) -> ConnectorError {
    let excerpt = excerpt(body);
    match status {
        StatusCode::UNAUTHORIZED => ConnectorError::AuthenticationFailed(excerpt),
        StatusCode::FORBIDDEN => ConnectorError::AuthorizationDenied(excerpt),
        StatusCode::NOT_FOUND => ConnectorError::NotFound(excerpt),
        StatusCode::BAD_REQUEST => ConnectorError::InvalidRequest(excerpt),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ConnectorError::Timeout(format!("{}: {}", status, excerpt))
        }
        _ => ConnectorError::RequestFailed(format!("{}: {}", status, excerpt)),
    }
}

async fn parse_json_response<T: DeserializeOwned>(response: Response) -> ConnectorResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;

    serde_json::from_str(&text).map_err(|e| {
        ConnectorError::InvalidResponse(format!(
            "Failed to parse response (status {}): {} - Body: {}",
            status,
            e,
            excerpt(&text)
        ))
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
