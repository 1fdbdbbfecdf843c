//! Error types for the discovery pipeline.

use cc_connectors::ConnectorError;
use thiserror::Error;

/// Errors raised while resolving configured environments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("{0} found to be provided in unexpected format. Expected format is env:orgid")]
    MalformedSelector(String),

    #[error("unknown environment '{name}'. Expected one of: {known}")]
    UnknownEnvironment { name: String, known: String },

    #[error("no organization id provided for the environment {0}")]
    MissingOrganization(String),
}

/// Errors that stop discovery for one environment.
#[derive(Error, Debug, Clone)]
pub enum DiscoveryError {
    #[error("failed to list clusters for the page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: ConnectorError,
    },
}

impl DiscoveryError {
    /// The page number that failed to load.
    pub fn page(&self) -> u32 {
        match self {
            DiscoveryError::PageFetch { page, .. } => *page,
        }
    }
}

/// Errors recorded against one environment's checkup, or raised for the whole run.
#[derive(Error, Debug, Clone)]
pub enum CheckupError {
    #[error("failed to login into {url} with the provided ocm token: {source}")]
    Login {
        url: String,
        #[source]
        source: ConnectorError,
    },

    #[error("failed to establish a connection with {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: ConnectorError,
    },

    #[error("failed to notify about the stale cluster instances on channel {channel}: {source}")]
    Notification {
        channel: String,
        #[source]
        source: ConnectorError,
    },
}
