//! OCM inventory connector.
//!
//! Reads clusters from the clusters management API and subscription and
//! account details from the accounts management API.

use crate::http::HttpClient;
use crate::traits::{
    AccountRecord, ClusterPage, ClusterRecord, ConnectorConfig, ConnectorError, ConnectorResult,
    InventoryClient, ObjectReference, SubscriptionRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

const CLUSTERS_PATH: &str = "/api/clusters_mgmt/v1/clusters";
const SUBSCRIPTIONS_PATH: &str = "/api/accounts_mgmt/v1/subscriptions";
const ACCOUNTS_PATH: &str = "/api/accounts_mgmt/v1/accounts";

/// Inventory client for one OCM gateway.
pub struct OcmInventoryClient {
    client: HttpClient,
}

impl OcmInventoryClient {
    /// Creates a new OCM inventory client.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        let client = HttpClient::new(config)?;
        info!(base_url = %client.base_url(), "OCM inventory client initialized");
        Ok(Self { client })
    }
}

/// Rejects identifiers that could escape their path segment.
fn checked_id<'a>(kind: &str, id: &'a str) -> ConnectorResult<&'a str> {
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ConnectorError::InvalidRequest(format!(
            "invalid {} id '{}'",
            kind, id
        )));
    }
    Ok(id)
}

#[async_trait]
impl InventoryClient for OcmInventoryClient {
    #[instrument(skip(self))]
    async fn list_clusters(&self, page: u32, size: u32) -> ConnectorResult<ClusterPage> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        let response: OcmClusterList = self
            .client
            .get_json_with_query(CLUSTERS_PATH, &query)
            .await?;

        let page = response.into_page(page);
        debug!(items = page.items.len(), total = ?page.total, "Fetched cluster page");
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn get_subscription(&self, id: &str) -> ConnectorResult<SubscriptionRecord> {
        let path = format!("{}/{}", SUBSCRIPTIONS_PATH, checked_id("subscription", id)?);
        let response: OcmSubscription = self.client.get_json(&path).await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn get_account(&self, id: &str) -> ConnectorResult<AccountRecord> {
        let path = format!("{}/{}", ACCOUNTS_PATH, checked_id("account", id)?);
        let response: OcmAccount = self.client.get_json(&path).await?;
        Ok(response.into())
    }
}

// OCM API response types

#[derive(Debug, Deserialize)]
struct OcmClusterList {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    items: Vec<OcmCluster>,
}

impl OcmClusterList {
    fn into_page(self, requested_page: u32) -> ClusterPage {
        let items: Vec<ClusterRecord> = self.items.into_iter().map(Into::into).collect();
        ClusterPage {
            page: self.page.unwrap_or(requested_page),
            size: self.size.unwrap_or(items.len() as u32),
            total: self.total,
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OcmCluster {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    subscription: Option<OcmLink>,
}

#[derive(Debug, Deserialize)]
struct OcmLink {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

impl From<OcmLink> for ObjectReference {
    fn from(link: OcmLink) -> Self {
        ObjectReference {
            id: link.id,
            href: link.href,
        }
    }
}

impl From<OcmCluster> for ClusterRecord {
    fn from(cluster: OcmCluster) -> Self {
        ClusterRecord {
            id: cluster.id,
            name: cluster.name.unwrap_or_default(),
            external_id: cluster.external_id.unwrap_or_default(),
            creation_timestamp: cluster.creation_timestamp,
            subscription: cluster.subscription.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OcmSubscription {
    id: String,
    #[serde(default)]
    organization_id: Option<String>,
    #[serde(default)]
    creator: Option<OcmLink>,
}

impl From<OcmSubscription> for SubscriptionRecord {
    fn from(sub: OcmSubscription) -> Self {
        SubscriptionRecord {
            id: sub.id,
            organization_id: sub.organization_id,
            creator: sub.creator.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OcmAccount {
    #[serde(default)]
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

impl From<OcmAccount> for AccountRecord {
    fn from(account: OcmAccount) -> Self {
        AccountRecord {
            id: account.id,
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        }
    }
}
