//! Mock inventory and session provider for testing.
//!
//! Serves clusters, subscriptions, and accounts from memory. Paging
//! follows the server semantics: page `n` of size `s` holds items
//! `(n-1)*s .. n*s`.

use crate::traits::{
    AccountRecord, ClusterPage, ClusterRecord, ConnectorError, ConnectorResult, InventoryClient,
    Session, SessionProvider, SubscriptionRecord,
};
use crate::SecureString;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory inventory for testing.
#[derive(Default)]
pub struct MockInventoryClient {
    clusters: RwLock<Vec<ClusterRecord>>,
    subscriptions: RwLock<HashMap<String, SubscriptionRecord>>,
    accounts: RwLock<HashMap<String, AccountRecord>>,
    failing_pages: RwLock<HashSet<u32>>,
    failing_subscriptions: RwLock<HashSet<String>>,
    page_requests: RwLock<Vec<u32>>,
    subscription_lookups: AtomicUsize,
    account_lookups: AtomicUsize,
}

impl MockInventoryClient {
    /// Creates an empty mock inventory.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_cluster(&self, cluster: ClusterRecord) {
        self.clusters.write().await.push(cluster);
    }

    pub async fn add_subscription(&self, subscription: SubscriptionRecord) {
        self.subscriptions
            .write()
            .await
            .insert(subscription.id.clone(), subscription);
    }

    pub async fn add_account(&self, account: AccountRecord) {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account);
    }

    /// Makes `list_clusters` fail for the given page.
    pub async fn fail_page(&self, page: u32) {
        self.failing_pages.write().await.insert(page);
    }

    /// Makes `get_subscription` fail with a request error for the given id.
    pub async fn fail_subscription(&self, id: &str) {
        self.failing_subscriptions
            .write()
            .await
            .insert(id.to_string());
    }

    /// Pages requested so far, in request order.
    pub async fn page_requests(&self) -> Vec<u32> {
        self.page_requests.read().await.clone()
    }

    pub fn subscription_lookups(&self) -> usize {
        self.subscription_lookups.load(Ordering::SeqCst)
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryClient for MockInventoryClient {
    async fn list_clusters(&self, page: u32, size: u32) -> ConnectorResult<ClusterPage> {
        self.page_requests.write().await.push(page);

        if self.failing_pages.read().await.contains(&page) {
            return Err(ConnectorError::ConnectionFailed(format!(
                "mock failure on page {}",
                page
            )));
        }
        if page == 0 || size == 0 {
            return Err(ConnectorError::InvalidRequest(
                "page and size must be positive".to_string(),
            ));
        }

        let clusters = self.clusters.read().await;
        let start = ((page - 1) as usize).saturating_mul(size as usize);
        let items: Vec<ClusterRecord> = clusters
            .iter()
            .skip(start)
            .take(size as usize)
            .cloned()
            .collect();

        Ok(ClusterPage {
            page,
            size: items.len() as u32,
            total: Some(clusters.len() as u32),
            items,
        })
    }

    async fn get_subscription(&self, id: &str) -> ConnectorResult<SubscriptionRecord> {
        self.subscription_lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.failing_subscriptions.read().await.contains(id) {
            return Err(ConnectorError::RequestFailed(format!(
                "mock failure for subscription {}",
                id
            )));
        }
        self.subscriptions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("subscription {}", id)))
    }

    async fn get_account(&self, id: &str) -> ConnectorResult<AccountRecord> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.accounts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(format!("account {}", id)))
    }
}

/// Session provider that hands out preconfigured mock inventories per gateway.
#[derive(Default)]
pub struct MockSessionProvider {
    inventories: RwLock<HashMap<String, Arc<MockInventoryClient>>>,
    failing_logins: RwLock<HashSet<String>>,
    failing_connects: RwLock<HashSet<String>>,
    logins: RwLock<Vec<String>>,
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the inventory served for `gateway_url`.
    pub async fn add_inventory(&self, gateway_url: &str, inventory: Arc<MockInventoryClient>) {
        self.inventories
            .write()
            .await
            .insert(gateway_url.to_string(), inventory);
    }

    /// Makes `login` fail for `gateway_url`.
    pub async fn fail_login(&self, gateway_url: &str) {
        self.failing_logins
            .write()
            .await
            .insert(gateway_url.to_string());
    }

    /// Makes `connect` fail for `gateway_url`.
    pub async fn fail_connect(&self, gateway_url: &str) {
        self.failing_connects
            .write()
            .await
            .insert(gateway_url.to_string());
    }

    /// Gateways logged into so far, in order.
    pub async fn logins(&self) -> Vec<String> {
        self.logins.read().await.clone()
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn login(&self, token: &SecureString, gateway_url: &str) -> ConnectorResult<Session> {
        self.logins.write().await.push(gateway_url.to_string());

        if token.is_blank() {
            return Err(ConnectorError::AuthenticationFailed(
                "no ocm token found to be provided".to_string(),
            ));
        }
        if self.failing_logins.read().await.contains(gateway_url) {
            return Err(ConnectorError::AuthenticationFailed(format!(
                "mock login rejected for {}",
                gateway_url
            )));
        }

        Ok(Session {
            gateway_url: gateway_url.to_string(),
            access_token: token.clone(),
            refresh_token: None,
        })
    }

    async fn connect(&self, session: &Session) -> ConnectorResult<Arc<dyn InventoryClient>> {
        if self
            .failing_connects
            .read()
            .await
            .contains(&session.gateway_url)
        {
            return Err(ConnectorError::ConnectionFailed(format!(
                "mock connection refused for {}",
                session.gateway_url
            )));
        }

        let inventory = self
            .inventories
            .read()
            .await
            .get(&session.gateway_url)
            .cloned()
            .unwrap_or_default();
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_cluster;
    use chrono::Utc;

    async fn inventory_with(count: usize) -> MockInventoryClient {
        let inventory = MockInventoryClient::new();
        for i in 0..count {
            inventory
                .add_cluster(sample_cluster(&format!("c-{}", i), Utc::now(), None))
                .await;
        }
        inventory
    }

    #[tokio::test]
    async fn test_paging_slices_inventory() {
        let inventory = inventory_with(5).await;

        let first = inventory.list_clusters(1, 2).await.unwrap();
        let third = inventory.list_clusters(3, 2).await.unwrap();
        let fourth = inventory.list_clusters(4, 2).await.unwrap();

        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].id, "c-0");
        assert_eq!(third.items.len(), 1);
        assert_eq!(third.items[0].id, "c-4");
        assert!(fourth.items.is_empty());
        assert_eq!(inventory.page_requests().await, vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_failing_page() {
        let inventory = inventory_with(3).await;
        inventory.fail_page(2).await;

        assert!(inventory.list_clusters(1, 1).await.is_ok());
        assert!(inventory.list_clusters(2, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_lookups_are_counted() {
        let inventory = MockInventoryClient::new();
        assert!(inventory.get_subscription("missing").await.is_err());
        assert!(inventory.get_account("missing").await.is_err());
        assert_eq!(inventory.subscription_lookups(), 1);
        assert_eq!(inventory.account_lookups(), 1);
    }

    #[tokio::test]
    async fn test_session_provider_failures() {
        let provider = MockSessionProvider::new();
        provider.fail_login("https://bad.example.com").await;
        let token = SecureString::from("token");

        assert!(provider
            .login(&token, "https://bad.example.com")
            .await
            .is_err());
        assert!(provider
            .login(&SecureString::default(), "https://ok.example.com")
            .await
            .is_err());

        let session = provider
            .login(&token, "https://ok.example.com")
            .await
            .unwrap();
        assert!(provider.connect(&session).await.is_ok());

        provider.fail_connect("https://ok.example.com").await;
        assert!(provider.connect(&session).await.is_err());
    }
}
