//! End-to-end discovery and checkup runs against the mock connectors.

use cc_connectors::testing::{sample_account, sample_cluster, sample_subscription};
use cc_connectors::{
    ClusterRecord, InventoryClient, MockInventoryClient, MockNotifier, MockSessionProvider,
    SecureString,
};
use cc_core::{
    evaluate, CheckupRunner, Environment, EnvironmentRegistry, ReportGenerator, ScanConfig,
    SkipReason, StaleClusterScanner, StaleCriteria, DIVIDER,
};
use chrono::{Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

const ORG: &str = "org-target";

/// Adds `count` stale clusters to `inventory`, every third one in another org.
async fn seed_inventory(inventory: &MockInventoryClient, count: usize) {
    inventory
        .add_subscription(sample_subscription("sub-target", Some(ORG), Some("acct-1")))
        .await;
    inventory
        .add_subscription(sample_subscription("sub-other", Some("org-other"), None))
        .await;
    inventory.add_account(sample_account("acct-1", "jdoe")).await;

    let now = Utc::now();
    for i in 0..count {
        let sub = if i % 3 == 0 { "sub-other" } else { "sub-target" };
        inventory
            .add_cluster(sample_cluster(
                &format!("c-{:04}", i),
                now - Duration::hours(48),
                Some(sub),
            ))
            .await;
    }
}

fn ids<'a>(clusters: impl IntoIterator<Item = &'a ClusterRecord>) -> BTreeSet<String> {
    clusters.into_iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn test_three_cluster_scenario() {
    let inventory = Arc::new(MockInventoryClient::new());
    inventory
        .add_subscription(sample_subscription("sub-target", Some(ORG), Some("acct-1")))
        .await;
    inventory
        .add_subscription(sample_subscription("sub-other", Some("org-other"), Some("acct-1")))
        .await;
    inventory.add_account(sample_account("acct-1", "jdoe")).await;

    let now = Utc::now();
    inventory
        .add_cluster(sample_cluster("young", now - Duration::hours(10), Some("sub-target")))
        .await;
    inventory
        .add_cluster(sample_cluster("foreign", now - Duration::hours(30), Some("sub-other")))
        .await;
    inventory
        .add_cluster(sample_cluster("stale", now - Duration::hours(48), Some("sub-target")))
        .await;

    let scanner = StaleClusterScanner::new(inventory.clone(), ScanConfig::default());
    let outcome = scanner.discover(ORG).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.instances.len(), 1);
    assert_eq!(outcome.instances[0].cluster.id, "stale");
    assert_eq!(outcome.stats.evaluated, 3);
    assert_eq!(outcome.stats.skipped_for(SkipReason::TooYoung), 1);
    assert_eq!(outcome.stats.skipped_for(SkipReason::OrganizationMismatch), 1);

    let report = ReportGenerator::default().render(&outcome.instances, "staging");
    assert_eq!(report.matches("*Cluster*:").count(), 1);
    assert!(report.contains("*Cluster*: stale-name"));
    assert!(report.contains("*Owner*: jdoe"));
    assert!(!report.ends_with('\n'));
}

#[tokio::test]
async fn test_pagination_stops_after_short_page() {
    let inventory = Arc::new(MockInventoryClient::new());
    seed_inventory(&inventory, 250).await;

    let scanner = StaleClusterScanner::new(inventory.clone(), ScanConfig::default());
    let outcome = scanner.discover(ORG).await;

    assert!(outcome.is_complete());
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(inventory.page_requests().await, vec![1, 2, 3]);
    assert_eq!(outcome.stats.evaluated, 250);
}

#[tokio::test]
async fn test_full_last_page_requests_one_empty_page() {
    let inventory = Arc::new(MockInventoryClient::new());
    seed_inventory(&inventory, 100).await;

    let scanner = StaleClusterScanner::new(inventory.clone(), ScanConfig::default());
    let outcome = scanner.discover(ORG).await;

    assert!(outcome.is_complete());
    assert_eq!(inventory.page_requests().await, vec![1, 2]);
    assert_eq!(outcome.stats.evaluated, 100);
}

#[tokio::test]
async fn test_page_failure_keeps_earlier_matches() {
    let inventory = Arc::new(MockInventoryClient::new());
    seed_inventory(&inventory, 30).await;
    inventory.fail_page(3).await;

    let config = ScanConfig::default().with_page_size(10);
    let scanner = StaleClusterScanner::new(inventory.clone(), config);
    let outcome = scanner.discover(ORG).await;

    let error = outcome.error.as_ref().expect("page 3 should fail");
    assert_eq!(error.page(), 3);
    assert!(error.to_string().contains("page 3"));
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(inventory.page_requests().await, vec![1, 2, 3]);

    // First 20 clusters, minus the ones in the other org (ids 0, 3, ..., 18).
    assert_eq!(outcome.instances.len(), 13);
    assert!(outcome
        .instances
        .iter()
        .all(|i| i.cluster.id.as_str() < "c-0020"));
}

#[tokio::test]
async fn test_concurrent_matches_equal_sequential() {
    let inventory = Arc::new(MockInventoryClient::new());
    seed_inventory(&inventory, 100).await;

    let criteria = StaleCriteria::new(ORG, Duration::hours(24));
    let now = Utc::now();
    let page = inventory.list_clusters(1, 100).await.unwrap();
    let mut expected = BTreeSet::new();
    for cluster in page.items {
        if let Some(instance) = evaluate(inventory.as_ref(), cluster, &criteria, now)
            .await
            .into_match()
        {
            expected.insert(instance.cluster.id);
        }
    }
    assert_eq!(expected.len(), 66);

    for max_concurrency in [1, 7, 100] {
        for _ in 0..5 {
            let config = ScanConfig::default().with_max_concurrency(max_concurrency);
            let scanner = StaleClusterScanner::new(inventory.clone(), config);
            let outcome = scanner.discover(ORG).await;

            assert_eq!(outcome.instances.len(), expected.len(), "no duplicates");
            assert_eq!(ids(outcome.instances.iter().map(|i| &i.cluster)), expected);
        }
    }
}

#[tokio::test]
async fn test_multi_environment_isolation() {
    let registry = EnvironmentRegistry::builtin();
    let environments = registry
        .parse_selectors(&["staging:org-target", "production:org-target"])
        .unwrap();

    let failing = Arc::new(MockInventoryClient::new());
    seed_inventory(&failing, 150).await;
    failing.fail_page(2).await;
    let empty = Arc::new(MockInventoryClient::new());

    let sessions = Arc::new(MockSessionProvider::new());
    sessions
        .add_inventory("https://api.stage.openshift.com", failing)
        .await;
    sessions
        .add_inventory("https://api.openshift.com", empty)
        .await;

    let runner = CheckupRunner::new(sessions.clone(), SecureString::from("token"));
    let notifier = MockNotifier::new();
    let report = runner
        .run_and_notify(&environments, &notifier, "C0123")
        .await
        .unwrap();

    let sections: Vec<&str> = report.split(DIVIDER).collect();
    assert_eq!(sections.len(), 3);
    assert!(sections[0].contains("*staging* environment"));
    assert!(sections[0]
        .contains("Some errors were encountered while fetching the stale cluster instances"));
    assert!(sections[0].contains("failed to list clusters for the page 2"));
    assert!(sections[1].contains("*production* environment"));
    assert!(sections[1].contains("No clusters were found to be older than 24h :D"));
    assert_eq!(sections[2], "\n\n");

    assert_eq!(
        sessions.logins().await,
        vec![
            "https://api.stage.openshift.com".to_string(),
            "https://api.openshift.com".to_string()
        ]
    );
    assert_eq!(notifier.message_count().await, 1);
}

#[tokio::test]
async fn test_login_failure_does_not_stop_later_environments() {
    let environments = vec![
        Environment {
            name: "broken".to_string(),
            url: "https://broken.example.com".to_string(),
            organization_id: ORG.to_string(),
        },
        Environment {
            name: "healthy".to_string(),
            url: "https://healthy.example.com".to_string(),
            organization_id: ORG.to_string(),
        },
    ];

    let healthy = Arc::new(MockInventoryClient::new());
    seed_inventory(&healthy, 3).await;

    let sessions = Arc::new(MockSessionProvider::new());
    sessions.fail_login("https://broken.example.com").await;
    sessions
        .add_inventory("https://healthy.example.com", healthy)
        .await;

    let runner = CheckupRunner::new(sessions, SecureString::from("token"));
    let report = runner.run_all(&environments).await;

    assert!(report.contains("failed to perform Clusters Checkup for the environment broken"));
    assert!(report.contains("failed to login into https://broken.example.com"));
    assert_eq!(report.matches("*Environment*: healthy").count(), 2);
}
