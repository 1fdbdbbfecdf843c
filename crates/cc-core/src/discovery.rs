//! Paginated stale cluster discovery.
//!
//! Pages are fetched strictly in order. Every cluster on a page is
//! evaluated as its own task; the page finishes once all of its tasks have
//! finished, and only then is the next page requested.

use crate::error::DiscoveryError;
use crate::evaluator::{default_max_age, evaluate, Evaluation, SkipReason, StaleCriteria};
use crate::models::MatchedInstance;
use cc_connectors::{ClusterRecord, InventoryClient};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Items requested per inventory page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Tuning for a discovery run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Items requested per page. A shorter page ends the scan.
    pub page_size: u32,
    /// Upper bound on evaluations in flight at once.
    pub max_concurrency: usize,
    /// Clusters strictly older than this are stale.
    pub max_age: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrency: DEFAULT_PAGE_SIZE as usize,
            max_age: default_max_age(),
        }
    }
}

impl ScanConfig {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the age threshold in whole hours, at least one.
    pub fn with_max_age_hours(self, hours: u32) -> Self {
        self.with_max_age(Duration::hours(i64::from(hours.max(1))))
    }
}

/// Counters for one page, or summed across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    /// Clusters handed to the evaluator.
    pub evaluated: usize,
    /// Clusters reported as stale.
    pub matched: usize,
    /// Matches reported with a placeholder owner.
    pub unresolved_owners: usize,
    /// Evaluation tasks that did not complete.
    pub failed_units: usize,
    /// Excluded clusters, by reason.
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl PageStats {
    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &PageStats) {
        self.evaluated += other.evaluated;
        self.matched += other.matched;
        self.unresolved_owners += other.unresolved_owners;
        self.failed_units += other.failed_units;
        for (reason, count) in &other.skipped {
            *self.skipped.entry(*reason).or_default() += count;
        }
    }

    /// Total clusters excluded for any reason.
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Number of clusters excluded for `reason`.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    fn record(&mut self, evaluation: Evaluation) -> Option<MatchedInstance> {
        match evaluation {
            Evaluation::Matched(instance) => {
                self.matched += 1;
                if !instance.has_owner() {
                    self.unresolved_owners += 1;
                }
                Some(instance)
            }
            Evaluation::Skipped(reason) => {
                *self.skipped.entry(reason).or_default() += 1;
                None
            }
        }
    }
}

/// Matches and counters produced by one page.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    pub instances: Vec<MatchedInstance>,
    pub stats: PageStats,
}

/// Evaluates every cluster of one page concurrently and waits for all of them.
///
/// At most `max_concurrency` evaluations run at a time. Each task returns
/// its own evaluation and this function is the only place they are merged.
/// A task that panics is counted in [`PageStats::failed_units`] and does
/// not affect its siblings.
pub async fn process_page(
    client: Arc<dyn InventoryClient>,
    clusters: Vec<ClusterRecord>,
    criteria: Arc<StaleCriteria>,
    now: DateTime<Utc>,
    max_concurrency: usize,
) -> PageOutcome {
    let limiter = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut stats = PageStats {
        evaluated: clusters.len(),
        ..Default::default()
    };
    let mut tasks = JoinSet::new();

    for cluster in clusters {
        let client = Arc::clone(&client);
        let criteria = Arc::clone(&criteria);
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let _permit = limiter.acquire_owned().await.ok();
            evaluate(client.as_ref(), cluster, &criteria, now).await
        });
    }

    let mut instances = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(evaluation) => instances.extend(stats.record(evaluation)),
            Err(e) => {
                warn!(error = %e, "Cluster evaluation task failed");
                stats.failed_units += 1;
            }
        }
    }

    PageOutcome { instances, stats }
}

/// Everything one discovery run produced.
///
/// When `error` is set, `instances` holds the matches from the pages
/// before the failing one.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub instances: Vec<MatchedInstance>,
    pub pages_fetched: u32,
    pub stats: PageStats,
    pub error: Option<DiscoveryError>,
}

impl DiscoveryOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Walks an inventory page by page collecting stale clusters.
pub struct StaleClusterScanner {
    client: Arc<dyn InventoryClient>,
    config: ScanConfig,
}

impl StaleClusterScanner {
    pub fn new(client: Arc<dyn InventoryClient>, config: ScanConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Collects every stale cluster owned by `organization_id`.
    ///
    /// Stops after the first page holding fewer items than requested. A
    /// failed page fetch ends the run immediately; there is no retry.
    #[instrument(skip(self), fields(page_size = self.config.page_size))]
    pub async fn discover(&self, organization_id: &str) -> DiscoveryOutcome {
        let criteria = Arc::new(StaleCriteria::new(organization_id, self.config.max_age));
        let page_size = self.config.page_size.max(1);
        let mut outcome = DiscoveryOutcome::default();
        let mut page = 1u32;

        loop {
            debug!(page, "Fetching clusters page");
            let listed = match self.client.list_clusters(page, page_size).await {
                Ok(listed) => listed,
                Err(source) => {
                    warn!(page, error = %source, "Failed to fetch clusters page");
                    outcome.error = Some(DiscoveryError::PageFetch { page, source });
                    break;
                }
            };
            outcome.pages_fetched += 1;

            let received = listed.items.len();
            let now = Utc::now();
            let page_outcome = process_page(
                Arc::clone(&self.client),
                listed.items,
                Arc::clone(&criteria),
                now,
                self.config.max_concurrency,
            )
            .await;

            let stats = &page_outcome.stats;
            debug!(
                page,
                evaluated = stats.evaluated,
                matched = stats.matched,
                skipped = stats.skipped_total(),
                unresolved_owners = stats.unresolved_owners,
                failed_units = stats.failed_units,
                "Processed clusters page"
            );
            outcome.stats.merge(stats);
            outcome.instances.extend(page_outcome.instances);

            if received < page_size as usize {
                break;
            }
            page += 1;
        }

        info!(
            pages = outcome.pages_fetched,
            evaluated = outcome.stats.evaluated,
            matched = outcome.stats.matched,
            complete = outcome.is_complete(),
            "Stale cluster discovery finished"
        );
        outcome
    }
}
