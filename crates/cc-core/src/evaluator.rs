//! Stale cluster evaluation.
//!
//! A cluster matches when it is older than the age threshold and its
//! subscription belongs to the target organization. Organization
//! membership is a hard filter: any gap in the cluster → subscription →
//! organization chain excludes the cluster. Owner resolution is best
//! effort: a gap in the subscription → creator → account chain yields a
//! placeholder owner and the match is still reported.
//!
//! No lookups are cached; evaluating the same cluster twice fetches twice.

use crate::models::MatchedInstance;
use cc_connectors::{AccountRecord, ClusterRecord, InventoryClient, SubscriptionRecord};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Default age past which a cluster is considered stale.
pub fn default_max_age() -> Duration {
    Duration::hours(24)
}

/// What makes a cluster a match.
#[derive(Debug, Clone)]
pub struct StaleCriteria {
    /// Organization whose clusters are reported.
    pub organization_id: String,
    /// Clusters must be strictly older than this.
    pub max_age: Duration,
}

impl StaleCriteria {
    pub fn new(organization_id: impl Into<String>, max_age: Duration) -> Self {
        Self {
            organization_id: organization_id.into(),
            max_age,
        }
    }
}

/// Why a cluster was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingCreationTimestamp,
    TooYoung,
    MissingSubscription,
    SubscriptionLookupFailed,
    /// The subscription carries no organization id. A data-quality problem.
    OrganizationMissing,
    /// The subscription belongs to another organization. Expected filtering.
    OrganizationMismatch,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingCreationTimestamp => "missing_creation_timestamp",
            SkipReason::TooYoung => "too_young",
            SkipReason::MissingSubscription => "missing_subscription",
            SkipReason::SubscriptionLookupFailed => "subscription_lookup_failed",
            SkipReason::OrganizationMissing => "organization_missing",
            SkipReason::OrganizationMismatch => "organization_mismatch",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Matched(MatchedInstance),
    Skipped(SkipReason),
}

impl Evaluation {
    /// Converts into the matched instance, if any.
    pub fn into_match(self) -> Option<MatchedInstance> {
        match self {
            Evaluation::Matched(instance) => Some(instance),
            Evaluation::Skipped(_) => None,
        }
    }
}

/// Returns true if a cluster created at `created_at` is strictly older than `max_age` at `now`.
pub fn is_stale(created_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(created_at) > max_age
}

/// Evaluates one cluster against `criteria` as of `now`.
pub async fn evaluate<C>(
    client: &C,
    cluster: ClusterRecord,
    criteria: &StaleCriteria,
    now: DateTime<Utc>,
) -> Evaluation
where
    C: InventoryClient + ?Sized,
{
    let cluster_id = cluster.id.as_str();
    debug!(cluster_id, "Evaluating cluster");

    let Some(created_at) = cluster.creation_timestamp else {
        debug!(cluster_id, "Skipping cluster without a creation timestamp");
        return Evaluation::Skipped(SkipReason::MissingCreationTimestamp);
    };

    if !is_stale(created_at, now, criteria.max_age) {
        debug!(cluster_id, %created_at, "Skipping cluster younger than the age threshold");
        return Evaluation::Skipped(SkipReason::TooYoung);
    }

    let Some(subscription_id) = cluster.subscription.as_ref().and_then(|s| s.id()) else {
        warn!(cluster_id, "Unable to find the subscription id of the cluster, skipping");
        return Evaluation::Skipped(SkipReason::MissingSubscription);
    };

    let subscription = match client.get_subscription(subscription_id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(
                cluster_id,
                subscription_id,
                error = %e,
                "Unable to fetch the subscription of the cluster, skipping"
            );
            return Evaluation::Skipped(SkipReason::SubscriptionLookupFailed);
        }
    };

    match subscription.organization_id() {
        None => {
            warn!(
                cluster_id,
                subscription_id, "Subscription carries no organization id, skipping"
            );
            return Evaluation::Skipped(SkipReason::OrganizationMissing);
        }
        Some(org) if org != criteria.organization_id => {
            debug!(cluster_id, organization_id = org, "Cluster belongs to another organization");
            return Evaluation::Skipped(SkipReason::OrganizationMismatch);
        }
        Some(_) => {}
    }

    info!(cluster_id, %created_at, "Cluster found to be older than the age threshold");
    let owner = resolve_owner(client, &subscription).await;
    if owner.is_placeholder() {
        warn!(
            cluster_id,
            "Unable to find the account details of the cluster owner, reporting without them"
        );
    }

    Evaluation::Matched(MatchedInstance::new(cluster, owner))
}

/// Resolves the account that created `subscription`, or the placeholder.
async fn resolve_owner<C>(client: &C, subscription: &SubscriptionRecord) -> AccountRecord
where
    C: InventoryClient + ?Sized,
{
    let Some(account_id) = subscription.creator_id() else {
        debug!(subscription_id = %subscription.id, "Subscription has no creator account id");
        return AccountRecord::placeholder();
    };

    match client.get_account(account_id).await {
        Ok(account) => account,
        Err(e) => {
            warn!(account_id, error = %e, "Failed to get the owner account details");
            AccountRecord::placeholder()
        }
    }
}
