//! Result types produced by the discovery pipeline.

use crate::error::CheckupError;
use cc_connectors::{AccountRecord, ClusterRecord};

/// A stale cluster together with its resolved owner.
///
/// `owner` is [`AccountRecord::placeholder`] when the owner could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedInstance {
    pub cluster: ClusterRecord,
    pub owner: AccountRecord,
}

impl MatchedInstance {
    pub fn new(cluster: ClusterRecord, owner: AccountRecord) -> Self {
        Self { cluster, owner }
    }

    /// Returns true if an owner account was resolved.
    pub fn has_owner(&self) -> bool {
        !self.owner.is_placeholder()
    }
}

/// Outcome of checking one environment.
///
/// A failure annotation can accompany a partial success report, so more
/// than one field may be set at once.
#[derive(Debug, Clone, Default)]
pub struct CheckupResult {
    /// Name of the environment that was checked.
    pub environment: String,
    /// Rendered report, possibly for a partial inventory.
    pub success: Option<String>,
    /// Human-readable note about what went wrong.
    pub failure: Option<String>,
    /// The error that stopped the checkup, if any.
    pub error: Option<CheckupError>,
}

impl CheckupResult {
    /// Returns true if nothing went wrong for this environment.
    pub fn is_clean(&self) -> bool {
        self.failure.is_none() && self.error.is_none()
    }

    /// The lines this result contributes to the consolidated report, in
    /// success, failure, error order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if let Some(success) = self.success.as_deref().filter(|s| !s.is_empty()) {
            lines.push(success.to_string());
        }
        if let Some(failure) = self.failure.as_deref().filter(|s| !s.is_empty()) {
            lines.push(failure.to_string());
        }
        if let Some(error) = &self.error {
            lines.push(error.to_string());
        }
        lines
    }
}
