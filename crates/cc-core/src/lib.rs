//! # cc-core
//!
//! Stale cluster discovery for the clusters checker.
//!
//! For each configured environment the [`CheckupRunner`] logs into the
//! gateway, walks the cluster inventory page by page with a
//! [`StaleClusterScanner`], and renders what it found with a
//! [`ReportGenerator`]. Per-environment outcomes are joined into one
//! report for delivery.

pub mod discovery;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod report;
pub mod runner;

pub use discovery::{
    process_page, DiscoveryOutcome, PageOutcome, PageStats, ScanConfig, StaleClusterScanner,
    DEFAULT_PAGE_SIZE,
};
pub use environment::{Environment, EnvironmentRegistry};
pub use error::{CheckupError, DiscoveryError, EnvironmentError};
pub use evaluator::{default_max_age, evaluate, is_stale, Evaluation, SkipReason, StaleCriteria};
pub use models::{CheckupResult, MatchedInstance};
pub use report::{describe_threshold, format_age, ReportGenerator};
pub use runner::{consolidate, CheckupRunner, DIVIDER};
