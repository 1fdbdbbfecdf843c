//! # cc-observability
//!
//! Structured logging bootstrap for the clusters checker.

pub mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
