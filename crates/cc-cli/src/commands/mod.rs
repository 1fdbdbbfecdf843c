//! Subcommand implementations.

mod environments;
mod scan;

pub use environments::list_environments;
pub use scan::{run_scan, ScanOptions};
