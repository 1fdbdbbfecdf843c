//! Collaboration tool connectors.
//!
//! Delivers the consolidated checkup report to an operator channel.

pub mod mock;
pub mod slack;

pub use mock::{MockNotifier, RecordedMessage};
pub use slack::{SlackConfig, SlackConnector};
