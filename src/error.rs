//! Error taxonomy for the crawl pipeline.
//!
//! Field and node extraction misses are not errors: they degrade to "N/A"
//! or drop the node (see [`crate::extract::StrategyOutcome`]).

use crate::record::Field;
use std::time::Duration;
use thiserror::Error;

/// A page failed to load or render.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("Timed out after {}ms waiting for results on {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("Blocked by storefront: {0}")]
    Blocked(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),
}

impl NavigationError {
    /// Fatal errors stop the crawl instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NavigationError::SessionLost(_))
    }
}

/// Malformed extraction or filter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid selector '{query}' for field {field}: {reason}")]
    InvalidSelector { field: Field, query: String, reason: String },

    #[error("Invalid pattern '{pattern}' for field {field}: {reason}")]
    InvalidPattern { field: Field, pattern: String, reason: String },

    #[error("Invalid field configuration for {field}: {reason}")]
    InvalidField { field: Field, reason: String },

    #[error("Invalid filter {key}: {reason}")]
    InvalidFilter { key: &'static str, reason: String },

    #[error("Invalid crawler setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// Errors surfaced by [`crate::crawler::PageCrawler::crawl`].
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
