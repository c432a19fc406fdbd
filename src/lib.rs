//! amz-harvest - Resilient Amazon search-listing harvester
//!
//! Crawls paginated search listings over a [`browser::Navigator`], extracts
//! one [`Record`] per result node with per-field fallback chains, then
//! filters and summarizes the records.

pub mod browser;
pub mod commands;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod filters;
pub mod format;
pub mod record;
pub mod report;

pub use config::Config;
pub use crawler::{CrawlOutcome, PageCrawler, SortBy, Termination};
pub use error::{ConfigError, CrawlError, NavigationError};
pub use filters::FilterSpec;
pub use record::{Field, Record};
pub use report::StatsTable;
