//! CLI command implementations.

pub mod crawl;
pub mod fields;

pub use crawl::{CrawlCommand, CrawlOptions, CrawlResult};
pub use fields::FieldsCommand;
