//! Navigation and page access seams used by the crawler.

pub mod http;

use crate::error::NavigationError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub use http::HttpNavigator;

/// Drives a single browsing session - enables mocking for tests.
///
/// One navigator owns one page; the crawler borrows it mutably so pages are
/// always loaded one after another.
#[async_trait]
pub trait Navigator: Send {
    /// Loads `url` as the current page.
    async fn load(&mut self, url: &str) -> Result<(), NavigationError>;

    /// Waits until `query` matches on the current page. `Ok(false)` on timeout.
    async fn wait_for_selector(
        &mut self,
        query: &str,
        timeout: Duration,
    ) -> Result<bool, NavigationError>;

    /// Snapshot of the current page's DOM.
    fn page(&self) -> Result<Page, NavigationError>;
}

/// Read-only access to a loaded page.
pub struct Page {
    document: Html,
}

impl Page {
    /// Parses a full HTML document.
    pub fn parse(html: &str) -> Self {
        Self { document: Html::parse_document(html) }
    }

    /// All elements matching `selector`, in document order. May be empty.
    pub fn find_all(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.document.select(selector).collect()
    }

    /// Whether anything matches `selector`.
    pub fn contains(&self, selector: &Selector) -> bool {
        self.document.select(selector).next().is_some()
    }
}
