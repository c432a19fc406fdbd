//! Paginated crawl control with per-page retries.
//!
//! A crawl walks pages `1..=max_pages` of one keyword's listing over a single
//! navigator:
//!
//! ```text
//! Loading{attempt} --ok--> Extracting --> CheckingNext --next--> Loading{1}
//!    ^   |                  |    |              |
//!    +---+--retry-----------+    +--no nodes--> Done <--last page / limit
//!        +--exhausted--> Done
//! ```
//!
//! Every terminal state returns the records gathered so far together with a
//! [`Termination`] saying why the crawl stopped.

pub mod events;
pub mod sort;

pub use events::{CrawlEvent, EventSink, MemorySink, TracingSink};
pub use sort::{search_url, SortBy};

use crate::browser::Navigator;
use crate::config::CrawlerConfig;
use crate::error::{ConfigError, CrawlError, NavigationError};
use crate::extract::selectors::page as selectors;
use crate::extract::{FieldSpecs, RecordExtractor};
use crate::record::Record;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// A page had no result nodes.
    NoMoreResults,
    /// The last page had no enabled next-page control.
    LastPage,
    /// `max_pages` pages were crawled.
    PageLimit,
    /// A page kept failing to load.
    Failed { page: u32, attempts: u32, reason: String },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NoMoreResults => write!(f, "no more results"),
            Termination::LastPage => write!(f, "last page"),
            Termination::PageLimit => write!(f, "page limit reached"),
            Termination::Failed { page, attempts, reason } => {
                write!(f, "page {} failed after {} attempts: {}", page, attempts, reason)
            }
        }
    }
}

/// Result of crawling one keyword.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub keyword: String,
    pub records: Vec<Record>,
    pub pages_crawled: u32,
    pub termination: Termination,
}

impl CrawlOutcome {
    /// Whether the crawl stopped because a page could not be loaded.
    pub fn is_partial(&self) -> bool {
        matches!(self.termination, Termination::Failed { .. })
    }
}

enum State {
    Loading { page: u32, attempt: u32 },
    Extracting { page: u32, attempt: u32 },
    CheckingNext { page: u32, has_next: bool },
    Done(Termination),
}

enum LoadOutcome {
    Ready,
    NoResults,
}

/// Records and pagination state read from one loaded page.
struct PageScan {
    nodes: usize,
    records: Vec<Record>,
    has_next: bool,
}

/// Crawls search listings page by page over one navigator.
pub struct PageCrawler<'a, N: Navigator> {
    navigator: &'a mut N,
    settings: &'a CrawlerConfig,
    base_url: &'a str,
    extractor: RecordExtractor<'a>,
    events: &'a dyn EventSink,
}

impl<'a, N: Navigator> PageCrawler<'a, N> {
    /// Creates a crawler, rejecting settings it cannot run with.
    pub fn new(
        navigator: &'a mut N,
        settings: &'a CrawlerConfig,
        base_url: &'a str,
        fields: &'a FieldSpecs,
        events: &'a dyn EventSink,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            navigator,
            settings,
            base_url,
            extractor: RecordExtractor::new(fields, base_url),
            events,
        })
    }

    /// Crawls up to `max_pages` pages of `keyword`'s listing.
    ///
    /// Load failures are retried up to `max_retries` attempts per page; a page
    /// that never loads ends the crawl with [`Termination::Failed`] and the
    /// records gathered before it. Only fatal navigator errors are returned
    /// as `Err`.
    pub async fn crawl(
        &mut self,
        keyword: &str,
        max_pages: u32,
        sort: SortBy,
    ) -> Result<CrawlOutcome, CrawlError> {
        if max_pages == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_pages",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        debug!("Crawling '{}' (max {} pages, sort {})", keyword, max_pages, sort);

        let mut records = Vec::new();
        let mut pages_crawled = 0;
        let mut state = State::Loading { page: 1, attempt: 1 };

        let termination = loop {
            state = match state {
                State::Loading { page, attempt } => {
                    let url = search_url(self.base_url, keyword, sort, page);

                    match self.load(&url).await {
                        Ok(LoadOutcome::Ready) => {
                            self.events.emit(&CrawlEvent::PageLoaded { page, url });
                            State::Extracting { page, attempt }
                        }
                        Ok(LoadOutcome::NoResults) => {
                            debug!("Page {} reports no results", page);
                            State::Done(Termination::NoMoreResults)
                        }
                        Err(e) => self.retry_or_fail(page, attempt, e).await?,
                    }
                }

                State::Extracting { page, attempt } => match self.scan(keyword, page) {
                    Ok(scan) => {
                        pages_crawled = page;

                        self.events.emit(&CrawlEvent::PageExtracted {
                            page,
                            nodes: scan.nodes,
                            records: scan.records.len(),
                        });

                        if scan.nodes == 0 {
                            State::Done(Termination::NoMoreResults)
                        } else {
                            records.extend(scan.records);
                            State::CheckingNext { page, has_next: scan.has_next }
                        }
                    }
                    // The document went away after the wait; reload the page.
                    Err(e) => self.retry_or_fail(page, attempt, e).await?,
                },

                State::CheckingNext { page, has_next } => {
                    if !has_next {
                        State::Done(Termination::LastPage)
                    } else if page >= max_pages {
                        State::Done(Termination::PageLimit)
                    } else {
                        self.politeness_delay().await;
                        State::Loading { page: page + 1, attempt: 1 }
                    }
                }

                State::Done(termination) => break termination,
            };
        };

        self.events.emit(&CrawlEvent::Finished {
            keyword: keyword.to_string(),
            pages: pages_crawled,
            records: records.len(),
            termination: termination.clone(),
        });

        Ok(CrawlOutcome { keyword: keyword.to_string(), records, pages_crawled, termination })
    }

    /// Schedules another attempt at `page`, or ends the crawl once the
    /// attempts are used up. Fatal errors are returned.
    async fn retry_or_fail(
        &self,
        page: u32,
        attempt: u32,
        error: NavigationError,
    ) -> Result<State, CrawlError> {
        if error.is_fatal() {
            return Err(error.into());
        }

        if attempt < self.settings.max_retries {
            self.events.emit(&CrawlEvent::PageRetry {
                page,
                attempt,
                max_retries: self.settings.max_retries,
                error: error.to_string(),
            });
            sleep(self.settings.backoff_delay(attempt)).await;
            return Ok(State::Loading { page, attempt: attempt + 1 });
        }

        self.events.emit(&CrawlEvent::PageFailed {
            page,
            attempts: attempt,
            error: error.to_string(),
        });

        Ok(State::Done(Termination::Failed { page, attempts: attempt, reason: error.to_string() }))
    }

    /// Loads `url` and waits for the results container.
    async fn load(&mut self, url: &str) -> Result<LoadOutcome, NavigationError> {
        self.navigator.load(url).await?;

        let timeout = self.settings.page_timeout();
        if self.navigator.wait_for_selector(selectors::RESULT_QUERY, timeout).await? {
            return Ok(LoadOutcome::Ready);
        }

        // An explicit "no results" page ends the listing instead of timing out.
        if self.navigator.page()?.contains(&selectors::NO_RESULTS) {
            return Ok(LoadOutcome::NoResults);
        }

        Err(NavigationError::Timeout { url: url.to_string(), timeout })
    }

    fn scan(&self, keyword: &str, page: u32) -> Result<PageScan, NavigationError> {
        let document = self.navigator.page()?;
        let nodes = document.find_all(&selectors::RESULT);

        Ok(PageScan {
            nodes: nodes.len(),
            records: self.extractor.extract_all(nodes, keyword, page, self.events),
            has_next: document.contains(&selectors::NEXT_PAGE),
        })
    }

    async fn politeness_delay(&self) {
        if !self.settings.random_delay {
            return;
        }

        let (min, max) = (self.settings.delay_min_ms, self.settings.delay_max_ms);
        let ms = if min >= max { min } else { rand::rng().random_range(min..=max) };

        debug!("Waiting {}ms before next page", ms);
        sleep(Duration::from_millis(ms)).await;
    }
}

async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
