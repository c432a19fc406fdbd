//! Structured crawl diagnostics.

use super::Termination;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Something worth reporting during a crawl.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    PageLoaded { page: u32, url: String },
    PageRetry { page: u32, attempt: u32, max_retries: u32, error: String },
    PageFailed { page: u32, attempts: u32, error: String },
    PageExtracted { page: u32, nodes: usize, records: usize },
    /// A result node without name or URL. Carries no page content.
    NodeDropped { page: u32 },
    Finished { keyword: String, pages: u32, records: usize, termination: Termination },
}

/// Receives crawl events. Passed by reference into each crawl.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &CrawlEvent);
}

/// Forwards events to `tracing` at a severity matching the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::PageLoaded { page, url } => debug!("Loaded page {}: {}", page, url),
            CrawlEvent::PageRetry { page, attempt, max_retries, error } => {
                warn!("Page {} failed, retry {}/{}: {}", page, attempt, max_retries, error)
            }
            CrawlEvent::PageFailed { page, attempts, error } => {
                error!("Page {} failed after {} attempts, stopping: {}", page, attempts, error)
            }
            CrawlEvent::PageExtracted { page, nodes, records } => {
                info!("Page {}: {} records from {} result nodes", page, records, nodes)
            }
            CrawlEvent::NodeDropped { page } => {
                warn!("Dropped a result node without name or URL on page {}", page)
            }
            CrawlEvent::Finished { keyword, pages, records, termination } => info!(
                "Crawl for '{}' finished after {} pages with {} records ({})",
                keyword, pages, records, termination
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events seen so far.
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Counts events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events.lock().map(|e| e.iter().filter(|ev| predicate(ev)).count()).unwrap_or(0)
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &CrawlEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(&CrawlEvent::NodeDropped { page: 1 });
        sink.emit(&CrawlEvent::PageExtracted { page: 1, nodes: 3, records: 2 });
        sink.emit(&CrawlEvent::NodeDropped { page: 2 });

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], CrawlEvent::NodeDropped { page: 1 });
        assert_eq!(sink.count(|e| matches!(e, CrawlEvent::NodeDropped { .. })), 2);
    }

    #[test]
    fn test_tracing_sink_accepts_every_event() {
        let sink = TracingSink;
        sink.emit(&CrawlEvent::PageLoaded { page: 1, url: "u".into() });
        sink.emit(&CrawlEvent::PageRetry {
            page: 1,
            attempt: 1,
            max_retries: 3,
            error: "e".into(),
        });
        sink.emit(&CrawlEvent::PageFailed { page: 1, attempts: 3, error: "e".into() });
        sink.emit(&CrawlEvent::Finished {
            keyword: "k".into(),
            pages: 1,
            records: 0,
            termination: Termination::LastPage,
        });
    }
}
