//! Crawl command implementation.

use crate::browser::{HttpNavigator, Navigator};
use crate::config::Config;
use crate::crawler::{EventSink, PageCrawler, SortBy, TracingSink};
use crate::extract::FieldSpecs;
use crate::filters::{self, FilterSpec};
use crate::format::{self, Formatter};
use crate::record::Record;
use crate::report::{self, StatsTable};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Per-run options from the command line.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub keywords: Vec<String>,
    /// Overrides `crawler.max_pages`
    pub max_pages: Option<u32>,
    /// Overrides `crawler.sort`
    pub sort: Option<SortBy>,
    /// Layered over the `[filters]` section
    pub filters: FilterSpec,
    /// Print statistics after the records
    pub stats: bool,
    /// Export records and statistics to this file
    pub output: Option<PathBuf>,
}

/// Records and statistics gathered by one run.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    pub records: Vec<Record>,
    pub stats: StatsTable,
    /// Keywords whose crawl stopped on a failing page
    pub partial: Vec<String>,
}

/// Crawls one or more keywords, then filters and summarizes the records.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the crawl and returns formatted output.
    pub async fn execute(&self, options: &CrawlOptions) -> Result<String> {
        let mut navigator =
            HttpNavigator::new(&self.config).context("Failed to create HTTP navigator")?;

        let result = self.run(&mut navigator, options, &TracingSink).await?;
        self.finish(&result, options)
    }

    /// Executes the crawl over a provided navigator (for testing).
    pub async fn execute_with_navigator<N: Navigator>(
        &self,
        navigator: &mut N,
        options: &CrawlOptions,
        events: &dyn EventSink,
    ) -> Result<String> {
        let result = self.run(navigator, options, events).await?;
        self.finish(&result, options)
    }

    /// Crawls every keyword in turn over one navigator.
    pub async fn run<N: Navigator>(
        &self,
        navigator: &mut N,
        options: &CrawlOptions,
        events: &dyn EventSink,
    ) -> Result<CrawlResult> {
        if options.keywords.is_empty() {
            bail!("No keywords given");
        }

        let fields = FieldSpecs::from_config(&self.config.extraction)
            .context("Invalid extraction configuration")?;

        let spec = self.config.filters.overlay(&options.filters);
        spec.validate().context("Invalid filters")?;

        let max_pages = options.max_pages.unwrap_or(self.config.crawler.max_pages);
        let sort = options.sort.unwrap_or(self.config.crawler.sort);

        let mut records = Vec::new();
        let mut partial = Vec::new();

        for keyword in &options.keywords {
            info!("Crawling: {}", keyword);

            let mut crawler = PageCrawler::new(
                &mut *navigator,
                &self.config.crawler,
                &self.config.base_url,
                &fields,
                events,
            )
            .context("Invalid crawler configuration")?;

            let outcome = crawler
                .crawl(keyword, max_pages, sort)
                .await
                .with_context(|| format!("Crawl for '{}' failed", keyword))?;

            if outcome.is_partial() {
                warn!(
                    "Crawl for '{}' stopped early ({}), keeping {} records",
                    keyword,
                    outcome.termination,
                    outcome.records.len()
                );
                partial.push(outcome.keyword.clone());
            }

            records.extend(outcome.records);
        }

        let before = records.len();
        let records = filters::filter(records, &spec)?;
        debug!("{} of {} records passed filters", records.len(), before);

        let stats = report::summarize(&records);

        Ok(CrawlResult { records, stats, partial })
    }

    fn finish(&self, result: &CrawlResult, options: &CrawlOptions) -> Result<String> {
        if let Some(path) = &options.output {
            let written = format::export(path, &result.records, &result.stats)?;
            for file in written {
                info!("Wrote {}", file.display());
            }
        }

        let formatter = Formatter::new(self.config.format);
        if options.stats {
            Ok(formatter.format_report(&result.records, &result.stats))
        } else {
            Ok(formatter.format_records(&result.records))
        }
    }
}
