//! amz-harvest - Resilient Amazon search-listing harvester
//!
//! Crawls paginated search results with fallback extraction, then filters
//! and summarizes the records.

use amz_harvest::commands::{CrawlCommand, CrawlOptions, FieldsCommand};
use amz_harvest::config::{Config, OutputFormat};
use amz_harvest::crawler::SortBy;
use amz_harvest::filters::FilterSpec;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-harvest",
    version,
    about = "Resilient Amazon search-listing harvester",
    long_about = "Crawls Amazon search listings page by page, extracts product records with \
                  per-field fallback selectors, filters them and reports summary statistics."
)]
struct Cli {
    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_HARVEST_PROXY")]
    proxy: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json, markdown, csv)
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search results for one or more keywords
    #[command(alias = "c")]
    Crawl {
        /// Search keywords, crawled one after another
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Maximum pages per keyword
        #[arg(short, long)]
        pages: Option<u32>,

        /// Sort order (relevance, price_low, price_high, rating, newest)
        #[arg(short, long)]
        sort: Option<SortBy>,

        /// Minimum price filter
        #[arg(long)]
        min_price: Option<f64>,

        /// Maximum price filter
        #[arg(long)]
        max_price: Option<f64>,

        /// Minimum product rating (0.0-5.0)
        #[arg(long)]
        min_rating: Option<f64>,

        /// Minimum store rating (0.0-5.0)
        #[arg(long)]
        min_store_rating: Option<f64>,

        /// Minimum number of reviews
        #[arg(long)]
        min_reviews: Option<u64>,

        /// Product name must contain this text (case-insensitive)
        #[arg(long)]
        name_contains: Option<String>,

        /// Store name must contain this text (case-insensitive)
        #[arg(long)]
        store_contains: Option<String>,

        /// Print statistics after the records
        #[arg(long)]
        stats: bool,

        /// Export records and statistics (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List record fields and their fallback selectors
    Fields,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Crawl {
            keywords,
            pages,
            sort,
            min_price,
            max_price,
            min_rating,
            min_store_rating,
            min_reviews,
            name_contains,
            store_contains,
            stats,
            output,
        } => {
            let options = CrawlOptions {
                keywords,
                max_pages: pages,
                sort,
                filters: FilterSpec {
                    min_price,
                    max_price,
                    min_rating,
                    min_store_rating,
                    min_reviews,
                    name_contains,
                    store_contains,
                },
                stats,
                output,
            };

            let cmd = CrawlCommand::new(config);
            let output = cmd.execute(&options).await?;
            println!("{}", output);
        }

        Commands::Fields => {
            let cmd = FieldsCommand::new(config);
            println!("{}", cmd.execute()?);
        }
    }

    Ok(())
}
