//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::crawler::SortBy;
use crate::error::ConfigError;
use crate::extract::ExtractionConfig;
use crate::filters::FilterSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storefront base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Page sequencing, retries and delays
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Field extraction chains
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Default filters applied after crawling
    #[serde(default)]
    pub filters: FilterSpec,
}

fn default_base_url() -> String {
    "https://www.amazon.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy: None,
            format: OutputFormat::Table,
            crawler: CrawlerConfig::default(),
            extraction: ExtractionConfig::default(),
            filters: FilterSpec::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-harvest").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(base_url) = std::env::var("AMZ_HARVEST_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(proxy) = std::env::var("AMZ_HARVEST_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(pages) = std::env::var("AMZ_HARVEST_MAX_PAGES") {
            if let Ok(p) = pages.parse() {
                self.crawler.max_pages = p;
            }
        }

        if let Ok(delay) = std::env::var("AMZ_HARVEST_DELAY_MIN") {
            if let Ok(d) = delay.parse() {
                self.crawler.delay_min_ms = d;
            }
        }

        if let Ok(delay) = std::env::var("AMZ_HARVEST_DELAY_MAX") {
            if let Ok(d) = delay.parse() {
                self.crawler.delay_max_ms = d;
            }
        }

        self
    }
}

/// Crawl pacing and resilience settings (`[crawler]` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Upper bound on pages per keyword
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// How long to wait for the results container
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Load attempts per page before the crawl halts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base wait between attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub backoff: Backoff,

    /// Politeness delay lower bound
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Politeness delay upper bound
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Wait a random delay between pages
    #[serde(default = "default_random_delay")]
    pub random_delay: bool,

    #[serde(default)]
    pub sort: SortBy,
}

fn default_max_pages() -> u32 {
    5
}

fn default_page_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_delay_min_ms() -> u64 {
    2000
}

fn default_delay_max_ms() -> u64 {
    4000
}

fn default_random_delay() -> bool {
    true
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            page_timeout_ms: default_page_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            backoff: Backoff::Fixed,
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            random_delay: default_random_delay(),
            sort: SortBy::Relevance,
        }
    }
}

impl CrawlerConfig {
    /// Settings with every wait set to zero.
    pub fn immediate() -> Self {
        Self {
            retry_backoff_ms: 0,
            delay_min_ms: 0,
            delay_max_ms: 0,
            random_delay: false,
            ..Self::default()
        }
    }

    /// Rejects settings the crawler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.max_retries == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_retries",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.delay_min_ms > self.delay_max_ms {
            return Err(ConfigError::InvalidSetting {
                key: "delay_min_ms",
                reason: format!(
                    "{} is greater than delay_max_ms {}",
                    self.delay_min_ms, self.delay_max_ms
                ),
            });
        }

        Ok(())
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    /// Wait before retry number `attempt` (1-based) of a page.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let ms = match self.backoff {
            Backoff::Fixed => self.retry_backoff_ms,
            Backoff::Exponential => {
                let exponent = attempt.saturating_sub(1).min(16);
                self.retry_backoff_ms.saturating_mul(1u64 << exponent)
            }
        };
        Duration::from_millis(ms)
    }
}

/// Retry wait policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
