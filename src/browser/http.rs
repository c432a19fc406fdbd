//! HTTP navigator using wreq for TLS fingerprint emulation.

use super::{Navigator, Page};
use crate::config::Config;
use crate::error::NavigationError;
use crate::extract::selectors::page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Navigator that fetches pages over HTTP with browser impersonation.
///
/// Pages are served fully rendered by the time `load` returns, so waiting
/// for a selector is a single check of the fetched document.
pub struct HttpNavigator {
    client: Client,
    current: Option<LoadedPage>,
}

struct LoadedPage {
    url: String,
    html: String,
}

impl HttpNavigator {
    /// Creates a navigator from the configuration's proxy and timeout settings.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_millis(config.crawler.page_timeout_ms))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, current: None })
    }

    /// URL of the currently loaded page.
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|p| p.url.as_str())
    }

    async fn fetch(&self, url: &str) -> Result<String, NavigationError> {
        debug!("GET {}", url);

        let load_error = |reason: String| NavigationError::Load { url: url.to_string(), reason };

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503) on {}", url);
            return Err(NavigationError::Blocked("rate limited (503)".to_string()));
        }

        if !status.is_success() {
            return Err(load_error(format!("status {}", status)));
        }

        let body = response.text().await.map_err(|e| load_error(e.to_string()))?;
        check_for_errors(&body)?;

        Ok(body)
    }
}

/// Rejects CAPTCHA and error pages, which carry no results.
fn check_for_errors(html: &str) -> Result<(), NavigationError> {
    let document = Html::parse_document(html);

    if document.select(&page::CAPTCHA).next().is_some() {
        return Err(NavigationError::Blocked("CAPTCHA page".to_string()));
    }

    if document.select(&page::DOG_PAGE).next().is_some() {
        return Err(NavigationError::Blocked("storefront error page".to_string()));
    }

    Ok(())
}

#[async_trait]
impl Navigator for HttpNavigator {
    async fn load(&mut self, url: &str) -> Result<(), NavigationError> {
        self.current = None;
        let html = self.fetch(url).await?;
        self.current = Some(LoadedPage { url: url.to_string(), html });
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        query: &str,
        _timeout: Duration,
    ) -> Result<bool, NavigationError> {
        let selector = match Selector::parse(query) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("Cannot wait for invalid selector '{}': {}", query, e);
                return Ok(false);
            }
        };

        Ok(self
            .current
            .as_ref()
            .is_some_and(|p| Html::parse_document(&p.html).select(&selector).next().is_some()))
    }

    fn page(&self) -> Result<Page, NavigationError> {
        match &self.current {
            Some(loaded) => Ok(Page::parse(&loaded.html)),
            None => Err(NavigationError::Load {
                url: String::new(),
                reason: "no page loaded".to_string(),
            }),
        }
    }
}
