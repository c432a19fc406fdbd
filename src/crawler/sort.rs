//! Result ordering and search URL construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort order requested from the storefront.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
}

impl SortBy {
    /// Returns all sort orders.
    pub fn all() -> &'static [SortBy] {
        &[SortBy::Relevance, SortBy::PriceLow, SortBy::PriceHigh, SortBy::Rating, SortBy::Newest]
    }

    /// Query fragment appended to the search URL.
    pub fn query_fragment(&self) -> &'static str {
        match self {
            SortBy::Relevance => "",
            SortBy::PriceLow => "&s=price-asc-rank",
            SortBy::PriceHigh => "&s=price-desc-rank",
            SortBy::Rating => "&s=review-rank",
            SortBy::Newest => "&s=date-desc-rank",
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "price_low" => Ok(SortBy::PriceLow),
            "price_high" => Ok(SortBy::PriceHigh),
            "rating" => Ok(SortBy::Rating),
            "newest" => Ok(SortBy::Newest),
            _ => Err(format!(
                "Unknown sort: {}. Use: relevance, price_low, price_high, rating, newest",
                s
            )),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortBy::Relevance => "relevance",
            SortBy::PriceLow => "price_low",
            SortBy::PriceHigh => "price_high",
            SortBy::Rating => "rating",
            SortBy::Newest => "newest",
        };
        f.write_str(name)
    }
}

/// Builds the listing URL for `keyword` on `page` (1-based).
pub fn search_url(base_url: &str, keyword: &str, sort: SortBy, page: u32) -> String {
    let mut url = format!(
        "{}/s?k={}{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(keyword),
        sort.query_fragment()
    );

    if page > 1 {
        url.push_str(&format!("&page={}", page));
    }

    url
}
