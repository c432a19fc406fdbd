//! CSS selectors and built-in fallback chains for Amazon search pages.
//!
//! Chains are ordered by reliability: the current markup first, older
//! layouts after it. When the storefront changes, add the new query at the
//! front of the chain and keep the old ones as fallbacks.

use super::normalize::Normalize;
use super::strategy::StrategyConfig;
use crate::record::Field;
use scraper::Selector;
use std::sync::LazyLock;

/// Page-level selectors used by the crawler.
pub mod page {
    use super::*;

    /// CSS form of [`RESULT`], used for readiness waits.
    pub const RESULT_QUERY: &str = "[data-component-type='s-search-result']";

    /// Product card container - one per result node.
    pub static RESULT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(RESULT_QUERY).unwrap());

    /// Enabled "next page" control.
    pub static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.s-pagination-next:not(.s-pagination-disabled):not([aria-disabled='true']), \
             .s-pagination-item.s-pagination-next:not(.s-pagination-disabled)",
        )
        .unwrap()
    });

    /// "No results" message shown instead of result cards.
    pub static NO_RESULTS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".s-no-search-results, \
             .s-no-results-filler",
        )
        .unwrap()
    });

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's error page).
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[alt*='dog'], \
             .a-box-inner a[href='/ref=cs_503_link']",
        )
        .unwrap()
    });
}

/// Returns the built-in fallback chain for `field`.
///
/// `search_keyword` is filled by the crawler and has no chain.
pub fn default_strategies(field: Field) -> Vec<StrategyConfig> {
    use Normalize::*;

    match field {
        Field::Name => vec![
            StrategyConfig::text("[data-cy='title-recipe'] h2 span", Trim),
            StrategyConfig::text("h2 a span", Trim),
            StrategyConfig::text("h2 span.a-text-normal", Trim),
            StrategyConfig::text(".a-size-medium.a-text-normal", Trim),
            StrategyConfig::text(".a-size-base-plus.a-text-normal", Trim),
            StrategyConfig::attr(Some("h2"), "aria-label", Trim),
        ],
        Field::Url => vec![
            StrategyConfig::attr(Some("[data-cy='title-recipe'] a.a-link-normal"), "href", Url),
            StrategyConfig::attr(Some("h2 a"), "href", Url),
            StrategyConfig::attr(Some("a.a-link-normal.s-underline-text"), "href", Url),
            StrategyConfig::attr(Some("a.a-link-normal.s-no-outline"), "href", Url),
        ],
        Field::Price => vec![
            StrategyConfig::text(".a-price:not([data-a-strike]) .a-offscreen", Trim),
            StrategyConfig::text(".a-price .a-offscreen", Trim),
            StrategyConfig::text(".a-price-whole", Price),
        ],
        Field::Rating => vec![
            StrategyConfig::text("i.a-icon-star-small span.a-icon-alt", Number),
            StrategyConfig::text("i.a-icon-star span.a-icon-alt", Number),
            StrategyConfig::attr(Some("[aria-label*='out of 5 stars']"), "aria-label", Number),
            StrategyConfig::text("span.a-icon-alt", Number),
        ],
        Field::ReviewCount => vec![
            StrategyConfig::text("span.a-size-base.s-underline-text", Integer),
            StrategyConfig::text("a[href*='customerReviews'] span", Integer),
            StrategyConfig::attr(Some("span[aria-label*='stars'] + span"), "aria-label", Integer),
        ],
        Field::StoreName => vec![
            StrategyConfig::text("h5.s-line-clamp-1 span", Trim),
            StrategyConfig::text(".a-row.a-size-base.a-color-secondary span", Trim)
                .with_pattern(r"^\s*[Bb]y\s+(.+)$"),
        ],
        Field::StoreRating => vec![
            StrategyConfig::text("[data-cy='seller-rating'] span.a-icon-alt", Number),
            StrategyConfig::attr(Some("[data-cy='seller-rating']"), "aria-label", Number),
        ],
        Field::Availability => vec![
            StrategyConfig::text("[data-cy='availability-recipe'] span", Trim),
            StrategyConfig::text(".a-color-success", Trim),
        ],
        Field::Shipping => vec![
            StrategyConfig::text(
                "[data-cy='delivery-recipe'] .a-row.a-size-base.a-color-secondary",
                Trim,
            ),
            StrategyConfig::text("[data-cy='delivery-recipe'] span.a-text-bold", Trim),
            StrategyConfig::text(".a-color-secondary", Trim),
        ],
        Field::Asin => vec![StrategyConfig::attr(None, "data-asin", Trim)],
        Field::ImageUrl => vec![
            StrategyConfig::attr(Some("img.s-image"), "src", Url),
            StrategyConfig::attr(Some(".s-product-image-container img"), "src", Url),
            StrategyConfig::attr(Some("img.s-image"), "data-src", Url),
        ],
        Field::Promotion => vec![
            StrategyConfig::text(".a-price.a-text-price .a-offscreen", Trim),
            StrategyConfig::text(".a-price[data-a-strike] .a-offscreen", Trim),
            StrategyConfig::text(".s-coupon-highlight-color", Trim),
        ],
        Field::SearchKeyword => Vec::new(),
    }
}
