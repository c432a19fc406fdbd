//! Record filtering with composable, fail-open filters.
//!
//! Numeric filters let a record through when its value cannot be parsed;
//! substring filters let it through only when the field is missing.

pub mod contains;
pub mod price;
pub mod rating;
pub mod reviews;

use crate::error::ConfigError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use contains::ContainsFilter;
pub use price::PriceFilter;
pub use rating::RatingFilter;
pub use reviews::ReviewsFilter;

/// Trait for filtering records.
pub trait Filter: Send + Sync {
    /// Returns true if the record passes the filter.
    fn matches(&self, record: &Record) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// Declarative filter configuration. Absent keys impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub min_store_rating: Option<f64>,
    pub min_reviews: Option<u64>,
    pub name_contains: Option<String>,
    pub store_contains: Option<String>,
}

impl FilterSpec {
    /// Returns true if no key is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a spec with every key set in `other` taking precedence.
    pub fn overlay(&self, other: &FilterSpec) -> FilterSpec {
        FilterSpec {
            min_price: other.min_price.or(self.min_price),
            max_price: other.max_price.or(self.max_price),
            min_rating: other.min_rating.or(self.min_rating),
            min_store_rating: other.min_store_rating.or(self.min_store_rating),
            min_reviews: other.min_reviews.or(self.min_reviews),
            name_contains: other.name_contains.clone().or_else(|| self.name_contains.clone()),
            store_contains: other.store_contains.clone().or_else(|| self.store_contains.clone()),
        }
    }

    /// Rejects thresholds and substrings that can never be meaningful.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(invalid(key, format!("{} is not a valid price", v)));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(invalid(
                    "min_price",
                    format!("{} is greater than max_price {}", min, max),
                ));
            }
        }

        for (key, value) in
            [("min_rating", self.min_rating), ("min_store_rating", self.min_store_rating)]
        {
            if let Some(v) = value {
                if !(0.0..=5.0).contains(&v) {
                    return Err(invalid(key, format!("{} is outside 0-5", v)));
                }
            }
        }

        for (key, value) in [
            ("name_contains", self.name_contains.as_deref()),
            ("store_contains", self.store_contains.as_deref()),
        ] {
            if value.is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid(key, "must not be empty".to_string()));
            }
        }

        Ok(())
    }
}

fn invalid(key: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidFilter { key, reason }
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Builds the chain for every key set in `spec`.
    pub fn from_spec(spec: &FilterSpec) -> Self {
        FilterChainBuilder::new()
            .price_range(spec.min_price, spec.max_price)
            .min_rating(spec.min_rating)
            .min_store_rating(spec.min_store_rating)
            .min_reviews(spec.min_reviews)
            .name_contains(spec.name_contains.as_deref())
            .store_contains(spec.store_contains.as_deref())
            .build()
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a record passes all filters. Stops at the first failure.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Keeps the records that pass, in their original order.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from configuration.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Adds a price range filter.
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(PriceFilter::new(min, max));
        }
        self
    }

    /// Adds a minimum product rating filter.
    pub fn min_rating(mut self, min: Option<f64>) -> Self {
        if let Some(min) = min {
            self.chain.add(RatingFilter::product(min));
        }
        self
    }

    /// Adds a minimum store rating filter.
    pub fn min_store_rating(mut self, min: Option<f64>) -> Self {
        if let Some(min) = min {
            self.chain.add(RatingFilter::store(min));
        }
        self
    }

    /// Adds a minimum review count filter.
    pub fn min_reviews(mut self, min: Option<u64>) -> Self {
        if let Some(min) = min {
            self.chain.add(ReviewsFilter::new(min));
        }
        self
    }

    /// Adds a product name substring filter.
    pub fn name_contains(mut self, needle: Option<&str>) -> Self {
        if let Some(needle) = needle {
            self.chain.add(ContainsFilter::name(needle));
        }
        self
    }

    /// Adds a store name substring filter.
    pub fn store_contains(mut self, needle: Option<&str>) -> Self {
        if let Some(needle) = needle {
            self.chain.add(ContainsFilter::store(needle));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `record` satisfies every key of `spec`.
pub fn matches(record: &Record, spec: &FilterSpec) -> bool {
    FilterChain::from_spec(spec).matches(record)
}

/// Validates `spec` and keeps the matching records in order.
pub fn filter(records: Vec<Record>, spec: &FilterSpec) -> Result<Vec<Record>, ConfigError> {
    spec.validate()?;

    let chain = FilterChain::from_spec(spec);
    if chain.is_empty() {
        return Ok(records);
    }

    for description in chain.descriptions() {
        debug!("Filter: {}", description);
    }

    let before = records.len();
    let kept = chain.apply(records);
    debug!("Filters kept {} of {} records", kept.len(), before);

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;

    fn make_record(price: &str, rating: &str, reviews: &str, store: &str) -> Record {
        Record::default()
            .with(Field::Name, "Wireless Gaming Mouse")
            .with(Field::Url, "https://www.amazon.com/dp/TEST")
            .with(Field::Price, price)
            .with(Field::Rating, rating)
            .with(Field::ReviewCount, reviews)
            .with(Field::StoreName, store)
    }

    // FilterChain tests

    #[test]
    fn test_filter_chain_new() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_filter_chain() {
        let mut chain = FilterChain::new();
        chain.add(PriceFilter::new(Some(10.0), Some(50.0)));
        chain.add(RatingFilter::product(4.0));

        assert_eq!(chain.len(), 2);

        assert!(chain.matches(&make_record("$25.00", "4.5", "10", "Acme")));
        assert!(!chain.matches(&make_record("$5.00", "4.5", "10", "Acme")));
        assert!(!chain.matches(&make_record("$25.00", "3.5", "10", "Acme")));
    }

    #[test]
    fn test_filter_chain_apply_keeps_order() {
        let mut chain = FilterChain::new();
        chain.add(PriceFilter::new(Some(20.0), None));

        let records = vec![
            make_record("$30.00", "4.0", "1", "A"),
            make_record("$10.00", "4.0", "1", "B"),
            make_record("$50.00", "4.0", "1", "C"),
        ];

        let filtered = chain.apply(records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].display(Field::StoreName), "A");
        assert_eq!(filtered[1].display(Field::StoreName), "C");
    }

    #[test]
    fn test_filter_chain_descriptions() {
        let chain = FilterChain::from_spec(&FilterSpec {
            min_price: Some(10.0),
            min_store_rating: Some(4.0),
            store_contains: Some("anker".to_string()),
            ..Default::default()
        });

        let descriptions = chain.descriptions();
        assert_eq!(descriptions.len(), 3);
        assert!(descriptions[0].contains("Price"));
        assert!(descriptions[1].contains("Store rating"));
        assert!(descriptions[2].contains("anker"));
    }

    // FilterChainBuilder tests

    #[test]
    fn test_filter_chain_builder_no_filters_when_unset() {
        let chain = FilterChainBuilder::new()
            .price_range(None, None)
            .min_rating(None)
            .min_store_rating(None)
            .min_reviews(None)
            .name_contains(None)
            .store_contains(None)
            .build();

        assert!(chain.is_empty());
    }

    #[test]
    fn test_from_spec_builds_one_filter_per_key() {
        let spec = FilterSpec {
            min_price: Some(1.0),
            max_price: Some(2.0),
            min_rating: Some(3.0),
            min_store_rating: Some(3.0),
            min_reviews: Some(5),
            name_contains: Some("a".to_string()),
            store_contains: Some("b".to_string()),
        };

        // min/max price share one filter
        assert_eq!(FilterChain::from_spec(&spec).len(), 6);
    }

    // FilterSpec tests

    #[test]
    fn test_empty_spec_is_identity() {
        let records = vec![
            make_record("$1.00", "1.0", "0", "A"),
            make_record("N/A", "N/A", "N/A", "N/A"),
            Record::default(),
        ];

        let spec = FilterSpec::default();
        assert!(spec.is_empty());
        assert_eq!(filter(records.clone(), &spec).unwrap(), records);
    }

    #[test]
    fn test_unparsable_price_passes_price_filter() {
        let spec = FilterSpec { min_price: Some(10.0), ..Default::default() };
        let record = make_record("N/A", "4.0", "10", "A");
        assert!(matches(&record, &spec));

        let record = make_record("Currently unavailable", "4.0", "10", "A");
        assert!(matches(&record, &spec));
    }

    #[test]
    fn test_all_predicates_combined() {
        let spec = FilterSpec {
            min_price: Some(20.0),
            max_price: Some(100.0),
            min_rating: Some(4.0),
            min_reviews: Some(100),
            name_contains: Some("MOUSE".to_string()),
            store_contains: Some("logi".to_string()),
            ..Default::default()
        };

        assert!(matches(&make_record("$49.99", "4.6", "1,204", "Logitech"), &spec));
        assert!(!matches(&make_record("$49.99", "4.6", "99", "Logitech"), &spec));
        assert!(!matches(&make_record("$49.99", "4.6", "1,204", "Razer"), &spec));
        assert!(!matches(&make_record("$149.99", "4.6", "1,204", "Logitech"), &spec));
    }

    #[test]
    fn test_filter_rejects_invalid_spec() {
        let spec =
            FilterSpec { min_price: Some(50.0), max_price: Some(10.0), ..Default::default() };
        let err = filter(Vec::new(), &spec).unwrap_err();
        assert!(err.to_string().contains("min_price"));
    }

    #[test]
    fn test_validate() {
        assert!(FilterSpec::default().validate().is_ok());

        let cases = [
            FilterSpec { min_price: Some(-1.0), ..Default::default() },
            FilterSpec { max_price: Some(f64::NAN), ..Default::default() },
            FilterSpec { min_rating: Some(5.5), ..Default::default() },
            FilterSpec { min_store_rating: Some(-0.5), ..Default::default() },
            FilterSpec { name_contains: Some("  ".to_string()), ..Default::default() },
            FilterSpec { store_contains: Some(String::new()), ..Default::default() },
        ];

        for spec in cases {
            assert!(spec.validate().is_err(), "{:?} should be rejected", spec);
        }

        let ok = FilterSpec {
            min_price: Some(0.0),
            max_price: Some(0.0),
            min_rating: Some(5.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_overlay_prefers_other() {
        let base = FilterSpec {
            min_price: Some(10.0),
            name_contains: Some("mouse".to_string()),
            ..Default::default()
        };
        let cli = FilterSpec {
            min_price: Some(20.0),
            min_reviews: Some(5),
            ..Default::default()
        };

        let merged = base.overlay(&cli);
        assert_eq!(merged.min_price, Some(20.0));
        assert_eq!(merged.min_reviews, Some(5));
        assert_eq!(merged.name_contains.as_deref(), Some("mouse"));
    }

    #[test]
    fn test_spec_from_toml_ignores_missing_keys() {
        let spec: FilterSpec = toml::from_str("min_rating = 4.5").unwrap();
        assert_eq!(spec.min_rating, Some(4.5));
        assert!(spec.min_price.is_none());
        assert!(!spec.is_empty());
    }
}
