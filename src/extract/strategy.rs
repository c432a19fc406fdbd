//! Extraction strategies and per-field fallback chains.

use super::normalize::Normalize;
use super::selectors;
use crate::error::ConfigError;
use crate::record::Field;
use regex_lite::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a strategy reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Text,
    Attribute(String),
    InnerHtml,
}

/// Declarative form of a strategy, as written in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// CSS query relative to the result node; omitted means the node itself.
    #[serde(default)]
    pub query: Option<String>,

    /// Read this attribute instead of the element text.
    #[serde(default)]
    pub attr: Option<String>,

    /// Read the element's inner HTML instead of its text.
    #[serde(default)]
    pub html: bool,

    /// Regex applied before normalization; capture group 1 wins if present.
    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub normalize: Normalize,
}

impl StrategyConfig {
    pub fn text(query: &str, normalize: Normalize) -> Self {
        Self {
            query: Some(query.to_string()),
            attr: None,
            html: false,
            pattern: None,
            normalize,
        }
    }

    pub fn attr(query: Option<&str>, attr: &str, normalize: Normalize) -> Self {
        Self {
            query: query.map(String::from),
            attr: Some(attr.to_string()),
            html: false,
            pattern: None,
            normalize,
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Compiles the query and pattern for `field`.
    pub fn compile(&self, field: Field) -> Result<Strategy, ConfigError> {
        let query = self
            .query
            .as_deref()
            .map(|q| {
                Selector::parse(q).map_err(|e| ConfigError::InvalidSelector {
                    field,
                    query: q.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let pattern = self
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    field,
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let source = match (&self.attr, self.html) {
            (Some(_), true) => {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: "a strategy reads either an attribute or inner html".to_string(),
                })
            }
            (Some(name), false) => Source::Attribute(name.clone()),
            (None, true) => Source::InnerHtml,
            (None, false) => Source::Text,
        };

        Ok(Strategy {
            label: self.label(),
            query,
            source,
            pattern,
            normalize: self.normalize,
        })
    }

    /// Short human-readable form, used in logs and `fields` output.
    pub fn label(&self) -> String {
        let mut label = self.query.clone().unwrap_or_else(|| "<node>".to_string());
        if let Some(attr) = &self.attr {
            label.push_str(&format!(" @{}", attr));
        } else if self.html {
            label.push_str(" @html");
        }
        if let Some(pattern) = &self.pattern {
            label.push_str(&format!(" ~/{}/", pattern));
        }
        if self.normalize != Normalize::Trim {
            label.push_str(&format!(" ({:?})", self.normalize).to_lowercase());
        }
        label
    }
}

/// A compiled strategy: one candidate query + normalization rule.
#[derive(Debug, Clone)]
pub struct Strategy {
    pub label: String,
    pub query: Option<Selector>,
    pub source: Source,
    pub pattern: Option<Regex>,
    pub normalize: Normalize,
}

/// Result of running one strategy against one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Usable, normalized value.
    Hit(String),
    /// Query or attribute absent.
    Miss,
    /// Matched, but nothing survived the pattern or normalization.
    Empty,
}

/// A field and its fallback chain, in priority order.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub strategies: Vec<Strategy>,
}

impl FieldSpec {
    pub fn compile(field: Field, configs: &[StrategyConfig]) -> Result<Self, ConfigError> {
        if configs.is_empty() {
            return Err(ConfigError::InvalidField {
                field,
                reason: "at least one strategy is required".to_string(),
            });
        }

        let strategies =
            configs.iter().map(|c| c.compile(field)).collect::<Result<Vec<_>, _>>()?;

        Ok(Self { field, strategies })
    }
}

/// Extraction settings from the `[extraction]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Fields that are never extracted (always "N/A").
    #[serde(default = "default_disabled_fields")]
    pub disabled_fields: Vec<Field>,

    /// Per-field strategy lists replacing the built-in chains.
    #[serde(default)]
    pub strategies: BTreeMap<Field, Vec<StrategyConfig>>,
}

fn default_disabled_fields() -> Vec<Field> {
    vec![Field::Availability, Field::Shipping]
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { disabled_fields: default_disabled_fields(), strategies: BTreeMap::new() }
    }
}

/// The compiled field specs for one crawl session.
#[derive(Debug, Clone)]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

impl FieldSpecs {
    /// Built-in chains for every extracted field.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_config(&ExtractionConfig { disabled_fields: Vec::new(), ..Default::default() })
    }

    /// Compiles the built-in chains, applying overrides and disabled fields.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        for field in &config.disabled_fields {
            if field.is_identifying() {
                return Err(ConfigError::InvalidField {
                    field: *field,
                    reason: "identifying fields cannot be disabled".to_string(),
                });
            }
        }

        if let Some(field) = config.strategies.keys().find(|f| !f.is_extracted()) {
            return Err(ConfigError::InvalidField {
                field: *field,
                reason: "this field is filled by the crawler, not extracted".to_string(),
            });
        }

        let mut specs = Vec::new();
        for field in Field::ALL.into_iter().filter(Field::is_extracted) {
            if config.disabled_fields.contains(&field) {
                continue;
            }

            let spec = match config.strategies.get(&field) {
                Some(custom) => FieldSpec::compile(field, custom)?,
                None => FieldSpec::compile(field, &selectors::default_strategies(field))?,
            };
            specs.push(spec);
        }

        Ok(Self { specs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    pub fn get(&self, field: Field) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.field == field)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile_for_every_extracted_field() {
        let specs = FieldSpecs::defaults().unwrap();
        assert_eq!(specs.len(), 12);
        assert!(specs.get(Field::SearchKeyword).is_none());
        for spec in specs.iter() {
            assert!(!spec.strategies.is_empty(), "{} has no strategies", spec.field);
        }
    }

    #[test]
    fn test_default_config_disables_availability_and_shipping() {
        let specs = FieldSpecs::from_config(&ExtractionConfig::default()).unwrap();
        assert_eq!(specs.len(), 10);
        assert!(specs.get(Field::Availability).is_none());
        assert!(specs.get(Field::Shipping).is_none());
        assert!(specs.get(Field::Price).is_some());
    }

    #[test]
    fn test_override_replaces_chain() {
        let mut config = ExtractionConfig::default();
        config
            .strategies
            .insert(Field::Price, vec![StrategyConfig::text(".my-price", Normalize::Price)]);

        let specs = FieldSpecs::from_config(&config).unwrap();
        let price = specs.get(Field::Price).unwrap();
        assert_eq!(price.strategies.len(), 1);
        assert_eq!(price.strategies[0].normalize, Normalize::Price);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let mut config = ExtractionConfig::default();
        config.strategies.insert(Field::Rating, vec![StrategyConfig::text("[[[", Normalize::Trim)]);

        let err = FieldSpecs::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { field: Field::Rating, .. }));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let mut config = ExtractionConfig::default();
        config.strategies.insert(
            Field::Rating,
            vec![StrategyConfig::text("span", Normalize::Trim).with_pattern("(unclosed")],
        );

        let err = FieldSpecs::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_identifying_fields_cannot_be_disabled() {
        let config =
            ExtractionConfig { disabled_fields: vec![Field::Url], ..Default::default() };
        assert!(FieldSpecs::from_config(&config).is_err());
    }

    #[test]
    fn test_search_keyword_cannot_be_configured() {
        let mut config = ExtractionConfig::default();
        config
            .strategies
            .insert(Field::SearchKeyword, vec![StrategyConfig::text("h1", Normalize::Trim)]);
        assert!(FieldSpecs::from_config(&config).is_err());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let mut config = ExtractionConfig::default();
        config.strategies.insert(Field::Promotion, Vec::new());
        assert!(FieldSpecs::from_config(&config).is_err());
    }

    #[test]
    fn test_attr_and_html_conflict() {
        let mut config = StrategyConfig::attr(Some("img"), "src", Normalize::Url);
        config.html = true;
        assert!(config.compile(Field::ImageUrl).is_err());
    }

    #[test]
    fn test_label() {
        let config = StrategyConfig::attr(Some("h2 a"), "href", Normalize::Url);
        assert_eq!(config.label(), "h2 a @href (url)");

        let config = StrategyConfig::attr(None, "data-asin", Normalize::Trim);
        assert_eq!(config.label(), "<node> @data-asin");
    }

    #[test]
    fn test_config_from_toml() {
        let config: ExtractionConfig = toml::from_str(
            r#"
            disabled_fields = ["promotion"]

            [[strategies.price]]
            query = ".price-now"
            pattern = '(\d+\.\d+)'
            normalize = "price"

            [[strategies.price]]
            query = "[data-price]"
            attr = "data-price"
            "#,
        )
        .unwrap();

        assert_eq!(config.disabled_fields, vec![Field::Promotion]);
        let price = &config.strategies[&Field::Price];
        assert_eq!(price.len(), 2);
        assert_eq!(price[0].normalize, Normalize::Price);
        assert_eq!(price[1].attr.as_deref(), Some("data-price"));
        assert_eq!(price[1].normalize, Normalize::Trim);
    }
}
