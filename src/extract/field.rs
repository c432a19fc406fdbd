//! Runs a field's fallback chain against one result node.

use super::strategy::{FieldSpec, Source, Strategy, StrategyOutcome};
use scraper::ElementRef;
use tracing::trace;

/// Extracts single field values, trying strategies in priority order.
pub struct FieldExtractor {
    base_url: String,
}

impl FieldExtractor {
    /// Creates an extractor resolving relative links against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Returns the first usable value of the chain, or `None` ("N/A").
    pub fn extract(&self, node: ElementRef, spec: &FieldSpec) -> Option<String> {
        for (index, strategy) in spec.strategies.iter().enumerate() {
            match self.run(node, strategy) {
                StrategyOutcome::Hit(value) => {
                    if index > 0 {
                        trace!(
                            "{}: fell back to strategy {} ({})",
                            spec.field,
                            index + 1,
                            strategy.label
                        );
                    }
                    return Some(value);
                }
                outcome => {
                    trace!("{}: strategy '{}' -> {:?}", spec.field, strategy.label, outcome);
                }
            }
        }

        trace!("{}: all {} strategies exhausted", spec.field, spec.strategies.len());
        None
    }

    /// Runs a single strategy.
    pub fn run(&self, node: ElementRef, strategy: &Strategy) -> StrategyOutcome {
        let target = match &strategy.query {
            Some(selector) => match node.select(selector).next() {
                Some(element) => element,
                None => return StrategyOutcome::Miss,
            },
            None => node,
        };

        let raw = match &strategy.source {
            Source::Text => target.text().collect::<String>(),
            Source::Attribute(name) => match target.value().attr(name) {
                Some(value) => value.to_string(),
                None => return StrategyOutcome::Miss,
            },
            Source::InnerHtml => target.inner_html(),
        };

        let captured = match &strategy.pattern {
            Some(re) => match re.captures(&raw) {
                Some(caps) => match caps.get(1).or_else(|| caps.get(0)) {
                    Some(m) => m.as_str().to_string(),
                    None => return StrategyOutcome::Empty,
                },
                None => return StrategyOutcome::Empty,
            },
            None => raw,
        };

        match strategy.normalize.apply(&captured, &self.base_url) {
            Some(value) => StrategyOutcome::Hit(value),
            None => StrategyOutcome::Empty,
        }
    }
}
