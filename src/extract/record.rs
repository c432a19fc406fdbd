//! Builds one [`Record`] per result node.

use super::field::FieldExtractor;
use super::strategy::FieldSpecs;
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::record::{Field, Record};
use scraper::ElementRef;
use tracing::trace;

/// Composes field extractors into whole records.
pub struct RecordExtractor<'a> {
    fields: &'a FieldSpecs,
    extractor: FieldExtractor,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(fields: &'a FieldSpecs, base_url: &str) -> Self {
        Self { fields, extractor: FieldExtractor::new(base_url) }
    }

    /// Extracts a record, or `None` when the node has no name or no URL.
    pub fn extract(&self, node: ElementRef, keyword: &str) -> Option<Record> {
        let mut record = Record::default();

        for spec in self.fields.iter() {
            let value = self.extractor.extract(node, spec);
            if value.is_none() && spec.field.is_identifying() {
                trace!("Result node has no {}, dropping", spec.field);
                return None;
            }
            record.set(spec.field, value);
        }

        // A spec set without the identifying chains cannot locate anything.
        if record.get(Field::Name).is_none() || record.get(Field::Url).is_none() {
            return None;
        }

        record.set(Field::SearchKeyword, Some(keyword.to_string()));
        Some(record)
    }

    /// Extracts every node of one page, reporting each dropped node.
    pub fn extract_all<'n>(
        &self,
        nodes: impl IntoIterator<Item = ElementRef<'n>>,
        keyword: &str,
        page: u32,
        events: &dyn EventSink,
    ) -> Vec<Record> {
        let mut records = Vec::new();

        for node in nodes {
            match self.extract(node, keyword) {
                Some(record) => records.push(record),
                None => events.emit(&CrawlEvent::NodeDropped { page }),
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::events::MemorySink;
    use crate::extract::selectors::page;
    use scraper::Html;

    const BASE: &str = "https://www.amazon.com";

    const PAGE: &str = r#"
        <html><body>
            <div data-component-type="s-search-result" data-asin="B001">
                <div data-cy="title-recipe">
                    <a class="a-link-normal" href="/Gaming-Mouse/dp/B001"><h2><span>Gaming Mouse</span></h2></a>
                </div>
                <span class="a-price"><span class="a-offscreen">$29.99</span></span>
                <i class="a-icon-star-small"><span class="a-icon-alt">4.6 out of 5 stars</span></i>
                <span class="a-size-base s-underline-text">1,024</span>
                <img class="s-image" src="https://m.media-amazon.com/images/I/b001.jpg">
            </div>
            <div data-component-type="s-search-result" data-asin="B002">
                <h2><a href="/dp/B002"><span>Plain Keyboard</span></a></h2>
            </div>
            <div data-component-type="s-search-result" data-asin="">
                <span class="a-price"><span class="a-offscreen">$5.00</span></span>
            </div>
        </body></html>
    "#;

    #[test]
    fn test_extract_full_record() {
        let doc = Html::parse_document(PAGE);
        let specs = FieldSpecs::defaults().unwrap();
        let extractor = RecordExtractor::new(&specs, BASE);

        let node = doc.select(&page::RESULT).next().unwrap();
        let record = extractor.extract(node, "mouse").unwrap();

        assert_eq!(record.display(Field::Name), "Gaming Mouse");
        assert_eq!(record.display(Field::Url), "https://www.amazon.com/Gaming-Mouse/dp/B001");
        assert_eq!(record.display(Field::Price), "$29.99");
        assert_eq!(record.display(Field::Rating), "4.6");
        assert_eq!(record.display(Field::ReviewCount), "1024");
        assert_eq!(record.display(Field::Asin), "B001");
        assert_eq!(
            record.display(Field::ImageUrl),
            "https://m.media-amazon.com/images/I/b001.jpg"
        );
        assert_eq!(record.display(Field::StoreName), "N/A");
        assert_eq!(record.display(Field::SearchKeyword), "mouse");
    }

    #[test]
    fn test_missing_optional_fields_degrade_to_na() {
        let doc = Html::parse_document(PAGE);
        let specs = FieldSpecs::defaults().unwrap();
        let extractor = RecordExtractor::new(&specs, BASE);

        let node = doc.select(&page::RESULT).nth(1).unwrap();
        let record = extractor.extract(node, "keyboard").unwrap();

        assert_eq!(record.display(Field::Name), "Plain Keyboard");
        assert_eq!(record.display(Field::Url), "https://www.amazon.com/dp/B002");
        for field in [Field::Price, Field::Rating, Field::ReviewCount, Field::Promotion] {
            assert_eq!(record.display(field), "N/A", "{} should be N/A", field);
        }
    }

    #[test]
    fn test_node_without_identity_is_dropped() {
        let doc = Html::parse_document(PAGE);
        let specs = FieldSpecs::defaults().unwrap();
        let extractor = RecordExtractor::new(&specs, BASE);

        let node = doc.select(&page::RESULT).nth(2).unwrap();
        assert!(extractor.extract(node, "x").is_none());
    }

    #[test]
    fn test_extract_all_reports_dropped_nodes() {
        let doc = Html::parse_document(PAGE);
        let specs = FieldSpecs::defaults().unwrap();
        let extractor = RecordExtractor::new(&specs, BASE);
        let sink = MemorySink::new();

        let records = extractor.extract_all(doc.select(&page::RESULT), "mouse", 3, &sink);

        assert_eq!(records.len(), 2);
        assert_eq!(sink.events(), vec![CrawlEvent::NodeDropped { page: 3 }]);
    }

    #[test]
    fn test_disabled_fields_stay_missing() {
        let doc = Html::parse_document(PAGE);
        let config = crate::extract::ExtractionConfig {
            disabled_fields: vec![Field::Price, Field::Rating],
            ..Default::default()
        };
        let specs = FieldSpecs::from_config(&config).unwrap();
        let extractor = RecordExtractor::new(&specs, BASE);

        let node = doc.select(&page::RESULT).next().unwrap();
        let record = extractor.extract(node, "mouse").unwrap();

        assert_eq!(record.get(Field::Price), None);
        assert_eq!(record.get(Field::Rating), None);
        assert_eq!(record.display(Field::ReviewCount), "1024");
    }
}
