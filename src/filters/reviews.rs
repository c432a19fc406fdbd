//! Minimum review count filter.

use super::Filter;
use crate::extract::normalize::parse_count;
use crate::record::{Field, Record};

pub struct ReviewsFilter {
    min: u64,
}

impl ReviewsFilter {
    pub fn new(min: u64) -> Self {
        Self { min }
    }
}

impl Filter for ReviewsFilter {
    fn matches(&self, record: &Record) -> bool {
        match record.get(Field::ReviewCount).and_then(parse_count) {
            Some(count) => count >= self.min,
            None => true,
        }
    }

    fn description(&self) -> String {
        format!("Reviews: >= {}", self.min)
    }
}
