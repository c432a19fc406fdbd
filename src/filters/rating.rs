//! Minimum rating filters for products and stores.

use super::Filter;
use crate::extract::normalize::parse_number;
use crate::record::{Field, Record};

/// Filters records by a minimum star rating.
pub struct RatingFilter {
    field: Field,
    min: f64,
}

impl RatingFilter {
    /// Minimum product rating.
    pub fn product(min: f64) -> Self {
        Self { field: Field::Rating, min }
    }

    /// Minimum store (seller) rating.
    pub fn store(min: f64) -> Self {
        Self { field: Field::StoreRating, min }
    }
}

impl Filter for RatingFilter {
    fn matches(&self, record: &Record) -> bool {
        match record.get(self.field).and_then(parse_number) {
            Some(rating) => rating >= self.min,
            None => true,
        }
    }

    fn description(&self) -> String {
        let label = match self.field {
            Field::StoreRating => "Store rating",
            _ => "Rating",
        };
        format!("{}: >= {:.1} stars", label, self.min)
    }
}
