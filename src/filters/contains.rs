//! Case-insensitive substring filters.

use super::Filter;
use crate::record::{Field, Record};

/// Requires a field to contain a substring, ignoring case.
///
/// Records where the field is missing pass.
pub struct ContainsFilter {
    field: Field,
    needle: String,
}

impl ContainsFilter {
    /// Matches against the product name.
    pub fn name(needle: &str) -> Self {
        Self::new(Field::Name, needle)
    }

    /// Matches against the store name.
    pub fn store(needle: &str) -> Self {
        Self::new(Field::StoreName, needle)
    }

    fn new(field: Field, needle: &str) -> Self {
        Self { field, needle: needle.to_lowercase() }
    }
}

impl Filter for ContainsFilter {
    fn matches(&self, record: &Record) -> bool {
        match record.get(self.field) {
            Some(value) => value.to_lowercase().contains(&self.needle),
            None => true,
        }
    }

    fn description(&self) -> String {
        format!("{} contains: {}", self.field, self.needle)
    }
}
