//! Fixed-schema product records extracted from search listings.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Marker written for every value that could not be found or parsed.
pub const NOT_FOUND: &str = "N/A";

/// The stable field vocabulary of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Url,
    Price,
    Rating,
    ReviewCount,
    StoreName,
    StoreRating,
    Availability,
    Shipping,
    Asin,
    ImageUrl,
    Promotion,
    SearchKeyword,
}

impl Field {
    /// Every field, in export column order.
    pub const ALL: [Field; 13] = [
        Field::Name,
        Field::Url,
        Field::Price,
        Field::Rating,
        Field::ReviewCount,
        Field::StoreName,
        Field::StoreRating,
        Field::Availability,
        Field::Shipping,
        Field::Asin,
        Field::ImageUrl,
        Field::Promotion,
        Field::SearchKeyword,
    ];

    /// Returns the column key used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Url => "url",
            Field::Price => "price",
            Field::Rating => "rating",
            Field::ReviewCount => "review_count",
            Field::StoreName => "store_name",
            Field::StoreRating => "store_rating",
            Field::Availability => "availability",
            Field::Shipping => "shipping",
            Field::Asin => "asin",
            Field::ImageUrl => "image_url",
            Field::Promotion => "promotion",
            Field::SearchKeyword => "search_keyword",
        }
    }

    /// Fields that identify a listing; a node missing any of them is dropped.
    pub fn is_identifying(&self) -> bool {
        matches!(self, Field::Name | Field::Url)
    }

    /// Fields filled by the crawler rather than read from the page.
    pub fn is_extracted(&self) -> bool {
        !matches!(self, Field::SearchKeyword)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// One product listing. Every field is always present; `None` means "N/A".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub name: Option<String>,
    pub url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
    pub store_name: Option<String>,
    pub store_rating: Option<String>,
    pub availability: Option<String>,
    pub shipping: Option<String>,
    pub asin: Option<String>,
    pub image_url: Option<String>,
    pub promotion: Option<String>,
    pub search_keyword: Option<String>,
}

impl Record {
    /// Returns the value of a field, if it was found.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Returns the value of a field, or `"N/A"`.
    pub fn display(&self, field: Field) -> &str {
        self.get(field).unwrap_or(NOT_FOUND)
    }

    /// Sets a field. Empty strings and the literal marker are stored as missing.
    pub fn set(&mut self, field: Field, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.is_empty() && v != NOT_FOUND);
    }

    /// Builder-style variant of [`Record::set`].
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Returns `(key, value)` pairs for every field, in column order.
    pub fn to_row(&self) -> Vec<(&'static str, &str)> {
        Field::ALL.iter().map(|f| (f.as_str(), self.display(*f))).collect()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Name => &self.name,
            Field::Url => &self.url,
            Field::Price => &self.price,
            Field::Rating => &self.rating,
            Field::ReviewCount => &self.review_count,
            Field::StoreName => &self.store_name,
            Field::StoreRating => &self.store_rating,
            Field::Availability => &self.availability,
            Field::Shipping => &self.shipping,
            Field::Asin => &self.asin,
            Field::ImageUrl => &self.image_url,
            Field::Promotion => &self.promotion,
            Field::SearchKeyword => &self.search_keyword,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Url => &mut self.url,
            Field::Price => &mut self.price,
            Field::Rating => &mut self.rating,
            Field::ReviewCount => &mut self.review_count,
            Field::StoreName => &mut self.store_name,
            Field::StoreRating => &mut self.store_rating,
            Field::Availability => &mut self.availability,
            Field::Shipping => &mut self.shipping,
            Field::Asin => &mut self.asin,
            Field::ImageUrl => &mut self.image_url,
            Field::Promotion => &mut self.promotion,
            Field::SearchKeyword => &mut self.search_keyword,
        }
    }
}

// Flat string map with the "N/A" marker, matching the spreadsheet export.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::ALL.len()))?;
        for field in Field::ALL {
            map.serialize_entry(field.as_str(), self.display(field))?;
        }
        map.end()
    }
}
