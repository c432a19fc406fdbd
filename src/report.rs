//! Summary statistics over crawled records.

use crate::extract::normalize::{parse_number, parse_price};
use crate::record::{Field, Record, NOT_FOUND};
use serde::Serialize;
use std::collections::HashMap;

/// Number of stores listed in [`StatsTable::top_stores`].
pub const TOP_STORES: usize = 5;

/// Column names of [`StatsTable::rows`].
pub const STATS_HEADER: [&str; 7] = ["metric", "min", "max", "mean", "store", "count", "share"];

/// Min, max and mean over the values that could be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl NumericSummary {
    /// Summarizes `values`, or `None` if there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Some(Self { count: values.len(), min, max, mean })
    }
}

/// How many records one store contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreShare {
    pub name: String,
    pub count: usize,
    /// Share of all records, 0-100.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsTable {
    pub total: usize,
    pub price: Option<NumericSummary>,
    pub rating: Option<NumericSummary>,
    pub top_stores: Vec<StoreShare>,
}

impl StatsTable {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.rating.is_none() && self.top_stores.is_empty()
    }

    /// Flattens the table into string rows under [`STATS_HEADER`].
    pub fn rows(&self) -> Vec<[String; 7]> {
        let mut rows = Vec::new();

        if let Some(price) = &self.price {
            rows.push(summary_row("price", price, |v| format!("${:.2}", v)));
        }

        if let Some(rating) = &self.rating {
            rows.push(summary_row("rating", rating, |v| format!("{:.1}", v)));
        }

        for store in &self.top_stores {
            rows.push([
                "top_store".to_string(),
                String::new(),
                String::new(),
                String::new(),
                store.name.clone(),
                store.count.to_string(),
                format!("{:.1}%", store.percent),
            ]);
        }

        rows
    }
}

fn summary_row(metric: &str, summary: &NumericSummary, fmt: impl Fn(f64) -> String) -> [String; 7] {
    [
        metric.to_string(),
        fmt(summary.min),
        fmt(summary.max),
        fmt(summary.mean),
        String::new(),
        String::new(),
        String::new(),
    ]
}

/// Computes price and rating summaries and the most common stores.
///
/// Values that cannot be parsed are left out of their own statistic only.
/// Records without a store name are counted under `"N/A"`.
pub fn summarize(records: &[Record]) -> StatsTable {
    if records.is_empty() {
        return StatsTable::default();
    }

    let prices: Vec<f64> =
        records.iter().filter_map(|r| r.get(Field::Price).and_then(parse_price)).collect();

    let ratings: Vec<f64> =
        records.iter().filter_map(|r| r.get(Field::Rating).and_then(parse_number)).collect();

    StatsTable {
        total: records.len(),
        price: NumericSummary::from_values(&prices),
        rating: NumericSummary::from_values(&ratings),
        top_stores: top_stores(records, TOP_STORES),
    }
}

fn top_stores(records: &[Record], limit: usize) -> Vec<StoreShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.get(Field::StoreName).unwrap_or(NOT_FOUND)).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = records.len() as f64;
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, count)| StoreShare {
            name: name.to_string(),
            count,
            percent: count as f64 / total * 100.0,
        })
        .collect()
}
