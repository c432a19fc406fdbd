//! Text normalization rules applied to extracted values.
//!
//! The parsing helpers here are shared with filtering and reporting, so a
//! value that survives extraction is read back the same way everywhere.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());

static COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,.]*)(?:\s?([KkMm])\b)?").unwrap());

/// Post-processing applied to a raw strategy value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalize {
    /// Collapse whitespace and trim.
    #[default]
    Trim,
    /// First decimal number ("4.5 out of 5 stars" -> "4.5").
    Number,
    /// First count without separators ("1,234 ratings" -> "1234", "1.2K" -> "1200").
    Integer,
    /// Currency symbols and thousands separators stripped ("$1,234.5" -> "1234.50").
    Price,
    /// Relative links joined to the storefront base URL.
    Url,
}

impl Normalize {
    /// Applies the rule. `None` means the value normalized to nothing.
    pub fn apply(&self, raw: &str, base_url: &str) -> Option<String> {
        let value = match self {
            Normalize::Trim => collapse_whitespace(raw),
            Normalize::Number => first_number(raw)?,
            Normalize::Integer => parse_count(raw)?.to_string(),
            Normalize::Price => format!("{:.2}", parse_price(raw)?),
            Normalize::Url => absolutize(raw.trim(), base_url)?,
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_number(text: &str) -> Option<String> {
    NUMBER.find(text).map(|m| m.as_str().replace(',', "."))
}

/// Parses the first decimal number in `text` ("4,5 von 5" -> 4.5).
pub fn parse_number(text: &str) -> Option<f64> {
    first_number(text)?.parse().ok()
}

/// Parses a count such as "1,234 ratings", "1.234 Bewertungen" or "12.3K".
pub fn parse_count(text: &str) -> Option<u64> {
    let caps = COUNT.captures(text)?;
    let number = caps.get(1)?.as_str();

    let scale = match caps.get(2).map(|m| m.as_str()) {
        Some("K" | "k") => 1_000.0,
        Some("M" | "m") => 1_000_000.0,
        _ => {
            let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok();
        }
    };

    let mantissa: f64 = normalize_separators(number).parse().ok()?;
    Some((mantissa * scale).round() as u64)
}

/// Parses a price, handling currency symbols and both separator conventions.
///
/// For ranges ("$10 - $20") the lower bound is returned.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();

    let first = cleaned.split('-').find(|part| part.chars().any(|c| c.is_ascii_digit()))?;

    normalize_separators(first).parse().ok()
}

/// Rewrites a number to use '.' as the only (decimal) separator.
fn normalize_separators(text: &str) -> String {
    let text = text.trim_matches(|c| c == ',');

    match (text.rfind('.'), text.rfind(',')) {
        // 1.234,56
        (Some(dot), Some(comma)) if comma > dot => text.replace('.', "").replace(',', "."),
        // 1,234.56
        (Some(_), Some(_)) => text.replace(',', ""),
        (None, Some(comma)) => {
            let decimals = text.len() - comma - 1;
            if (1..=2).contains(&decimals) && text.matches(',').count() == 1 {
                // 29,99 or 0,5
                text.replace(',', ".")
            } else {
                // 2,999
                text.replace(',', "")
            }
        }
        (Some(_), None) if text.matches('.').count() > 1 => text.replace('.', ""),
        _ => text.to_string(),
    }
}

/// Joins a possibly relative link to `base_url`.
pub fn absolutize(href: &str, base_url: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let url = if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), href)
    };

    Some(url)
}
