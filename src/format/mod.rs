//! Output formatting for records and statistics (table, JSON, markdown, CSV),
//! and export to files.

use crate::config::OutputFormat;
use crate::record::{Field, Record};
use crate::report::{StatsTable, STATS_HEADER};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Records and their statistics, as written by JSON output and export.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub records: &'a [Record],
    pub stats: &'a StatsTable,
}

/// Formats records and statistics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a list of records.
    pub fn format_records(&self, records: &[Record]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::csv_record_header(),
                _ => "No records found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
            OutputFormat::Csv => Self::csv_records(records),
        }
    }

    /// Formats a statistics table.
    pub fn format_stats(&self, stats: &StatsTable) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Csv => Self::csv_stats(stats),
            _ if stats.is_empty() => "No statistics (no records).".to_string(),
            OutputFormat::Table => self.table_stats(stats),
            OutputFormat::Markdown => self.markdown_stats(stats),
        }
    }

    /// Formats records followed by their statistics.
    pub fn format_report(&self, records: &[Record], stats: &StatsTable) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&Report { records, stats })
                .unwrap_or_else(|_| "{}".to_string()),
            _ => format!("{}\n\n{}", self.format_records(records), self.format_stats(stats)),
        }
    }

    // Table formatting

    fn table_records(&self, records: &[Record]) -> String {
        let price_width = 12;
        let rating_width = 6;
        let reviews_width = 8;
        let store_width = 20;
        let name_width = 50;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<price_width$}  {:<rating_width$}  {:<reviews_width$}  {:<store_width$}  {}",
            "Price", "Rating", "Reviews", "Store", "Name"
        ));
        lines.push(format!(
            "{:-<price_width$}  {:-<rating_width$}  {:-<reviews_width$}  {:-<store_width$}  {:-<name_width$}",
            "", "", "", "", ""
        ));

        for record in records {
            lines.push(format!(
                "{:>price_width$}  {:>rating_width$}  {:>reviews_width$}  {:<store_width$}  {}",
                record.display(Field::Price),
                record.display(Field::Rating),
                record.display(Field::ReviewCount),
                truncate(record.display(Field::StoreName), store_width),
                truncate(record.display(Field::Name), name_width),
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} records", records.len()));

        lines.join("\n")
    }

    fn table_stats(&self, stats: &StatsTable) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Statistics ({} records)", stats.total));
        for row in stats.rows() {
            if row[0] == "top_store" {
                lines.push(format!("  Store:   {} ({}, {})", row[4], row[5], row[6]));
            } else {
                lines.push(format!(
                    "  {:<8} min {}  max {}  mean {}",
                    format!("{}:", capitalize(&row[0])),
                    row[1],
                    row[2],
                    row[3]
                ));
            }
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_records(&self, records: &[Record]) -> String {
        let mut lines = Vec::new();

        lines.push("| Name | Price | Rating | Reviews | Store |".to_string());
        lines.push("|------|-------|--------|---------|-------|".to_string());

        for record in records {
            lines.push(format!(
                "| [{}]({}) | {} | {} | {} | {} |",
                truncate(record.display(Field::Name), 40).replace('|', "\\|"),
                record.display(Field::Url),
                record.display(Field::Price),
                record.display(Field::Rating),
                record.display(Field::ReviewCount),
                record.display(Field::StoreName).replace('|', "\\|"),
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} records found*", records.len()));

        lines.join("\n")
    }

    fn markdown_stats(&self, stats: &StatsTable) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## Statistics ({} records)", stats.total));
        lines.push(String::new());
        lines.push(format!("| {} |", STATS_HEADER.join(" | ")));
        lines.push(format!("|{}", "---|".repeat(STATS_HEADER.len())));

        for row in stats.rows() {
            lines.push(format!("| {} |", row.join(" | ")));
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_record_header() -> String {
        Field::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(",")
    }

    fn csv_records(records: &[Record]) -> String {
        let mut lines = Vec::new();
        lines.push(Self::csv_record_header());

        for record in records {
            let row: Vec<String> =
                record.to_row().into_iter().map(|(_, value)| Self::csv_escape(value)).collect();
            lines.push(row.join(","));
        }

        lines.join("\n")
    }

    fn csv_stats(stats: &StatsTable) -> String {
        let mut lines = Vec::new();
        lines.push(STATS_HEADER.join(","));

        for row in stats.rows() {
            let row: Vec<String> = row.iter().map(|v| Self::csv_escape(v)).collect();
            lines.push(row.join(","));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Writes records and statistics to `path`.
///
/// A `.json` path receives `{ "records": [...], "stats": {...} }`. Any other
/// path receives the records as CSV, with the statistics in a sibling
/// `<stem>_stats.csv`. Returns the files written.
pub fn export(path: &Path, records: &[Record], stats: &StatsTable) -> Result<Vec<PathBuf>> {
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let written = if is_json {
        let json = serde_json::to_string_pretty(&Report { records, stats })
            .context("Failed to serialize report")?;
        write_file(path, &json)?;
        vec![path.to_path_buf()]
    } else {
        write_file(path, &Formatter::csv_records(records))?;

        let stats_path = stats_path(path);
        write_file(&stats_path, &Formatter::csv_stats(stats))?;

        vec![path.to_path_buf(), stats_path]
    };

    info!("Exported {} records to {}", records.len(), path.display());
    Ok(written)
}

/// `results.csv` -> `results_stats.csv`
fn stats_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{}_stats.csv", stem))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut content = content.to_string();
    content.push('\n');
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::summarize;

    fn make_record() -> Record {
        Record::default()
            .with(Field::Name, "Logitech MX Master 3S, Wireless")
            .with(Field::Url, "https://www.amazon.com/dp/B09HM94VDS")
            .with(Field::Price, "$99.99")
            .with(Field::Rating, "4.7")
            .with(Field::ReviewCount, "12345")
            .with(Field::StoreName, "Logitech")
            .with(Field::Asin, "B09HM94VDS")
            .with(Field::SearchKeyword, "mouse")
    }

    fn make_minimal_record() -> Record {
        Record::default()
            .with(Field::Name, "Minimal")
            .with(Field::Url, "https://www.amazon.com/dp/MIN")
    }

    // JSON format tests

    #[test]
    fn test_json_records_keep_na_marker() {
        let formatter = Formatter::new(OutputFormat::Json);
        let output = formatter.format_records(&[make_minimal_record()]);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["name"], "Minimal");
        assert_eq!(value[0]["price"], "N/A");
        assert_eq!(value[0]["store_rating"], "N/A");
    }

    #[test]
    fn test_json_empty() {
        let formatter = Formatter::new(OutputFormat::Json);
        assert_eq!(formatter.format_records(&[]), "[]");
    }

    #[test]
    fn test_json_report() {
        let records = vec![make_record()];
        let stats = summarize(&records);
        let output = Formatter::new(OutputFormat::Json).format_report(&records, &stats);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["records"][0]["asin"], "B09HM94VDS");
        assert_eq!(value["stats"]["total"], 1);
        assert_eq!(value["stats"]["top_stores"][0]["name"], "Logitech");
    }

    // Table format tests

    #[test]
    fn test_table_records() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_records(&[make_record(), make_minimal_record()]);

        assert!(output.contains("Price"));
        assert!(output.contains("$99.99"));
        assert!(output.contains("Logitech MX Master"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Total: 2 records"));
    }

    #[test]
    fn test_table_long_name_truncation() {
        let long = "Ünïcödé ".repeat(20);
        let record = make_minimal_record().with(Field::Name, long.as_str());
        let output = Formatter::new(OutputFormat::Table).format_records(&[record]);

        assert!(output.contains("..."));
    }

    #[test]
    fn test_table_empty() {
        let formatter = Formatter::new(OutputFormat::Table);
        assert_eq!(formatter.format_records(&[]), "No records found.");
    }

    #[test]
    fn test_table_stats() {
        let records = vec![make_record(), make_minimal_record()];
        let output = Formatter::new(OutputFormat::Table).format_stats(&summarize(&records));

        assert!(output.contains("Statistics (2 records)"));
        assert!(output.contains("Price:"));
        assert!(output.contains("$99.99"));
        assert!(output.contains("Store:   Logitech (1, 50.0%)"));
        assert!(output.contains("Store:   N/A (1, 50.0%)"));
    }

    #[test]
    fn test_table_stats_empty() {
        let output = Formatter::new(OutputFormat::Table).format_stats(&StatsTable::default());
        assert_eq!(output, "No statistics (no records).");
    }

    // Markdown format tests

    #[test]
    fn test_markdown_records() {
        let formatter = Formatter::new(OutputFormat::Markdown);
        let output = formatter.format_records(&[make_record()]);

        assert!(output.contains("| Name | Price |"));
        assert!(output.contains("(https://www.amazon.com/dp/B09HM94VDS)"));
        assert!(output.contains("*1 records found*"));
    }

    #[test]
    fn test_markdown_stats() {
        let output =
            Formatter::new(OutputFormat::Markdown).format_stats(&summarize(&[make_record()]));

        assert!(output.contains("## Statistics"));
        assert!(output.contains("| metric | min | max | mean | store | count | share |"));
        assert!(output.contains("| price | $99.99 |"));
    }

    // CSV format tests

    #[test]
    fn test_csv_header_lists_every_field() {
        let output = Formatter::new(OutputFormat::Csv).format_records(&[]);
        assert_eq!(
            output,
            "name,url,price,rating,review_count,store_name,store_rating,availability,\
             shipping,asin,image_url,promotion,search_keyword"
        );
    }

    #[test]
    fn test_csv_records() {
        let output = Formatter::new(OutputFormat::Csv).format_records(&[make_record()]);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("\"Logitech MX Master 3S, Wireless\","));
        assert!(lines[1].contains(",$99.99,4.7,12345,Logitech,N/A,"));
        assert!(lines[1].ends_with(",mouse"));
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(Formatter::csv_escape("simple"), "simple");
        assert_eq!(Formatter::csv_escape("with,comma"), "\"with,comma\"");
        assert_eq!(Formatter::csv_escape("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(Formatter::csv_escape("with\nnewline"), "\"with\nnewline\"");
    }

    // Export tests

    #[test]
    fn test_export_csv_writes_stats_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let records = vec![make_record(), make_minimal_record()];
        let stats = summarize(&records);

        let written = export(&path, &records, &stats).unwrap();

        assert_eq!(written, vec![path.clone(), dir.path().join("results_stats.csv")]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);

        let stats_content = std::fs::read_to_string(&written[1]).unwrap();
        assert!(stats_content.starts_with("metric,min,max,mean,store,count,share"));
        assert!(stats_content.contains("price,$99.99,$99.99,$99.99"));
        assert!(stats_content.contains("top_store,,,,Logitech,1,50.0%"));
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.JSON");
        let records = vec![make_record()];

        let written = export(&path, &records, &summarize(&records)).unwrap();
        assert_eq!(written.len(), 1);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["records"][0]["name"], "Logitech MX Master 3S, Wireless");
        assert_eq!(value["stats"]["price"]["max"], 99.99);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let err = export(Path::new("/nonexistent/dir/out.csv"), &[], &StatsTable::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write output file"));
    }

    #[test]
    fn test_stats_path() {
        assert_eq!(stats_path(Path::new("out/data.csv")), PathBuf::from("out/data_stats.csv"));
        assert_eq!(stats_path(Path::new("data")), PathBuf::from("data_stats.csv"));
    }
}
