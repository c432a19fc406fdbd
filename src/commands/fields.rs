//! Lists the record fields and the fallback chain used for each.

use crate::config::{Config, OutputFormat};
use crate::extract::selectors::default_strategies;
use crate::record::Field;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FieldInfo {
    field: Field,
    identifying: bool,
    enabled: bool,
    custom: bool,
    strategies: Vec<String>,
}

/// Describes the extraction setup after configuration is applied.
pub struct FieldsCommand {
    config: Config,
}

impl FieldsCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<String> {
        let fields = self.describe();

        match self.config.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&fields).context("Failed to serialize fields")
            }
            OutputFormat::Markdown => Ok(Self::markdown(&fields)),
            OutputFormat::Table | OutputFormat::Csv => Ok(Self::table(&fields)),
        }
    }

    fn describe(&self) -> Vec<FieldInfo> {
        let extraction = &self.config.extraction;

        Field::ALL
            .into_iter()
            .map(|field| {
                let custom = extraction.strategies.get(&field);
                let chain = custom.cloned().unwrap_or_else(|| default_strategies(field));

                FieldInfo {
                    field,
                    identifying: field.is_identifying(),
                    enabled: field.is_extracted() && !extraction.disabled_fields.contains(&field),
                    custom: custom.is_some(),
                    strategies: chain.iter().map(|s| s.label()).collect(),
                }
            })
            .collect()
    }

    fn table(fields: &[FieldInfo]) -> String {
        let mut lines = Vec::new();

        for info in fields {
            let mut flags = Vec::new();
            if info.identifying {
                flags.push("required");
            }
            if !info.field.is_extracted() {
                flags.push("set by crawler");
            } else if !info.enabled {
                flags.push("disabled");
            }
            if info.custom {
                flags.push("custom");
            }

            if flags.is_empty() {
                lines.push(info.field.to_string());
            } else {
                lines.push(format!("{} [{}]", info.field, flags.join(", ")));
            }

            for (i, label) in info.strategies.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, label));
            }
        }

        lines.join("\n")
    }

    fn markdown(fields: &[FieldInfo]) -> String {
        let mut lines = Vec::new();

        lines.push("| Field | Enabled | Strategies |".to_string());
        lines.push("|-------|---------|------------|".to_string());

        for info in fields {
            let strategies: Vec<String> =
                info.strategies.iter().map(|s| format!("`{}`", s.replace('|', "\\|"))).collect();
            lines.push(format!(
                "| {} | {} | {} |",
                info.field,
                if info.enabled { "yes" } else { "no" },
                strategies.join("<br>")
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Normalize, StrategyConfig};

    #[test]
    fn test_table_lists_every_field() {
        let output = FieldsCommand::new(Config::default()).execute().unwrap();

        for field in Field::ALL {
            assert!(output.contains(field.as_str()), "{} missing", field);
        }
        assert!(output.contains("name [required]"));
        assert!(output.contains("availability [disabled]"));
        assert!(output.contains("search_keyword [set by crawler]"));
        assert!(output.contains("1. [data-cy='title-recipe'] h2 span"));
    }

    #[test]
    fn test_custom_chain_replaces_default() {
        let mut config = Config::default();
        config.format = OutputFormat::Json;
        config
            .extraction
            .strategies
            .insert(Field::Price, vec![StrategyConfig::text(".my-price", Normalize::Price)]);

        let output = FieldsCommand::new(config).execute().unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        let price = value.as_array().unwrap().iter().find(|f| f["field"] == "price").unwrap();
        assert_eq!(price["custom"], true);
        assert_eq!(price["strategies"].as_array().unwrap().len(), 1);
        assert_eq!(price["strategies"][0], ".my-price (price)");
    }

    #[test]
    fn test_markdown() {
        let mut config = Config::default();
        config.format = OutputFormat::Markdown;

        let output = FieldsCommand::new(config).execute().unwrap();
        assert!(output.starts_with("| Field | Enabled | Strategies |"));
        assert!(output.contains("| shipping | no |"));
    }
}
