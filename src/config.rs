//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.chartcalc.toml` files.

use anyhow::{Context, Result};
use chartcalc::{EmptyLabels, FieldKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".chartcalc.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Calculator settings.
    #[serde(default)]
    pub calculator: CalculatorSection,

    /// Placeholder labels for empty values.
    #[serde(default = "default_labels")]
    pub labels: EmptyLabels,

    /// Explicit field kinds, overriding what is inferred from the records.
    #[serde(default)]
    pub fields: HashMap<String, FieldKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            calculator: CalculatorSection::default(),
            labels: default_labels(),
            fields: HashMap::new(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Output format for chart reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// JSON chart data with metadata (default)
    #[default]
    Json,
    /// Markdown table
    Markdown,
}

/// Calculator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorSection {
    /// Field to bucket by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Calculation type identifier.
    #[serde(default = "default_calculation_type")]
    pub calculation_type: String,
}

impl Default for CalculatorSection {
    fn default() -> Self {
        Self {
            field: None,
            calculation_type: default_calculation_type(),
        }
    }
}

fn default_calculation_type() -> String {
    "count".to_string()
}

fn default_labels() -> EmptyLabels {
    EmptyLabels::default()
        .with("Owner", "-- No Owner --")
        .with("c_KanbanState", "-- No Entry --")
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.chartcalc.toml` from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings and only
    /// override values they actually provide.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) -> Result<()> {
        if let Some(ref field) = args.field {
            self.calculator.field = Some(field.clone());
        }
        if let Some(ref calc) = args.calc {
            self.calculator.calculation_type = calc.clone();
        }

        for pair in &args.empty_labels {
            let (field, label) = EmptyLabels::parse_override(pair)?;
            self.labels.register(field, label);
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if args.verbose {
            self.general.verbose = true;
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.calculator.calculation_type, "count");
        assert_eq!(config.calculator.field, None);
        assert_eq!(config.general.format, ReportFormat::Json);
        assert!(config.fields.is_empty());
        assert_eq!(config.labels.label_for("Owner"), "-- No Owner --");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "chart.md"
format = "markdown"

[calculator]
field = "Owner"
calculation_type = "estimate"

[labels]
default = "(blank)"

[labels.empty]
Owner = "-- Unassigned --"

[fields]
Parent = "reference"
Priority = "scalar"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output.as_deref(), Some("chart.md"));
        assert_eq!(config.general.format, ReportFormat::Markdown);
        assert_eq!(config.calculator.field.as_deref(), Some("Owner"));
        assert_eq!(config.calculator.calculation_type, "estimate");
        assert_eq!(config.labels.label_for("Owner"), "-- Unassigned --");
        assert_eq!(config.labels.label_for("Parent"), "(blank)");
        assert_eq!(config.fields.get("Parent"), Some(&FieldKind::Reference));
    }

    #[test]
    fn test_missing_labels_section_uses_defaults() {
        let config: Config = toml::from_str("[calculator]\nfield = \"Owner\"\n").unwrap();
        assert_eq!(config.labels.label_for("Owner"), "-- No Owner --");
        assert_eq!(config.labels.label_for("Parent"), "None");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[calculator]"));
        assert!(toml_str.contains("[labels]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.labels.label_for("c_KanbanState"), "-- No Entry --");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[calculator]\ncalculation_type = \"leafcount\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.calculator.calculation_type, "leafcount");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[calculator\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
