//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ReportFormat;
use chartcalc::EmptyLabels;
use clap::Parser;
use std::path::PathBuf;

/// chartcalc - bucket records by a field and compute chart series
///
/// Groups the records of a JSON file by the value of one field, in the
/// order values first appear, and computes a count or a sum per group.
///
/// Examples:
///   chartcalc --records defects.json --field Priority
///   chartcalc --records defects.json --field Priority --calc estimate
///   chartcalc --records defects.json --field Owner --empty-label "Owner=-- No Owner --"
///   chartcalc --records features.json --field Parent --format markdown -o chart.md
///   chartcalc --list-calculations
///   chartcalc --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file holding the records to aggregate
    ///
    /// Either an array of objects, or an object with a `records` or
    /// `Results` array.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["init_config", "list_calculations"]
    )]
    pub records: Option<PathBuf>,

    /// Field to bucket records by
    ///
    /// Overrides `calculator.field` from the config file.
    #[arg(short, long, value_name = "FIELD", env = "CHARTCALC_FIELD")]
    pub field: Option<String>,

    /// Calculation type (count, estimate, prelimest, acceptedleafcount,
    /// acceptedleafplanest, leafcount, leafplanest)
    #[arg(long, value_name = "TYPE", env = "CHARTCALC_CALC")]
    pub calc: Option<String>,

    /// Placeholder label for empty values of a field (repeatable)
    ///
    /// Example: --empty-label "Owner=-- No Owner --"
    #[arg(long = "empty-label", value_name = "FIELD=LABEL")]
    pub empty_labels: Vec<String>,

    /// Output format (json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Output file path; prints to stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .chartcalc.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the supported calculation types and exit
    #[arg(long)]
    pub list_calculations: bool,

    /// Generate a default .chartcalc.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config || self.list_calculations {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref field) = self.field {
            if field.trim().is_empty() {
                return Err("Field name must not be empty".to_string());
            }
        }

        for pair in &self.empty_labels {
            EmptyLabels::parse_override(pair).map_err(|e| e.to_string())?;
        }

        if let Some(ref records) = self.records {
            if !records.is_file() {
                return Err(format!("Records file does not exist: {}", records.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet`
    /// wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            records: None,
            field: Some("Priority".to_string()),
            calc: None,
            empty_labels: Vec::new(),
            format: None,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            list_calculations: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "chartcalc",
            "--records",
            "defects.json",
            "--field",
            "Owner",
            "--calc",
            "estimate",
            "--empty-label",
            "Owner=-- No Owner --",
            "--empty-label",
            "Parent=(none)",
            "--format",
            "markdown",
        ])
        .unwrap();

        assert_eq!(args.records, Some(PathBuf::from("defects.json")));
        assert_eq!(args.field.as_deref(), Some("Owner"));
        assert_eq!(args.calc.as_deref(), Some("estimate"));
        assert_eq!(args.empty_labels.len(), 2);
        assert_eq!(args.format, Some(ReportFormat::Markdown));
    }

    #[test]
    fn test_records_required() {
        assert!(Args::try_parse_from(["chartcalc", "--field", "Owner"]).is_err());
        assert!(Args::try_parse_from(["chartcalc", "--init-config"]).is_ok());
        assert!(Args::try_parse_from(["chartcalc", "--list-calculations"]).is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_empty_label() {
        let mut args = make_args();
        args.empty_labels = vec!["Owner".to_string()];
        assert!(args.validate().unwrap_err().contains("FIELD=LABEL"));
    }

    #[test]
    fn test_validation_missing_records_file() {
        let mut args = make_args();
        args.records = Some(PathBuf::from("/nonexistent/records.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
