//! chartcalc - bucket records by field and compute chart-ready series
//!
//! A CLI over the chartcalc library: loads records from JSON, groups them
//! by one field and writes the resulting chart data as JSON or Markdown.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Configuration, input or output error

mod cli;
mod config;

use anyhow::{Context, Result};
use chartcalc::report::{self, ChartReport};
use chartcalc::{CalculationType, Calculator, InMemoryStore};
use cli::Args;
use config::{Config, ReportFormat, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // No logging needed for these
    if args.init_config {
        return handle_init_config();
    }
    if args.list_calculations {
        handle_list_calculations();
        return Ok(());
    }

    // Loaded before logging so `general.verbose` can pick the level
    let (config, config_path) = match load_config(&args, Path::new(".")) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("chartcalc v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(ref path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(&args, config) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .chartcalc.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Handle --list-calculations: print every calculation type and what it sums.
fn handle_list_calculations() {
    for calc in CalculationType::ALL {
        match calc.summed_field() {
            Some(field) => println!("{:<20} sum of {}", calc.id(), field),
            None => println!("{:<20} number of records", calc.id()),
        }
    }
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so chart output on stdout stays machine-readable.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load records, aggregate them and write the report.
fn run(args: &Args, mut config: Config) -> Result<()> {
    config.merge_with_args(args)?;

    let field = config
        .calculator
        .field
        .clone()
        .context("No field to bucket by; pass --field or set calculator.field")?;

    // Checked before touching the records
    let calculation: CalculationType = config.calculator.calculation_type.parse()?;
    let calculator = Calculator::new(field, calculation, config.labels.clone())?;

    let records_path = args
        .records
        .as_deref()
        .context("No records file given; pass --records")?;
    let mut store = InMemoryStore::load(records_path)
        .with_context(|| format!("Failed to load records from {}", records_path.display()))?;
    store.catalog_mut().merge(&config.fields);

    let aggregation = calculator.aggregate(&store)?;
    if !aggregation.warnings.is_empty() {
        warn!(
            "{} records had a missing or non-numeric value, counted as 0",
            aggregation.warnings.len()
        );
    }

    let chart_report = ChartReport::from_aggregation(&aggregation);
    let output = match config.general.format {
        ReportFormat::Json => report::generate_json_report(&chart_report)?,
        ReportFormat::Markdown => report::generate_markdown_report(&chart_report),
    };

    match config.general.output {
        Some(ref path) => {
            report::write_report(&output, Path::new(path))
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to: {}", path);
        }
        None => println!("{}", output),
    }

    info!(
        "Bucketed {} records into {} categories by '{}' ({})",
        aggregation.record_count,
        chart_report.metadata.bucket_count,
        calculator.field(),
        calculator.calculation()
    );

    Ok(())
}

/// Load configuration from `--config`, else from `.chartcalc.toml` in `dir`,
/// else defaults. Returns the config and the file it came from.
///
/// A config file that exists but fails to parse is an error either way.
fn load_config(args: &Args, dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    match Config::load_from_dir(dir)? {
        Some(config) => Ok((config, Some(dir.join(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["chartcalc", "--list-calculations"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();

        let (config, path) = load_config(&args(&[]), dir.path()).unwrap();
        assert!(path.is_none());
        assert!(!config.general.verbose);
    }

    #[test]
    fn test_load_config_malformed_default_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[labels.empty]\nOwner = \"-- No Owner --\n",
        )
        .unwrap();

        let err = load_config(&args(&[]), dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[general]\nverbose = true\n",
        )
        .unwrap();

        let cli = args(&[]);
        let (config, path) = load_config(&cli, dir.path()).unwrap();
        assert_eq!(path, Some(dir.path().join(CONFIG_FILE_NAME)));
        assert_eq!(
            cli.log_level(config.general.verbose),
            tracing::Level::DEBUG
        );

        let quiet = args(&["--quiet"]);
        assert_eq!(
            quiet.log_level(config.general.verbose),
            tracing::Level::ERROR
        );
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[calculator]\nfield = \"Owner\"\n").unwrap();

        let cli = args(&["--config", path.to_str().unwrap()]);
        let (config, loaded_from) = load_config(&cli, dir.path()).unwrap();
        assert_eq!(config.calculator.field.as_deref(), Some("Owner"));
        assert_eq!(loaded_from, Some(path));
    }
}
