//! Chart report generation.
//!
//! Wraps the chart data of an aggregation with metadata and renders it as
//! JSON or Markdown.

use crate::analysis::Aggregation;
use crate::error::Result;
use crate::models::{ChartData, DataShapeWarning, FieldKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Metadata about a chart report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Field the records were bucketed by.
    pub field: String,
    /// Kind of the bucketing field.
    pub field_kind: FieldKind,
    /// Calculation type identifier.
    pub calculation: String,
    /// Attribute summed per bucket, absent for counts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summed_field: Option<String>,
    /// Number of input records.
    pub record_count: usize,
    /// Number of buckets (categories).
    pub bucket_count: usize,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

/// Chart data plus what produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartReport {
    pub metadata: ReportMetadata,
    pub chart: ChartData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DataShapeWarning>,
}

impl ChartReport {
    /// Builds a report from a finished aggregation.
    pub fn from_aggregation(aggregation: &Aggregation<'_>) -> Self {
        let chart = aggregation.chart_data();

        Self {
            metadata: ReportMetadata {
                field: aggregation.field.name.clone(),
                field_kind: aggregation.field.kind,
                calculation: aggregation.calculation.id().to_string(),
                summed_field: aggregation.calculation.summed_field().map(String::from),
                record_count: aggregation.record_count,
                bucket_count: chart.categories.len(),
                generated_at: Utc::now(),
            },
            chart,
            warnings: aggregation.warnings.clone(),
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &ChartReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} by {}\n\n", report.metadata.calculation, report.metadata.field));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_chart_table(&report.chart));
    output.push_str(&generate_warnings_section(&report.warnings));

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Field:** `{}` ({})\n",
        metadata.field, metadata.field_kind
    ));
    match metadata.summed_field {
        Some(ref summed) => section.push_str(&format!(
            "- **Calculation:** {} (sum of `{}`)\n",
            metadata.calculation, summed
        )),
        None => section.push_str(&format!("- **Calculation:** {}\n", metadata.calculation)),
    }
    section.push_str(&format!("- **Records:** {}\n", metadata.record_count));
    section.push_str(&format!("- **Categories:** {}\n", metadata.bucket_count));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_chart_table(chart: &ChartData) -> String {
    let mut section = String::new();

    section.push_str("## Series\n\n");

    if chart.categories.is_empty() {
        section.push_str("No records to chart.\n\n");
        return section;
    }

    for series in &chart.series {
        section.push_str(&format!("| {} | Value |\n", escape_cell(&series.name)));
        section.push_str("|:---|---:|\n");
        for point in &series.data {
            section.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&point.label),
                format_value(point.value)
            ));
        }
        section.push_str(&format!("| **Total** | **{}** |\n\n", format_value(chart.total())));
    }

    section
}

fn generate_warnings_section(warnings: &[DataShapeWarning]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Warnings\n\n");
    for warning in warnings {
        section.push_str(&format!("- {}\n", warning));
    }
    section.push('\n');

    section
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ChartReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered report to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}
