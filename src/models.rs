//! Data models for the calculator.
//!
//! This module contains the records consumed by the calculator, the
//! resolved field values used for bucketing, and the chart data it
//! produces.

use crate::error::{CalculatorError, Result};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Attribute of a reference object that carries its display name.
pub const REF_NAME_ATTRIBUTE: &str = "_refObjectName";

/// Placeholder label used for empty values when no override is registered.
pub const DEFAULT_EMPTY_LABEL: &str = "None";

/// A single flat record: field name to raw JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates a record from an existing JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterates over field names and raw values.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl TryFrom<Value> for Record {
    type Error = CalculatorError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CalculatorError::InvalidRecord {
                index: 0,
                reason: format!("expected an object, found {}", json_type_name(&other)),
            }),
        }
    }
}

/// How a field's raw values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Plain text, number or boolean.
    Scalar,
    /// Object pointing at another entity, labelled by its display name.
    Reference,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::Reference => write!(f, "reference"),
        }
    }
}

/// The field a calculator buckets by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Resolves this field's value on a record.
    pub fn value_of(&self, record: &Record) -> FieldValue {
        let raw = record.get(&self.name);
        if self.kind == FieldKind::Scalar {
            if let Some(structured @ (Value::Object(_) | Value::Array(_))) = raw {
                warn!(
                    "Scalar field '{}' holds {}, treated as empty",
                    self.name,
                    json_type_name(structured)
                );
            }
        }
        FieldValue::resolve(raw, self.kind)
    }
}

/// A raw field value resolved into one of the shapes the calculator buckets on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    Reference(String),
    Empty,
}

impl FieldValue {
    /// Resolves a raw value according to the field's kind.
    ///
    /// `null`, a missing attribute and `""` are empty for every kind, as are
    /// objects and arrays in a scalar field. A reference object without a
    /// display name is empty rather than a reference with no label. A bare
    /// string in a reference field is taken as the display name.
    pub fn resolve(raw: Option<&Value>, kind: FieldKind) -> Self {
        let raw = match raw {
            None | Some(Value::Null) => return FieldValue::Empty,
            Some(raw) => raw,
        };

        match raw {
            Value::Object(_) | Value::Array(_) if kind == FieldKind::Scalar => FieldValue::Empty,
            Value::Object(object) => match object.get(REF_NAME_ATTRIBUTE) {
                Some(Value::String(name)) if !name.is_empty() => {
                    FieldValue::Reference(name.clone())
                }
                _ => FieldValue::Empty,
            },
            Value::Array(_) => FieldValue::Empty,
            Value::String(s) if s.is_empty() => FieldValue::Empty,
            scalar => {
                let text = scalar_text(scalar);
                match kind {
                    FieldKind::Scalar => FieldValue::Scalar(text),
                    FieldKind::Reference => FieldValue::Reference(text),
                }
            }
        }
    }

    /// Returns the label text, or `None` for an empty value.
    pub fn text(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) | FieldValue::Reference(s) => Some(s),
            FieldValue::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Placeholder labels for records whose bucketed field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyLabels {
    /// Label used for fields without a registered placeholder.
    #[serde(default = "default_empty_label")]
    pub default: String,

    /// Field name to placeholder label.
    #[serde(default, rename = "empty")]
    pub overrides: HashMap<String, String>,
}

impl Default for EmptyLabels {
    fn default() -> Self {
        Self {
            default: default_empty_label(),
            overrides: HashMap::new(),
        }
    }
}

fn default_empty_label() -> String {
    DEFAULT_EMPTY_LABEL.to_string()
}

impl EmptyLabels {
    /// Adds a placeholder for one field, replacing any previous one.
    pub fn register(&mut self, field: impl Into<String>, label: impl Into<String>) {
        self.overrides.insert(field.into(), label.into());
    }

    /// Builder form of [`EmptyLabels::register`].
    pub fn with(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.register(field, label);
        self
    }

    /// Returns the placeholder for a field.
    pub fn label_for(&self, field: &str) -> &str {
        self.overrides
            .get(field)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// Parses a `FIELD=LABEL` pair. The label may itself contain `=`.
    pub fn parse_override(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((field, label)) if !field.trim().is_empty() && !label.is_empty() => {
                Ok((field.trim().to_string(), label.to_string()))
            }
            _ => Err(CalculatorError::InvalidLabelOverride(pair.to_string())),
        }
    }
}

/// One `(label, value)` point of a series, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for SeriesPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.label)?;
        // Whole numbers go out as integers so counts read as `1`, not `1.0`.
        if self.value.fract() == 0.0 && self.value.abs() <= MAX_EXACT_INTEGER {
            tuple.serialize_element(&(self.value as i64))?;
        } else {
            tuple.serialize_element(&self.value)?;
        }
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for SeriesPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (label, value) = <(String, f64)>::deserialize(deserializer)?;
        Ok(Self { label, value })
    }
}

/// A named series of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<SeriesPoint>,
}

/// Chart-ready output: ordered categories plus one series aligned with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartData {
    /// Builds chart data with a single series named `name`.
    pub fn single_series(name: impl Into<String>, data: Vec<SeriesPoint>) -> Self {
        Self {
            categories: data.iter().map(|p| p.label.clone()).collect(),
            series: vec![Series {
                name: name.into(),
                data,
            }],
        }
    }

    /// Points of the first series, or an empty slice when there is none.
    pub fn series_data(&self) -> &[SeriesPoint] {
        self.series.first().map(|s| s.data.as_slice()).unwrap_or(&[])
    }

    /// Sum of every value in the first series.
    pub fn total(&self) -> f64 {
        self.series_data().iter().map(|p| p.value).sum()
    }
}

/// Why a record contributed zero to a summed statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "found")]
pub enum DataShapeIssue {
    Missing,
    NonNumeric(String),
}

/// A non-fatal problem with one record's summed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShapeWarning {
    /// Position of the record in the input sequence.
    pub record_index: usize,
    /// Attribute the calculation tried to sum.
    pub field: String,
    /// Bucket the record landed in.
    pub bucket: String,
    pub issue: DataShapeIssue,
}

impl fmt::Display for DataShapeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            DataShapeIssue::Missing => write!(
                f,
                "record {} ({}): '{}' is missing, counted as 0",
                self.record_index, self.bucket, self.field
            ),
            DataShapeIssue::NonNumeric(found) => write!(
                f,
                "record {} ({}): '{}' is not numeric ({}), counted as 0",
                self.record_index, self.bucket, self.field, found
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_resolve_scalar_values() {
        let rec = record(json!({ "Priority": "P1", "PlanEstimate": 3, "Blocked": false }));

        assert_eq!(
            FieldValue::resolve(rec.get("Priority"), FieldKind::Scalar),
            FieldValue::Scalar("P1".to_string())
        );
        assert_eq!(
            FieldValue::resolve(rec.get("PlanEstimate"), FieldKind::Scalar),
            FieldValue::Scalar("3".to_string())
        );
        assert_eq!(
            FieldValue::resolve(rec.get("Blocked"), FieldKind::Scalar),
            FieldValue::Scalar("false".to_string())
        );
    }

    #[test]
    fn test_resolve_keeps_whitespace() {
        let rec = record(json!({ "State": " Done " }));
        assert_eq!(
            FieldValue::resolve(rec.get("State"), FieldKind::Scalar).text(),
            Some(" Done ")
        );
    }

    #[test]
    fn test_resolve_empty_values() {
        let rec = record(json!({ "Owner": null, "c_KanbanState": "" }));

        assert!(FieldValue::resolve(rec.get("Owner"), FieldKind::Reference).is_empty());
        assert!(FieldValue::resolve(rec.get("c_KanbanState"), FieldKind::Scalar).is_empty());
        assert!(FieldValue::resolve(rec.get("Missing"), FieldKind::Scalar).is_empty());
    }

    #[test]
    fn test_resolve_reference() {
        let rec = record(json!({
            "Owner": { "_refObjectName": "User1", "_ref": "/user/1" },
            "Parent": { "_ref": "/initiative/9" },
            "Project": "Team A"
        }));

        assert_eq!(
            FieldValue::resolve(rec.get("Owner"), FieldKind::Reference),
            FieldValue::Reference("User1".to_string())
        );
        // No display name: empty, not an unnamed reference
        assert!(FieldValue::resolve(rec.get("Parent"), FieldKind::Reference).is_empty());
        assert_eq!(
            FieldValue::resolve(rec.get("Project"), FieldKind::Reference),
            FieldValue::Reference("Team A".to_string())
        );
    }

    #[test]
    fn test_resolve_object_in_scalar_field() {
        let rec = record(json!({
            "Priority": { "_refObjectName": "Sneaky" },
            "Tags": ["a", "b"]
        }));

        assert!(FieldValue::resolve(rec.get("Priority"), FieldKind::Scalar).is_empty());
        assert!(FieldValue::resolve(rec.get("Tags"), FieldKind::Scalar).is_empty());
        assert!(FieldSpec::new("Priority", FieldKind::Scalar)
            .value_of(&rec)
            .is_empty());
        assert_eq!(
            FieldValue::resolve(rec.get("Priority"), FieldKind::Reference),
            FieldValue::Reference("Sneaky".to_string())
        );
    }

    #[test]
    fn test_record_from_non_object() {
        let err = Record::try_from(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_empty_labels() {
        let labels = EmptyLabels::default().with("Owner", "-- No Owner --");

        assert_eq!(labels.label_for("Owner"), "-- No Owner --");
        assert_eq!(labels.label_for("Parent"), "None");
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            EmptyLabels::parse_override("Owner=-- No Owner --").unwrap(),
            ("Owner".to_string(), "-- No Owner --".to_string())
        );
        assert_eq!(
            EmptyLabels::parse_override("Expr=a=b").unwrap(),
            ("Expr".to_string(), "a=b".to_string())
        );
        assert!(EmptyLabels::parse_override("Owner").is_err());
        assert!(EmptyLabels::parse_override("=Nobody").is_err());
        assert!(EmptyLabels::parse_override("Owner=").is_err());
    }

    #[test]
    fn test_chart_data_serialization() {
        let chart = ChartData::single_series(
            "Priority",
            vec![SeriesPoint::new("P1", 1.0), SeriesPoint::new("P2", 2.5)],
        );

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(
            json,
            json!({
                "categories": ["P1", "P2"],
                "series": [{ "name": "Priority", "data": [["P1", 1], ["P2", 2.5]] }]
            })
        );

        let back: ChartData = serde_json::from_value(json).unwrap();
        assert_eq!(back, chart);
    }

    #[test]
    fn test_chart_data_total() {
        let chart = ChartData::single_series(
            "Priority",
            vec![SeriesPoint::new("P1", 2.0), SeriesPoint::new("P2", 3.0)],
        );
        assert_eq!(chart.total(), 5.0);
        assert_eq!(chart.categories.len(), chart.series_data().len());
    }

    #[test]
    fn test_data_shape_warning_display() {
        let warning = DataShapeWarning {
            record_index: 2,
            field: "PlanEstimate".to_string(),
            bucket: "P3".to_string(),
            issue: DataShapeIssue::NonNumeric("string".to_string()),
        };
        assert_eq!(
            warning.to_string(),
            "record 2 (P3): 'PlanEstimate' is not numeric (string), counted as 0"
        );
    }
}
