//! Record stores and field metadata.
//!
//! A store hands the calculator a fully loaded, ordered sequence of records
//! together with enough metadata to tell scalar fields from reference
//! fields.

use crate::error::{CalculatorError, Result};
use crate::models::{json_type_name, FieldKind, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Source of records and field metadata for the calculator.
pub trait RecordStore {
    /// All records, in feed order.
    fn records(&self) -> &[Record];

    /// Kind of a field, or `None` if the store does not know the field.
    fn field_kind(&self, field: &str) -> Option<FieldKind>;
}

/// Field name to field kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    kinds: HashMap<String, FieldKind>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infers field kinds from the records themselves.
    ///
    /// A field is a reference if any record holds an object for it,
    /// otherwise it is scalar. Fields that only ever hold `null` are scalar.
    pub fn infer(records: &[Record]) -> Self {
        let mut kinds: HashMap<String, FieldKind> = HashMap::new();

        for record in records {
            for (name, value) in record.fields() {
                let kind = kinds.entry(name.clone()).or_insert(FieldKind::Scalar);
                if value.is_object() {
                    *kind = FieldKind::Reference;
                }
            }
        }

        Self { kinds }
    }

    pub fn insert(&mut self, field: impl Into<String>, kind: FieldKind) {
        self.kinds.insert(field.into(), kind);
    }

    /// Builder form of [`FieldCatalog::insert`].
    pub fn with(mut self, field: impl Into<String>, kind: FieldKind) -> Self {
        self.insert(field, kind);
        self
    }

    /// Applies explicit kinds on top of this catalog.
    pub fn merge(&mut self, overrides: &HashMap<String, FieldKind>) {
        for (field, kind) in overrides {
            self.kinds.insert(field.clone(), *kind);
        }
    }

    pub fn get(&self, field: &str) -> Option<FieldKind> {
        self.kinds.get(field).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// A store over records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<Record>,
    catalog: FieldCatalog,
}

impl InMemoryStore {
    /// Creates a store with an explicit field catalog.
    pub fn new(records: Vec<Record>, catalog: FieldCatalog) -> Self {
        Self { records, catalog }
    }

    /// Creates a store whose catalog is inferred from the records.
    pub fn with_inferred_fields(records: Vec<Record>) -> Self {
        let catalog = FieldCatalog::infer(&records);
        Self { records, catalog }
    }

    /// Parses records from JSON text.
    ///
    /// Accepts a top-level array of objects, or an object carrying the
    /// array under `records` or `Results`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let records = parse_records(value)?;
        debug!("Parsed {} records", records.len());
        Ok(Self::with_inferred_fields(records))
    }

    /// Loads records from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        info!(
            "Loaded {} records ({} fields) from {}",
            store.records.len(),
            store.catalog.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut FieldCatalog {
        &mut self.catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.catalog.get(field)
    }
}

fn parse_records(value: Value) -> Result<Vec<Record>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object
            .remove("records")
            .or_else(|| object.remove("Results"))
        {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CalculatorError::InvalidRecord {
                    index: 0,
                    reason: "expected an array under 'records' or 'Results'".to_string(),
                })
            }
        },
        other => {
            return Err(CalculatorError::InvalidRecord {
                index: 0,
                reason: format!(
                    "expected an array of records, found {}",
                    json_type_name(&other)
                ),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(Record::new(map)),
            other => Err(CalculatorError::InvalidRecord {
                index,
                reason: format!("expected an object, found {}", json_type_name(&other)),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_top_level_array() {
        let store = InMemoryStore::from_json_str(
            r#"[{ "Priority": "P1", "Owner": null }, { "Priority": "P2", "Owner": { "_refObjectName": "User1" } }]"#,
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.field_kind("Priority"), Some(FieldKind::Scalar));
        assert_eq!(store.field_kind("Owner"), Some(FieldKind::Reference));
        assert_eq!(store.field_kind("Color"), None);
    }

    #[test]
    fn test_parse_wrapped_records() {
        let store = InMemoryStore::from_json_str(r#"{ "records": [{ "A": 1 }] }"#).unwrap();
        assert_eq!(store.len(), 1);

        let store =
            InMemoryStore::from_json_str(r#"{ "TotalResultCount": 2, "Results": [{ "A": 1 }, { "A": 2 }] }"#)
                .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        let err = InMemoryStore::from_json_str(r#"[{ "A": 1 }, 5]"#).unwrap_err();
        assert!(matches!(err, CalculatorError::InvalidRecord { index: 1, .. }));

        assert!(InMemoryStore::from_json_str(r#"{ "items": [] }"#).is_err());
        assert!(InMemoryStore::from_json_str(r#""text""#).is_err());
        assert!(matches!(
            InMemoryStore::from_json_str("not json"),
            Err(CalculatorError::Json(_))
        ));
    }

    #[test]
    fn test_catalog_merge_overrides_inference() {
        let mut store =
            InMemoryStore::from_json_str(r#"[{ "Parent": null }, { "Parent": null }]"#).unwrap();
        assert_eq!(store.field_kind("Parent"), Some(FieldKind::Scalar));

        let overrides: HashMap<String, FieldKind> =
            [("Parent".to_string(), FieldKind::Reference)].into_iter().collect();
        store.catalog_mut().merge(&overrides);
        assert_eq!(store.field_kind("Parent"), Some(FieldKind::Reference));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{ "Priority": "P1" }}]"#).unwrap();

        let store = InMemoryStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(matches!(
            InMemoryStore::load(Path::new("/nonexistent/records.json")),
            Err(CalculatorError::Io(_))
        ));
    }
}
