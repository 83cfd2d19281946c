//! Bucket key resolution and ordered grouping.
//!
//! Records are grouped by the resolved value of one field. Buckets keep the
//! order in which their key first appears in the input; they are never
//! sorted by label or size.

use crate::models::{EmptyLabels, FieldSpec, FieldValue, Record};
use std::collections::HashMap;
use tracing::debug;

/// The key a record is grouped under and the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketKey {
    pub key: String,
    pub label: String,
}

impl BucketKey {
    /// Resolves the bucket key of a single record.
    ///
    /// References are keyed by display name, so two references sharing a
    /// name land in the same bucket. Empty values use the field's
    /// placeholder label.
    pub fn resolve(record: &Record, field: &FieldSpec, empty_labels: &EmptyLabels) -> Self {
        match field.value_of(record) {
            FieldValue::Scalar(text) | FieldValue::Reference(text) => Self {
                key: text.clone(),
                label: text,
            },
            FieldValue::Empty => {
                let placeholder = empty_labels.label_for(&field.name).to_string();
                Self {
                    key: placeholder.clone(),
                    label: placeholder,
                }
            }
        }
    }
}

/// Records sharing one bucket key.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<'a> {
    pub key: String,
    pub label: String,
    /// Members as `(input index, record)`, in input order.
    pub members: Vec<(usize, &'a Record)>,
}

impl<'a> Bucket<'a> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Group records into buckets ordered by first occurrence.
pub fn group_records<'a>(
    records: &'a [Record],
    field: &FieldSpec,
    empty_labels: &EmptyLabels,
) -> Vec<Bucket<'a>> {
    let mut buckets: Vec<Bucket<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let BucketKey { key, label } = BucketKey::resolve(record, field, empty_labels);

        let position = match positions.get(&key) {
            Some(&position) => position,
            None => {
                positions.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    label,
                    members: Vec::new(),
                });
                buckets.len() - 1
            }
        };

        buckets[position].members.push((index, record));
    }

    debug!(
        "Grouped {} records by '{}' into {} buckets",
        records.len(),
        field.name,
        buckets.len()
    );

    buckets
}
