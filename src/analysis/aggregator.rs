//! The calculator: buckets records by a field and computes one statistic
//! per bucket.
//!
//! This module ties together bucket key resolution, ordered grouping and
//! the configured [`CalculationType`] and assembles the result into
//! [`ChartData`].

use super::calculation::CalculationType;
use super::grouping::{group_records, Bucket};
use crate::error::{CalculatorError, Result};
use crate::models::{
    ChartData, DataShapeWarning, EmptyLabels, FieldKind, FieldSpec, SeriesPoint,
};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Calculator settings as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorConfig {
    /// Field to bucket by.
    pub field: String,
    /// Calculation type identifier, e.g. `count` or `estimate`.
    pub calculation_type: String,
    /// Field name to placeholder label for empty values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_label_overrides: Option<HashMap<String, String>>,
}

/// Buckets records by one field and reduces each bucket to a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calculator {
    field: String,
    calculation: CalculationType,
    empty_labels: EmptyLabels,
}

/// A bucket together with its computed statistic.
#[derive(Debug, Clone)]
pub struct BucketStat<'a> {
    pub bucket: Bucket<'a>,
    pub value: f64,
}

/// Full result of one aggregation run.
#[derive(Debug, Clone)]
pub struct Aggregation<'a> {
    pub field: FieldSpec,
    pub calculation: CalculationType,
    pub record_count: usize,
    pub buckets: Vec<BucketStat<'a>>,
    pub warnings: Vec<DataShapeWarning>,
}

impl Aggregation<'_> {
    /// Categories and the single series, in bucket order.
    pub fn chart_data(&self) -> ChartData {
        let points = self
            .buckets
            .iter()
            .map(|stat| SeriesPoint::new(stat.bucket.label.clone(), stat.value))
            .collect();

        ChartData::single_series(self.field.name.clone(), points)
    }
}

impl Calculator {
    /// Creates a calculator. Fails if `field` is empty.
    pub fn new(
        field: impl Into<String>,
        calculation: CalculationType,
        empty_labels: EmptyLabels,
    ) -> Result<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(CalculatorError::EmptyFieldName);
        }

        Ok(Self {
            field,
            calculation,
            empty_labels,
        })
    }

    /// Builds a calculator from caller configuration.
    ///
    /// The calculation type identifier is checked here, so an unknown one
    /// fails before any records are looked at.
    pub fn from_config(config: &CalculatorConfig) -> Result<Self> {
        let calculation: CalculationType = config.calculation_type.parse()?;

        let mut empty_labels = EmptyLabels::default();
        if let Some(ref overrides) = config.empty_label_overrides {
            for (field, label) in overrides {
                empty_labels.register(field.clone(), label.clone());
            }
        }

        Self::new(config.field.clone(), calculation, empty_labels)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn calculation(&self) -> CalculationType {
        self.calculation
    }

    pub fn empty_labels(&self) -> &EmptyLabels {
        &self.empty_labels
    }

    /// Looks up the bucketing field in the store's metadata.
    ///
    /// A store without records needs no metadata: the field is taken as
    /// scalar and the aggregation yields an empty chart.
    pub fn field_spec<S: RecordStore + ?Sized>(&self, store: &S) -> Result<FieldSpec> {
        match store.field_kind(&self.field) {
            Some(kind) => Ok(FieldSpec::new(self.field.clone(), kind)),
            None if store.records().is_empty() => {
                debug!("No records and no metadata for '{}'", self.field);
                Ok(FieldSpec::new(self.field.clone(), FieldKind::Scalar))
            }
            None => Err(CalculatorError::UnknownField(self.field.clone())),
        }
    }

    /// Groups the store's records and computes the statistic for every bucket.
    pub fn aggregate<'a, S: RecordStore + ?Sized>(&self, store: &'a S) -> Result<Aggregation<'a>> {
        let field = self.field_spec(store)?;
        let records = store.records();

        debug!(
            "Aggregating {} records by {} field '{}' using '{}'",
            records.len(),
            field.kind,
            field.name,
            self.calculation
        );

        let mut warnings = Vec::new();
        let buckets = group_records(records, &field, &self.empty_labels)
            .into_iter()
            .map(|bucket| {
                let value = self.calculation.compute(
                    bucket.members.iter().copied(),
                    |record_index, summed, issue| {
                        let warning = DataShapeWarning {
                            record_index,
                            field: summed.to_string(),
                            bucket: bucket.label.clone(),
                            issue,
                        };
                        warn!("{}", warning);
                        warnings.push(warning);
                    },
                );
                BucketStat { bucket, value }
            })
            .collect();

        Ok(Aggregation {
            field,
            calculation: self.calculation,
            record_count: records.len(),
            buckets,
            warnings,
        })
    }

    /// Buckets the store's records and returns chart-ready data.
    pub fn prepare_chart_data<S: RecordStore + ?Sized>(&self, store: &S) -> Result<ChartData> {
        Ok(self.aggregate(store)?.chart_data())
    }
}
