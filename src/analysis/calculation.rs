//! Calculation types and per-bucket statistics.

use crate::error::{CalculatorError, Result};
use crate::models::{json_type_name, DataShapeIssue, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How the records in one bucket reduce to a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    /// Number of records in the bucket.
    Count,
    /// Sum of story plan estimates.
    Estimate,
    /// Sum of preliminary estimate values.
    PrelimEst,
    /// Sum of accepted leaf story counts.
    AcceptedLeafCount,
    /// Sum of accepted leaf story plan estimate totals.
    AcceptedLeafPlanEst,
    /// Sum of leaf story counts.
    LeafCount,
    /// Sum of leaf story plan estimate totals.
    LeafPlanEst,
}

impl CalculationType {
    pub const ALL: [CalculationType; 7] = [
        CalculationType::Count,
        CalculationType::Estimate,
        CalculationType::PrelimEst,
        CalculationType::AcceptedLeafCount,
        CalculationType::AcceptedLeafPlanEst,
        CalculationType::LeafCount,
        CalculationType::LeafPlanEst,
    ];

    /// Identifier accepted in configuration.
    pub fn id(&self) -> &'static str {
        match self {
            CalculationType::Count => "count",
            CalculationType::Estimate => "estimate",
            CalculationType::PrelimEst => "prelimest",
            CalculationType::AcceptedLeafCount => "acceptedleafcount",
            CalculationType::AcceptedLeafPlanEst => "acceptedleafplanest",
            CalculationType::LeafCount => "leafcount",
            CalculationType::LeafPlanEst => "leafplanest",
        }
    }

    /// The numeric attribute summed by this calculation, `None` for counts.
    pub fn summed_field(&self) -> Option<&'static str> {
        match self {
            CalculationType::Count => None,
            CalculationType::Estimate => Some("PlanEstimate"),
            CalculationType::PrelimEst => Some("PreliminaryEstimateValue"),
            CalculationType::AcceptedLeafCount => Some("AcceptedLeafStoryCount"),
            CalculationType::AcceptedLeafPlanEst => Some("AcceptedLeafStoryPlanEstimateTotal"),
            CalculationType::LeafCount => Some("LeafStoryCount"),
            CalculationType::LeafPlanEst => Some("LeafStoryPlanEstimateTotal"),
        }
    }

    /// Reduces the members of one bucket.
    ///
    /// Members are `(record_index, record)` pairs. Records whose summed
    /// attribute is missing or not a number add zero and are reported
    /// through `on_issue`.
    pub fn compute<'a, I, F>(&self, members: I, mut on_issue: F) -> f64
    where
        I: IntoIterator<Item = (usize, &'a Record)>,
        F: FnMut(usize, &'static str, DataShapeIssue),
    {
        let Some(field) = self.summed_field() else {
            return members.into_iter().count() as f64;
        };

        members
            .into_iter()
            .map(|(index, record)| match numeric_value(record.get(field)) {
                Ok(value) => value,
                Err(issue) => {
                    on_issue(index, field, issue);
                    0.0
                }
            })
            .sum()
    }
}

fn numeric_value(raw: Option<&Value>) -> std::result::Result<f64, DataShapeIssue> {
    match raw {
        None | Some(Value::Null) => Err(DataShapeIssue::Missing),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| DataShapeIssue::NonNumeric(n.to_string())),
        Some(other) => Err(DataShapeIssue::NonNumeric(
            json_type_name(other).to_string(),
        )),
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for CalculationType {
    type Err = CalculatorError;

    fn from_str(s: &str) -> Result<Self> {
        CalculationType::ALL
            .into_iter()
            .find(|calc| calc.id() == s)
            .ok_or_else(|| CalculatorError::UnknownCalculationType(s.to_string()))
    }
}
