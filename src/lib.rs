//! chartcalc - bucket records by field and compute chart-ready series.
//!
//! A [`Calculator`] groups the records of a [`RecordStore`] by the value of
//! one field, keeping buckets in first-seen order, and reduces every bucket
//! to one number (a count or the sum of a numeric attribute). The result is
//! a [`ChartData`] with one category per bucket and a single series named
//! after the field.
//!
//! ```
//! use chartcalc::{Calculator, CalculatorConfig, InMemoryStore};
//!
//! let store = InMemoryStore::from_json_str(
//!     r#"[{ "Priority": "P1", "PlanEstimate": 2 }, { "Priority": "P2", "PlanEstimate": 3 }]"#,
//! )?;
//! let calculator = Calculator::from_config(&CalculatorConfig {
//!     field: "Priority".to_string(),
//!     calculation_type: "estimate".to_string(),
//!     empty_label_overrides: None,
//! })?;
//!
//! let chart = calculator.prepare_chart_data(&store)?;
//! assert_eq!(chart.categories, vec!["P1", "P2"]);
//! # Ok::<(), chartcalc::CalculatorError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod models;
pub mod report;
pub mod store;

pub use analysis::{Aggregation, CalculationType, Calculator, CalculatorConfig};
pub use error::{CalculatorError, Result};
pub use models::{
    ChartData, EmptyLabels, FieldKind, FieldSpec, FieldValue, Record, Series, SeriesPoint,
};
pub use store::{FieldCatalog, InMemoryStore, RecordStore};
