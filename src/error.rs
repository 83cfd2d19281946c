//! Error types for the calculator.
//!
//! Configuration problems abort an aggregation before any chart data is
//! produced. Malformed numeric values inside records are not errors; see
//! [`crate::models::DataShapeWarning`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Unknown calculation type: '{0}'")]
    UnknownCalculationType(String),

    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Field '{0}' is not described by the record store")]
    UnknownField(String),

    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Invalid empty-label override '{0}', expected FIELD=LABEL")]
    InvalidLabelOverride(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalculatorError {
    /// Whether this error comes from caller configuration rather than input data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CalculatorError::UnknownCalculationType(_)
                | CalculatorError::EmptyFieldName
                | CalculatorError::UnknownField(_)
                | CalculatorError::InvalidLabelOverride(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CalculatorError>;
