//! Error types for the prepayment analyzer
//!
//! Only structural problems are errors. Numerical trouble inside a single
//! scenario (non-convergent IRR, non-representable term) is carried in that
//! scenario's result fields instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Invalid loan record: {0}")]
    InvalidRecord(String),

    #[error("Date error: {0}")]
    Date(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
