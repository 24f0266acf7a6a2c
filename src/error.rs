//! Error types for the anofox-ensemble library.

use thiserror::Error;

/// Result type alias for ensemble operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while fitting or applying a forecast ensemble.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// A required column is absent from the forecast table.
    #[error("missing column: \"{0}\"")]
    MissingColumn(String),

    /// A column exists but holds the wrong kind of values.
    #[error("column \"{name}\" must be {expected}")]
    ColumnType { name: String, expected: &'static str },

    /// Two columns share the same name.
    #[error("duplicate column: \"{0}\"")]
    DuplicateColumn(String),

    /// A table's expert columns differ from the roster fixed at the first fit.
    #[error("model roster mismatch: expected {expected:?}, got {got:?}")]
    RosterMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Ensemble has not been fitted yet.
    #[error("ensemble must be fitted before prediction")]
    FitRequired,

    /// Prediction requested for a series with no cached weights.
    #[error("no weights fitted for series \"{0}\"")]
    UnknownSeries(String),

    /// An abstract combination hook was invoked without a concrete rule.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Frequency inference failed.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),
}
