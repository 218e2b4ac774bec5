//! Error types for model evaluation and ensembling

use thiserror::Error;

/// Result type alias for modelbench operations
pub type Result<T> = std::result::Result<T, ModelBenchError>;

/// Main error type
#[derive(Error, Debug)]
pub enum ModelBenchError {
    /// Row or column counts disagree between features and targets,
    /// or between the train and test schemas.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A regressor could not be fitted on the data it was given.
    #[error("Fit failure in '{model}': {reason}")]
    FitFailure { model: String, reason: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ModelBenchError {
    /// Shorthand for a dimension mismatch built from anything displayable.
    pub fn dimension_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        ModelBenchError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Wrap an arbitrary error raised while fitting or scoring `model`.
    ///
    /// Configuration errors are returned unchanged so they stay fatal.
    pub fn fit_failure(model: impl Into<String>, source: &ModelBenchError) -> Self {
        match source {
            ModelBenchError::ConfigError(message) => ModelBenchError::ConfigError(message.clone()),
            // already attributed to a (nested) model
            ModelBenchError::FitFailure { model, reason } => ModelBenchError::FitFailure {
                model: model.clone(),
                reason: reason.clone(),
            },
            other => ModelBenchError::FitFailure {
                model: model.into(),
                reason: other.to_string(),
            },
        }
    }

    /// Errors that indicate a caller bug and must abort a batch run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ModelBenchError::DimensionMismatch { .. } | ModelBenchError::ConfigError(_)
        )
    }
}

impl From<polars::error::PolarsError> for ModelBenchError {
    fn from(err: polars::error::PolarsError) -> Self {
        ModelBenchError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ModelBenchError {
    fn from(err: serde_json::Error) -> Self {
        ModelBenchError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ModelBenchError {
    fn from(err: ndarray::ShapeError) -> Self {
        ModelBenchError::DimensionMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
