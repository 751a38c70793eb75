use thiserror::Error;

/// Errors returned by the inference core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty batch: {0}")]
    EmptyBatch(&'static str),

    #[error("probability table sums to zero: {0}")]
    NormalizationFailure(String),

    #[error("parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(String),
}

impl InferenceError {
    /// Short, stable tag used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::InvalidCoordinate { .. } => "invalid_coordinate",
            InferenceError::InvalidInput(_) => "invalid_input",
            InferenceError::EmptyBatch(_) => "empty_batch",
            InferenceError::NormalizationFailure(_) => "normalization_failure",
            InferenceError::Parse { .. } => "parse",
            InferenceError::Config(_) => "config",
            InferenceError::Metrics(_) => "metrics",
        }
    }
}

pub type Result<T> = std::result::Result<T, InferenceError>;

/// Rejects NaN/inf for a named numeric field.
pub(crate) fn require_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InferenceError::InvalidInput(format!("{field} must be finite, got {value}")))
    }
}
