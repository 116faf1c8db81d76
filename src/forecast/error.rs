// src/forecast/error.rs

/// Failures surfaced by training and inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// `train` was called with no records.
    EmptyTrainingSet,
    /// A record is missing a required field or carries an unusable value.
    InvalidFeature { field: &'static str, reason: String },
    /// A deserialized model whose scaler or trees are inconsistent.
    MalformedModel(String),
}

impl ForecastError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ForecastError::InvalidFeature {
            field,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::EmptyTrainingSet => {
                write!(f, "Cannot train a revenue model on an empty training set")
            }
            ForecastError::InvalidFeature { field, reason } => {
                write!(f, "Invalid feature '{}': {}", field, reason)
            }
            ForecastError::MalformedModel(reason) => write!(f, "Malformed model: {}", reason),
        }
    }
}

impl std::error::Error for ForecastError {}
