use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictError>;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No input data provided.")]
    NoInput,

    #[error("could not parse input JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected {expected} features, got {actual}.")]
    FeatureCount { expected: usize, actual: usize },

    #[error("missing feature {0}")]
    MissingFeature(String),

    #[error("cannot convert {value} to {expected} for column {column}")]
    Coercion {
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("could not load model from {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("model error: {0}")]
    Prediction(String),

    #[error("config error: {0}")]
    Config(String),
}

impl PredictError {
    pub fn model_load(path: &Path, reason: impl ToString) -> PredictError {
        PredictError::ModelLoad {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller's feature values rather than
    /// the model or the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictError::NoInput
                | PredictError::Parse(_)
                | PredictError::FeatureCount { .. }
                | PredictError::MissingFeature(_)
                | PredictError::Coercion { .. }
        )
    }

    pub fn diagnostic(&self) -> String {
        match self {
            PredictError::NoInput | PredictError::FeatureCount { .. } => format!("Error: {}", self),
            _ => format!("Prediction failed: {}", self),
        }
    }
}
