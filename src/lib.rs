//! Single-row churn prediction from a serialized model artifact.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod utils;

pub use artifact::{Label, ModelArtifact, Predictor};
pub use config::Config;
pub use error::{PredictError, Result};
pub use features::{Category, Row, FEATURE_NAMES, NUM_FEATURES};

use log::debug;
use serde_derive::Serialize;
use serde_json::Value;

pub fn predict_json<P: Predictor + ?Sized>(model: &P, input: &str) -> Result<Label> {
    let values = features::parse_feature_vector(input)?;
    predict_values(model, &values)
}

pub fn predict_values<P: Predictor + ?Sized>(model: &P, values: &[Value]) -> Result<Label> {
    let row = Row::from_values(values)?;
    debug!("row: {:?}", row);
    model.predict(&row)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChurnStatus {
    Stay,
    Leave,
}

impl ChurnStatus {
    /// Label 0 means the customer stays; anything else means they leave.
    pub fn from_label(label: &Label) -> ChurnStatus {
        match label {
            Label::Int(0) => ChurnStatus::Stay,
            Label::Text(s) if s == "0" => ChurnStatus::Stay,
            _ => ChurnStatus::Leave,
        }
    }
}
