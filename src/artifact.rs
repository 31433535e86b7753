//! The serialized model artifact the invoker loads from disk.

use crate::classifier::Estimator;
use crate::encoder::{encode_row, CategoryEncoder, StandardScaler};
use crate::error::{PredictError, Result};
use crate::features::{ColumnType, Row, COLUMN_TYPES, FEATURE_NAMES};
use crate::utils::{self, Encoding, FileFormat};
use bincode::{Decode, Encode};
use bytesize::ByteSize;
use log::debug;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on decoded artifact size, so a corrupt length prefix fails
/// instead of allocating.
const MAX_ARTIFACT_BYTES: usize = 256 * 1024 * 1024;

fn bincode_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_ARTIFACT_BYTES>()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Text(s) => write!(f, "{}", s),
        }
    }
}

pub trait Predictor {
    fn predict(&self, row: &Row) -> Result<Label>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub classes: Vec<Label>,
    pub encoders: BTreeMap<String, CategoryEncoder>,
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    pub fn new(
        classes: Vec<Label>,
        encoders: BTreeMap<String, CategoryEncoder>,
        scaler: Option<StandardScaler>,
        estimator: Estimator,
    ) -> ModelArtifact {
        ModelArtifact {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            classes,
            encoders,
            scaler,
            estimator,
        }
    }

    pub fn load(path: &Path) -> Result<ModelArtifact> {
        let t0 = Instant::now();
        let format = FileFormat::from_path(path);
        let size = fs::metadata(path)
            .map_err(|e| PredictError::model_load(path, e))?
            .len();
        let mut infp = utils::reader(path).map_err(|e| PredictError::model_load(path, e))?;
        let artifact: ModelArtifact = match format.encoding {
            Encoding::Bincode => bincode::decode_from_std_read(&mut infp, bincode_config())
                .map_err(|e| PredictError::model_load(path, e))?,
            Encoding::Json => {
                serde_json::from_reader(&mut infp).map_err(|e| PredictError::model_load(path, e))?
            }
        };
        artifact
            .validate()
            .map_err(|e| PredictError::model_load(path, e))?;
        debug!(
            "loaded {} model from {} ({:?}, {}) in {:?}",
            artifact.estimator.kind(),
            path.display(),
            format,
            ByteSize::b(size),
            t0.elapsed()
        );
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = match FileFormat::from_path(path).encoding {
            Encoding::Bincode => bincode::encode_to_vec(self, bincode_config())
                .map_err(|e| PredictError::model_load(path, e))?,
            Encoding::Json => {
                serde_json::to_vec_pretty(self).map_err(|e| PredictError::model_load(path, e))?
            }
        };
        utils::write_all(path, &bytes).map_err(|e| PredictError::model_load(path, e))?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Check that the artifact fits the fixed columns and is internally
    /// consistent, so scoring cannot index out of bounds.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            ));
        }
        if self.feature_names != FEATURE_NAMES {
            return Err(format!(
                "model was fitted on columns [{}], expected [{}]",
                self.feature_names.join(", "),
                FEATURE_NAMES.join(", ")
            ));
        }
        if self.classes.len() < 2 {
            return Err(format!("model has {} classes", self.classes.len()));
        }
        for (name, kind) in FEATURE_NAMES.iter().zip(COLUMN_TYPES) {
            let encoder = self.encoders.get(*name);
            match (kind, encoder) {
                (ColumnType::Categorical, None) => {
                    return Err(format!("no encoder for column {}", name));
                }
                (ColumnType::Categorical, Some(enc)) if enc.categories().is_empty() => {
                    return Err(format!("encoder for column {} has no categories", name));
                }
                (ColumnType::Categorical, Some(_)) => {}
                (_, Some(_)) => return Err(format!("column {} is not categorical", name)),
                (_, None) => {}
            }
        }
        if let Some(name) = self
            .encoders
            .keys()
            .find(|k| !FEATURE_NAMES.contains(&k.as_str()))
        {
            return Err(format!("encoder for unknown column {}", name));
        }
        let width = self.width();
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != width || scaler.scale.len() != width {
                return Err(format!(
                    "scaler covers {} slots, encoded width is {}",
                    scaler.mean.len().min(scaler.scale.len()),
                    width
                ));
            }
            if scaler.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err("scaler has a zero or non-finite scale".to_string());
            }
            if scaler.mean.iter().any(|m| !m.is_finite()) {
                return Err("scaler has a non-finite mean".to_string());
            }
        }
        self.estimator.validate(width, self.classes.len())
    }

    pub fn width(&self) -> usize {
        FEATURE_NAMES
            .iter()
            .map(|name| self.encoders.get(*name).map_or(1, |e| e.width()))
            .sum()
    }

    pub fn slot_names(&self) -> Vec<String> {
        FEATURE_NAMES
            .iter()
            .flat_map(|name| match self.encoders.get(*name) {
                Some(enc) => enc.slot_names(name),
                None => vec![name.to_string()],
            })
            .collect()
    }

    pub fn encode(&self, row: &Row) -> Result<Vec<f64>> {
        let mut x = encode_row(row, |column| self.encoders.get(column))?;
        if let Some(scaler) = &self.scaler {
            scaler.transform(&mut x);
        }
        Ok(x)
    }
}

impl Predictor for ModelArtifact {
    fn predict(&self, row: &Row) -> Result<Label> {
        let x = self.encode(row)?;
        debug!("encoded row: {:?}", x);
        let idx = self.estimator.class_index(&x, self.classes.len())?;
        self.classes.get(idx).cloned().ok_or_else(|| {
            PredictError::Prediction(format!("estimator returned class index {}", idx))
        })
    }
}
