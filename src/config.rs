use crate::error::{PredictError, Result};
use log::debug;
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "churnpred.toml";
pub const DEFAULT_MODEL_PATH: &str = "./model/model.bin";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Config {
    /// Read the TOML config.  With no explicit path, `churnpred.toml` in the
    /// working directory is used if it exists and defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let path = explicit.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        match fs::read_to_string(path) {
            Ok(c) => {
                debug!("reading config from {}", path.display());
                toml::from_str(&c)
                    .map_err(|e| PredictError::Config(format!("{}: {}", path.display(), e)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound && explicit.is_none() => {
                debug!("no {}, using defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
            Err(e) => Err(PredictError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    /// A command-line path wins over the config file.
    pub fn model_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map_or_else(|| self.model_path.clone(), Path::to_path_buf)
    }
}
