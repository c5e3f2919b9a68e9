//! Pipeline configuration.
//!
//! Configuration is plain data deserialized from JSON; every field has a
//! default so an empty object (`{}`) is a valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::CallingConvention;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Calling convention functions are expected to use. Any other native or
    /// effective convention is reported as possibly mishandled.
    pub default_calling_convention: CallingConvention,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            default_calling_convention: CallingConvention::C,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Fail the run when any declaration still carries an Error after the
    /// last pass.
    pub abort_on_errors: bool,
    /// Lift declarations carrying Errors out of the tree after verification.
    pub extract_broken_declarations: bool,
    pub verify: VerifyConfig,
}

impl PipelineConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_json(&source)
    }
}

#[cfg(test)]
#[path = "tests/config/t_config.rs"]
mod tests;
