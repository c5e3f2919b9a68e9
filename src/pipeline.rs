//! Ordered pass driver.
//!
//! Passes never fail; the only decision the driver makes on its own is the
//! post-verification abort policy (`PipelineConfig::abort_on_errors`).

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::model::Library;
use crate::passes::{ExtractBrokenDeclarations, Verifier, WrapLooseDeclarations};
use crate::transform::{Transformation, transform_library};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{count} error(s) remain after verification")]
    ErrorsRemain { count: usize, library: Box<Library> },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct Pipeline {
    passes: Vec<Box<dyn Transformation>>,
    abort_on_errors: bool,
}

impl Pipeline {
    /// A pipeline without passes that never aborts.
    pub fn empty() -> Self {
        Self {
            passes: Vec::new(),
            abort_on_errors: false,
        }
    }

    /// Loose-declaration wrapping followed by verification, plus broken
    /// declaration extraction when configured.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut pipeline = Self::empty()
            .with_pass(WrapLooseDeclarations::new())
            .with_pass(Verifier::new(config.verify.clone()));
        if config.extract_broken_declarations {
            pipeline = pipeline.with_pass(ExtractBrokenDeclarations::new());
        }
        pipeline.abort_on_errors = config.abort_on_errors;
        pipeline
    }

    pub fn load(config_path: &Path) -> Result<Self, PipelineError> {
        let config = PipelineConfig::load(config_path)?;
        Ok(Self::from_config(&config))
    }

    pub fn with_pass(mut self, pass: impl Transformation + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn abort_on_errors(mut self, abort: bool) -> Self {
        self.abort_on_errors = abort;
        self
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn run(&mut self, library: &Library) -> Result<Library, PipelineError> {
        let mut current = library.clone();
        for pass in &mut self.passes {
            debug!(pass = pass.name(), "running pass");
            current = transform_library(pass.as_mut(), &current);
        }

        // Extracted declarations still count.
        let count = current
            .diagnostics()
            .iter()
            .filter(|attached| attached.diagnostic.is_error())
            .count();
        info!(
            declarations = current.decl_count(),
            broken = current.broken_declarations().len(),
            errors = count,
            "pipeline complete"
        );
        if self.abort_on_errors && count > 0 {
            warn!(count, "aborting: errors remain after verification");
            return Err(PipelineError::ErrorsRemain {
                count,
                library: Box::new(current),
            });
        }
        Ok(current)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
#[path = "tests/pipeline/t_pipeline.rs"]
mod tests;
