use thiserror::Error;

use super::checkpoint::CheckpointError;
use super::config::ConfigError;
use crate::core::forcefield::parameterization::ParameterizationError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::models::system::SystemBuildError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Force field error: {0}")]
    Parameters(#[from] ParamLoadError),

    #[error("Template lookup failed: {0}")]
    MissingTemplate(#[source] ParameterizationError),

    #[error("Missing force field parameters: {0}")]
    MissingParameters(#[source] ParameterizationError),

    #[error("Invalid topology: {0}")]
    Topology(#[from] SystemBuildError),

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid periodic box: {0}")]
    InvalidBox(String),

    #[error("Simulation diverged at step {step}: {reason}")]
    Divergence { step: u64, reason: String },

    #[error("Constraints failed to converge at step {step}")]
    ConstraintFailure { step: u64 },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Reporter '{name}' failed: {source}")]
    Reporter {
        name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParameterizationError> for EngineError {
    fn from(err: ParameterizationError) -> Self {
        match err {
            ParameterizationError::MissingTemplate { .. }
            | ParameterizationError::MissingTemplateAtom { .. } => Self::MissingTemplate(err),
            ParameterizationError::MissingBondParameters { .. }
            | ParameterizationError::MissingAngleParameters { .. } => Self::MissingParameters(err),
        }
    }
}

impl EngineError {
    pub fn reporter(
        name: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Reporter {
            name,
            source: source.into(),
        }
    }
}
