use crate::core::io::pdb::PdbError;
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a run. None of them is retried.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read input structure '{path}': {source}", path = path.display())]
    Structure {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("Failed to construct the simulation model: {0}")]
    ModelConstruction(#[source] EngineError),

    #[error("Failed to initialize the simulation state: {0}")]
    Initialization(#[source] EngineError),

    #[error("Failed to restore checkpoint '{path}': {source}", path = path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Simulation failed while stepping: {0}")]
    Stepping(#[source] EngineError),

    #[error("Failed to write final structure '{path}': {source}", path = path.display())]
    FinalWrite {
        path: PathBuf,
        #[source]
        source: PdbError,
    },
}
