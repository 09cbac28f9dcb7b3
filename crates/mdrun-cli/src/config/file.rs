use crate::error::{CliError, Result};
use mdrun::engine::config::{Constraints, NonbondedMethod};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The on-disk run configuration. Every key is optional here; required settings are checked
/// after the command line has been merged in.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub force_fields: Option<Vec<String>>,
    pub data_dir: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub nonbonded_method: Option<NonbondedMethod>,
    pub nonbonded_cutoff: Option<f64>,
    pub constraints: Option<Constraints>,
    pub temperature: Option<f64>,
    pub friction: Option<f64>,
    pub step_size: Option<f64>,
    pub seed: Option<u64>,
    pub checkpoint_steps: Option<u64>,
    pub total_steps: Option<u64>,
    pub minimize_tolerance: Option<f64>,
    pub minimize_max_iterations: Option<usize>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
