use mdrun::engine::config::{Constraints, MinimizationOptions};
use mdrun::workflows::run::{DEFAULT_CHECKPOINT_PATH, DEFAULT_OUTPUT_PATH};
use std::path::PathBuf;

/// Values used for optional settings that neither the command line nor the file provides.
pub struct DefaultsConfig {
    pub checkpoint: PathBuf,
    pub output: PathBuf,
    pub constraints: Constraints,
    pub minimize_tolerance: f64,
    pub minimize_max_iterations: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            checkpoint: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            constraints: Constraints::HBonds,
            minimize_tolerance: MinimizationOptions::DEFAULT_TOLERANCE,
            minimize_max_iterations: MinimizationOptions::DEFAULT_MAX_ITERATIONS,
        }
    }
}
