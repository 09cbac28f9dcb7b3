use super::error::RunError;
use super::reporters::{CheckpointReporter, StateDataReporter};
use crate::core::forcefield::library::ForceFieldId;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::MolecularSystem;
use crate::core::units::{InversePicoseconds, Kelvin, Nanometers, Picoseconds};
use crate::engine::config::{
    ConfigError, Constraints, IntegratorConfig, MinimizationOptions, NonbondedMethod,
    NonbondedPolicy,
};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::{ModelBuilder, Reporter, Simulation};
use std::fs::File;
use std::io::{BufReader, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const DEFAULT_CHECKPOINT_PATH: &str = "checkpoint.chk";
pub const DEFAULT_OUTPUT_PATH: &str = "final_state.pdb";

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub input_structure: PathBuf,
    pub force_fields: Vec<ForceFieldId>,
    pub nonbonded: NonbondedPolicy,
    pub integrator: IntegratorConfig,
    pub checkpoint_interval: NonZeroU64,
    pub total_steps: u64,
    pub checkpoint_path: PathBuf,
    pub output_path: PathBuf,
    pub minimization: MinimizationOptions,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.force_fields.is_empty() {
            return Err(ConfigError::MissingParameter("force_fields"));
        }
        self.minimization.validate()
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    input_structure: Option<PathBuf>,
    force_fields: Vec<ForceFieldId>,
    nonbonded_method: Option<NonbondedMethod>,
    nonbonded_cutoff: Option<f64>,
    constraints: Option<Constraints>,
    temperature: Option<f64>,
    friction: Option<f64>,
    step_size: Option<f64>,
    seed: Option<u64>,
    checkpoint_interval: Option<u64>,
    total_steps: Option<u64>,
    checkpoint_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    minimization: Option<MinimizationOptions>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_structure(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_structure = Some(path.into());
        self
    }
    pub fn force_field(mut self, id: impl Into<ForceFieldId>) -> Self {
        self.force_fields.push(id.into());
        self
    }
    pub fn force_fields(mut self, ids: impl IntoIterator<Item = ForceFieldId>) -> Self {
        self.force_fields.extend(ids);
        self
    }
    pub fn nonbonded_method(mut self, method: NonbondedMethod) -> Self {
        self.nonbonded_method = Some(method);
        self
    }
    pub fn nonbonded_cutoff(mut self, nanometers: f64) -> Self {
        self.nonbonded_cutoff = Some(nanometers);
        self
    }
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn friction(mut self, per_picosecond: f64) -> Self {
        self.friction = Some(per_picosecond);
        self
    }
    pub fn step_size(mut self, picoseconds: f64) -> Self {
        self.step_size = Some(picoseconds);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn checkpoint_interval(mut self, steps: u64) -> Self {
        self.checkpoint_interval = Some(steps);
        self
    }
    pub fn total_steps(mut self, steps: u64) -> Self {
        self.total_steps = Some(steps);
        self
    }
    pub fn checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = Some(path.into());
        self
    }
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
    pub fn minimization(mut self, options: MinimizationOptions) -> Self {
        self.minimization = Some(options);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let nonbonded = NonbondedPolicy {
            method: self.nonbonded_method,
            cutoff: Nanometers::new(
                self.nonbonded_cutoff
                    .ok_or(ConfigError::MissingParameter("nonbonded_cutoff"))?,
            )?,
            constraints: self.constraints.unwrap_or_default(),
        };
        let integrator = IntegratorConfig {
            temperature: Kelvin::new(
                self.temperature
                    .ok_or(ConfigError::MissingParameter("temperature"))?,
            )?,
            friction: InversePicoseconds::new(
                self.friction.ok_or(ConfigError::MissingParameter("friction"))?,
            )?,
            step_size: Picoseconds::new(
                self.step_size
                    .ok_or(ConfigError::MissingParameter("step_size"))?,
            )?,
            seed: self.seed,
        };
        let interval = self
            .checkpoint_interval
            .ok_or(ConfigError::MissingParameter("checkpoint_interval"))?;
        let checkpoint_interval =
            NonZeroU64::new(interval).ok_or_else(|| ConfigError::InvalidValue {
                parameter: "checkpoint_interval",
                reason: "must be at least 1 step".to_string(),
            })?;

        let config = SimulationConfig {
            input_structure: self
                .input_structure
                .ok_or(ConfigError::MissingParameter("input_structure"))?,
            force_fields: self.force_fields,
            nonbonded,
            integrator,
            checkpoint_interval,
            total_steps: self
                .total_steps
                .ok_or(ConfigError::MissingParameter("total_steps"))?,
            checkpoint_path: self
                .checkpoint_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_PATH)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            minimization: self.minimization.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// How a run obtains its initial state. Decided once, before any stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// No checkpoint exists: positions come from the structure and are minimized.
    ColdStart,
    /// A checkpoint exists and is restored, step counter included.
    Resumed,
}

impl StartMode {
    pub fn detect(checkpoint_path: &Path) -> Self {
        if checkpoint_path.exists() {
            Self::Resumed
        } else {
            Self::ColdStart
        }
    }
}

/// The result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalArtifact {
    pub path: PathBuf,
    /// Step at which the final structure was taken.
    pub step: u64,
    pub start_mode: StartMode,
    /// Steps executed by this invocation.
    pub steps_executed: u64,
    pub atom_count: usize,
}

/// Steps still to run; a checkpoint at or beyond the target leaves nothing to do.
pub fn remaining_steps(total: u64, completed: u64) -> u64 {
    total.saturating_sub(completed)
}

/// Brings a freshly built simulation to its starting state and returns the number of steps
/// already completed.
pub fn initialize<S: Simulation + ?Sized>(
    simulation: &mut S,
    mode: StartMode,
    structure: &MolecularSystem,
    config: &SimulationConfig,
) -> Result<u64, RunError> {
    match mode {
        StartMode::Resumed => {
            let checkpoint_error = |source: EngineError| RunError::Checkpoint {
                path: config.checkpoint_path.clone(),
                source,
            };
            let file = File::open(&config.checkpoint_path)
                .map_err(|e| checkpoint_error(EngineError::Io(e)))?;
            simulation
                .load_checkpoint(&mut BufReader::new(file))
                .map_err(checkpoint_error)?;
            Ok(simulation.current_step())
        }
        StartMode::ColdStart => {
            simulation
                .set_positions(&structure.positions())
                .map_err(RunError::Initialization)?;
            let summary = simulation
                .minimize_energy(&config.minimization)
                .map_err(RunError::Initialization)?;
            info!(
                iterations = summary.iterations,
                initial_energy = summary.initial_energy,
                final_energy = summary.final_energy,
                converged = summary.converged,
                "Energy minimization complete"
            );
            Ok(0)
        }
    }
}

/// Writes the simulation's topology with its current positions as PDB, replacing `path`.
pub fn write_final_structure(simulation: &dyn Simulation, path: &Path) -> Result<(), RunError> {
    let state = simulation.state().map_err(RunError::Stepping)?;
    let system = simulation
        .topology()
        .with_positions(&state.positions)
        .map_err(|e| RunError::Stepping(e.into()))?;
    PdbFile::write_to_path(&system, path).map_err(|source| RunError::FinalWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs a simulation to `config.total_steps`, resuming from the checkpoint when one exists.
///
/// State data lines go to `sink`; the checkpoint file is overwritten every
/// `config.checkpoint_interval` steps, and the final structure is written once after the last
/// step.
#[instrument(skip_all, name = "run_workflow")]
pub fn run<B: ModelBuilder>(
    config: &SimulationConfig,
    builder: &B,
    sink: &mut dyn Write,
    progress: &ProgressReporter,
) -> Result<FinalArtifact, RunError> {
    config.validate()?;

    let structure = progress.phase("Loading structure", || {
        PdbFile::read_from_path(&config.input_structure).map_err(|source| RunError::Structure {
            path: config.input_structure.clone(),
            source,
        })
    })?;
    info!(
        path = %config.input_structure.display(),
        atoms = structure.atom_count(),
        periodic = structure.unit_cell().is_some(),
        "Loaded input structure"
    );

    let mut simulation = progress.phase("Building model", || {
        builder
            .build(
                &structure,
                &config.force_fields,
                &config.nonbonded,
                &config.integrator,
            )
            .map_err(RunError::ModelConstruction)
    })?;

    let mode = StartMode::detect(&config.checkpoint_path);
    let (phase, announcement) = match mode {
        StartMode::Resumed => {
            info!(path = %config.checkpoint_path.display(), "Resuming simulation from checkpoint");
            (
                "Restoring checkpoint",
                format!(
                    "Resuming simulation from checkpoint: {}",
                    config.checkpoint_path.display()
                ),
            )
        }
        StartMode::ColdStart => {
            info!("Starting new simulation");
            ("Minimizing energy", "Starting new simulation".to_string())
        }
    };
    progress.report(Progress::Message(announcement));
    let completed = progress.phase(phase, || {
        initialize(&mut simulation, mode, &structure, config)
    })?;

    let remaining = remaining_steps(config.total_steps, completed);
    if completed > config.total_steps {
        warn!(
            completed,
            total = config.total_steps,
            "Checkpoint is beyond the requested total; no steps to run"
        );
    }
    info!(completed, remaining, "Running simulation for {} steps", remaining);
    progress.report(Progress::Message(format!(
        "Running simulation for {} steps",
        remaining
    )));

    {
        let mut reporters: Vec<Box<dyn Reporter + '_>> = vec![
            Box::new(StateDataReporter::new(sink, config.checkpoint_interval)),
            Box::new(CheckpointReporter::new(
                config.checkpoint_path.clone(),
                config.checkpoint_interval,
            )),
        ];
        progress.phase("Running dynamics", || {
            simulation
                .step(remaining, &mut reporters, progress)
                .map_err(RunError::Stepping)
        })?;
    }

    progress.phase("Writing final structure", || {
        write_final_structure(&simulation, &config.output_path)
    })?;

    let step = simulation.current_step();
    let artifact = FinalArtifact {
        path: config.output_path.clone(),
        step,
        start_mode: mode,
        steps_executed: step.saturating_sub(completed),
        atom_count: structure.atom_count(),
    };
    info!(
        path = %artifact.path.display(),
        step = artifact.step,
        steps_executed = artifact.steps_executed,
        "Run complete"
    );
    Ok(artifact)
}
