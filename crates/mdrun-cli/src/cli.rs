use clap::{Args, Parser, Subcommand};
use mdrun::engine::config::{Constraints, NonbondedMethod};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "mdrun developers",
    version,
    about = "mdrun - A resumable molecular dynamics driver. Runs a Langevin simulation to a target step count, checkpointing as it goes, and picks up from the last checkpoint when restarted.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for force evaluation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run (or resume) a simulation until the requested total step count is reached.
    Run(RunArgs),
    /// Print the step, time and atom count stored in a checkpoint file.
    Inspect(InspectArgs),
    /// Show where named force-field files are looked up.
    Data(DataArgs),
}

/// Arguments for the `run` subcommand.
///
/// Every simulation parameter may also come from the `--config` file; values given here
/// take precedence.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    // --- Inputs ---
    /// Path to the input structure (PDB).
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Force-field files, given as paths or as names found in the data directory.
    #[arg(short = 'f', long, value_name = "ID", num_args(1..))]
    pub force_fields: Vec<String>,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Additional directory searched for named force fields.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    // --- Outputs ---
    /// Checkpoint file, overwritten at every checkpoint interval [default: checkpoint.chk]
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Final structure file (PDB) [default: final_state.pdb]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Model ---
    /// Nonbonded method: no-cutoff, cutoff-non-periodic or cutoff-periodic.
    /// Defaults to cutoff-periodic when the structure has a unit cell.
    #[arg(long, value_name = "METHOD")]
    pub nonbonded_method: Option<NonbondedMethod>,

    /// Nonbonded cutoff distance in nm.
    #[arg(long, value_name = "NM")]
    pub nonbonded_cutoff: Option<f64>,

    /// Bond constraints: none or h-bonds [default: h-bonds]
    #[arg(long, value_name = "KIND")]
    pub constraints: Option<Constraints>,

    // --- Integrator ---
    /// Thermostat temperature in K.
    #[arg(short, long, value_name = "K")]
    pub temperature: Option<f64>,

    /// Langevin friction coefficient in 1/ps.
    #[arg(long, value_name = "PER_PS")]
    pub friction: Option<f64>,

    /// Integration step size in ps.
    #[arg(long, value_name = "PS")]
    pub step_size: Option<f64>,

    /// Seed for the thermostat's random stream.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    // --- Schedule ---
    /// Steps between state reports and checkpoint writes.
    #[arg(long, value_name = "N")]
    pub checkpoint_steps: Option<u64>,

    /// Total number of steps the simulation should reach.
    #[arg(short = 'n', long, value_name = "N")]
    pub total_steps: Option<u64>,

    // --- Minimization ---
    /// Minimization convergence tolerance in kJ/mol/nm [default: 10]
    #[arg(long, value_name = "FLOAT")]
    pub minimize_tolerance: Option<f64>,

    /// Maximum number of minimization iterations [default: 10000]
    #[arg(long, value_name = "INT")]
    pub minimize_max_iterations: Option<usize>,

    /// Set a configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S total-steps=50000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the checkpoint file.
    #[arg(required = true, value_name = "CHECKPOINT")]
    pub checkpoint: PathBuf,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Show the absolute path to the local data directory.
    Path,
}
