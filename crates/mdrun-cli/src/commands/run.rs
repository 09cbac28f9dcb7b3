use crate::cli::RunArgs;
use crate::config::{self, AppConfig};
use crate::data::DataManager;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdrun::engine::progress::ProgressReporter;
use mdrun::engine::reference::ReferenceBuilder;
use mdrun::workflows::{self, run::StartMode};
use std::io;
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    info!("Initializing data manager...");
    let data_manager = DataManager::new()?;

    info!("Merging configuration from file and CLI arguments...");
    let AppConfig {
        simulation,
        library,
    } = config::build_config(&args, &data_manager)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let builder = ReferenceBuilder::new(library);

    info!("Invoking the run workflow...");
    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let artifact = workflows::run::run(&simulation, &builder, &mut sink, &reporter)?;

    let how = match artifact.start_mode {
        StartMode::ColdStart => "started fresh",
        StartMode::Resumed => "resumed from checkpoint",
    };
    eprintln!(
        "✓ Simulation {} and reached step {} ({} steps this run). Final structure written to: {}",
        how,
        artifact.step,
        artifact.steps_executed,
        artifact.path.display()
    );

    Ok(())
}
