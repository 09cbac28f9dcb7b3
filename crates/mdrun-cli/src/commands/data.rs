use crate::cli::{DataArgs, DataCommands};
use crate::data::DataManager;
use crate::error::Result;
use tracing::info;

pub fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::Path => handle_path(),
    }
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    info!("Reporting data path {:?}", manager.get_data_path());
    println!("{}", manager.get_data_path().display());
    println!(
        "Named force fields are looked up in: {}",
        manager.forcefield_dir().display()
    );
    Ok(())
}
