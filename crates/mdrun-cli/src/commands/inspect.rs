use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use mdrun::engine::checkpoint::Checkpoint;
use std::io::{self, Write};

pub fn run(args: InspectArgs) -> Result<()> {
    let checkpoint =
        Checkpoint::read_from_path(&args.checkpoint).map_err(|e| CliError::FileParsing {
            path: args.checkpoint.clone(),
            source: e.into(),
        })?;
    describe(&checkpoint, &mut io::stdout().lock())?;
    Ok(())
}

fn describe(checkpoint: &Checkpoint, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Step:      {}", checkpoint.step)?;
    writeln!(out, "Time:      {:.6} ps", checkpoint.time)?;
    writeln!(out, "Atoms:     {}", checkpoint.atom_count)?;
    match checkpoint.box_lengths {
        Some([a, b, c]) => writeln!(out, "Box:       {:.4} x {:.4} x {:.4} nm", a, b, c),
        None => writeln!(out, "Box:       none (non-periodic)"),
    }
}
