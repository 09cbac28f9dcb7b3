//! The two observers attached to every run.

use crate::engine::error::EngineError;
use crate::engine::simulation::{Reporter, Simulation};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STATE_DATA_HEADER: [&str; 3] = [
    "Step",
    "Potential Energy (kJ/mole)",
    "Temperature (K)",
];

/// Writes one CSV record of step, potential energy and temperature per report, preceded by
/// a header before the first record. Each record is flushed as soon as it is written.
pub struct StateDataReporter<'a> {
    writer: csv::Writer<&'a mut dyn Write>,
    interval: NonZeroU64,
    header_written: bool,
}

impl<'a> StateDataReporter<'a> {
    pub fn new(sink: &'a mut dyn Write, interval: NonZeroU64) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
            interval,
            header_written: false,
        }
    }

    fn write_record(&mut self, record: &[String]) -> Result<(), EngineError> {
        self.writer
            .write_record(record)
            .map_err(|e| EngineError::reporter("state data", e))?;
        self.writer
            .flush()
            .map_err(|e| EngineError::reporter("state data", e))
    }
}

impl Reporter for StateDataReporter<'_> {
    fn name(&self) -> &'static str {
        "state data"
    }

    fn interval(&self) -> NonZeroU64 {
        self.interval
    }

    fn report(&mut self, simulation: &dyn Simulation) -> Result<(), EngineError> {
        if !self.header_written {
            let header: Vec<String> = STATE_DATA_HEADER.iter().map(|s| s.to_string()).collect();
            self.write_record(&header)?;
            self.header_written = true;
        }
        let state = simulation.state()?;
        self.write_record(&[
            state.step.to_string(),
            state.potential_energy.to_string(),
            state.temperature.to_string(),
        ])
    }
}

/// Overwrites a single checkpoint file with the simulation's state at every report.
pub struct CheckpointReporter {
    path: PathBuf,
    interval: NonZeroU64,
}

impl CheckpointReporter {
    pub fn new(path: impl Into<PathBuf>, interval: NonZeroU64) -> Self {
        Self {
            path: path.into(),
            interval,
        }
    }
}

impl Reporter for CheckpointReporter {
    fn name(&self) -> &'static str {
        "checkpoint"
    }

    fn interval(&self) -> NonZeroU64 {
        self.interval
    }

    fn report(&mut self, simulation: &dyn Simulation) -> Result<(), EngineError> {
        replace_file(&self.path, |writer| simulation.save_checkpoint(writer))
            .map_err(|e| EngineError::reporter("checkpoint", e))?;
        debug!(
            step = simulation.current_step(),
            path = %self.path.display(),
            "Checkpoint written"
        );
        Ok(())
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes a complete new file next to `path` and renames it over `path`, so a reader never
/// sees a partially written file.
pub fn replace_file(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<(), EngineError>,
) -> Result<(), EngineError> {
    let tmp = temporary_sibling(path);
    let result = (|| -> Result<(), EngineError> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
