//! The collaborator traits the run controller is written against.

use super::config::{IntegratorConfig, MinimizationOptions, NonbondedPolicy};
use super::error::EngineError;
use super::minimize::MinimizationSummary;
use super::progress::{Progress, ProgressReporter};
use super::state::StateSnapshot;
use crate::core::forcefield::library::ForceFieldId;
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::io::{Read, Write};
use std::num::NonZeroU64;
use tracing::trace;

/// An observer invoked by [`Simulation::step`] whenever the absolute step counter reaches a
/// multiple of its interval.
pub trait Reporter {
    fn name(&self) -> &'static str;

    fn interval(&self) -> NonZeroU64;

    fn report(&mut self, simulation: &dyn Simulation) -> Result<(), EngineError>;
}

/// A live, steppable model of a molecular system.
pub trait Simulation {
    /// Number of integration steps taken since the state was created or restored.
    fn current_step(&self) -> u64;

    /// The system being simulated, including any bonds added during model construction.
    fn topology(&self) -> &MolecularSystem;

    fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), EngineError>;

    fn minimize_energy(
        &mut self,
        options: &MinimizationOptions,
    ) -> Result<MinimizationSummary, EngineError>;

    /// Integrates exactly `steps` steps without invoking any observer.
    fn advance(&mut self, steps: u64) -> Result<(), EngineError>;

    fn state(&self) -> Result<StateSnapshot, EngineError>;

    fn save_checkpoint(&self, writer: &mut dyn Write) -> Result<(), EngineError>;

    /// Replaces the live state (step counter included) with a saved one.
    fn load_checkpoint(&mut self, reader: &mut dyn Read) -> Result<(), EngineError>;

    /// Advances `steps` steps, stopping at every reporter boundary to invoke the reporters
    /// that are due, in the order given.
    ///
    /// Boundaries are absolute: a reporter with interval `k` runs whenever the step counter
    /// becomes a multiple of `k`, regardless of where this call started. A reporter for step
    /// `N` therefore always observes the state at exactly step `N`. The first error stops
    /// stepping.
    fn step(
        &mut self,
        steps: u64,
        reporters: &mut [Box<dyn Reporter + '_>],
        progress: &ProgressReporter,
    ) -> Result<(), EngineError>
    where
        Self: Sized,
    {
        step_with_reporters(self, steps, reporters, progress)
    }
}

/// Constructs a [`Simulation`] from a structure and the run's physical settings.
pub trait ModelBuilder {
    type Simulation: Simulation;

    fn build(
        &self,
        structure: &MolecularSystem,
        force_fields: &[ForceFieldId],
        nonbonded: &NonbondedPolicy,
        integrator: &IntegratorConfig,
    ) -> Result<Self::Simulation, EngineError>;
}

fn next_boundary(step: u64, interval: NonZeroU64) -> u64 {
    let interval = interval.get();
    (step / interval).saturating_add(1).saturating_mul(interval)
}

/// The stepping loop behind [`Simulation::step`], usable with trait objects.
pub fn step_with_reporters(
    simulation: &mut dyn Simulation,
    steps: u64,
    reporters: &mut [Box<dyn Reporter + '_>],
    progress: &ProgressReporter,
) -> Result<(), EngineError> {
    let start = simulation.current_step();
    let target = start.saturating_add(steps);
    let mut current = start;

    progress.report(Progress::TaskStart { total_steps: steps });
    while current < target {
        let next = reporters
            .iter()
            .map(|r| next_boundary(current, r.interval()))
            .min()
            .unwrap_or(target)
            .min(target);

        simulation.advance(next - current)?;
        progress.report(Progress::TaskIncrement {
            amount: next - current,
        });
        current = next;

        for reporter in reporters.iter_mut() {
            if current % reporter.interval().get() == 0 {
                trace!(step = current, reporter = reporter.name(), "Invoking reporter");
                reporter.report(&*simulation)?;
            }
        }
    }
    progress.report(Progress::TaskFinish);
    Ok(())
}
