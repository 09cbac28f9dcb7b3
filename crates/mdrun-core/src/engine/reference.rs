use super::checkpoint::Checkpoint;
use super::config::{Constraints, IntegratorConfig, MinimizationOptions, NonbondedPolicy};
use super::constraints::ConstraintSet;
use super::context::Context;
use super::error::EngineError;
use super::forces::ForceModel;
use super::integrator::LangevinMiddleIntegrator;
use super::minimize::MinimizationSummary;
use super::simulation::{ModelBuilder, Simulation};
use super::state::StateSnapshot;
use crate::core::forcefield::library::{ForceFieldId, ForcefieldLibrary};
use crate::core::forcefield::parameterization::Parameterizer;
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::io::{Read, Write};
use tracing::{debug, info};

/// Builds [`ReferenceSimulation`]s, resolving force-field identifiers through a library.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBuilder {
    library: ForcefieldLibrary,
}

impl ReferenceBuilder {
    pub fn new(library: ForcefieldLibrary) -> Self {
        Self { library }
    }
}

impl ModelBuilder for ReferenceBuilder {
    type Simulation = ReferenceSimulation;

    fn build(
        &self,
        structure: &MolecularSystem,
        force_fields: &[ForceFieldId],
        nonbonded: &NonbondedPolicy,
        integrator: &IntegratorConfig,
    ) -> Result<ReferenceSimulation, EngineError> {
        let forcefield = self.library.load(force_fields)?;
        let model = Parameterizer::new(&forcefield).parameterize(structure)?;

        let method = nonbonded.method_for(structure);
        let forces = ForceModel::new(&model, method, nonbonded.cutoff, nonbonded.constraints)?;
        let constraints = match nonbonded.constraints {
            Constraints::HBonds => ConstraintSet::hydrogen_bonds(&model),
            Constraints::None => ConstraintSet::default(),
        };
        let masses = model.atoms.iter().map(|a| a.mass).collect();

        info!(
            atoms = model.atoms.len(),
            bonds = model.bonds.len(),
            angles = model.angles.len(),
            constraints = constraints.len(),
            method = %method,
            cutoff = %nonbonded.cutoff,
            "Built reference model"
        );

        let context = Context::new(
            model.topology,
            forces,
            constraints,
            LangevinMiddleIntegrator::new(integrator),
            masses,
        );
        Ok(ReferenceSimulation { context })
    }
}

/// A CPU simulation of a classical force field with Langevin dynamics.
#[derive(Debug, Clone)]
pub struct ReferenceSimulation {
    context: Context,
}

impl ReferenceSimulation {
    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl Simulation for ReferenceSimulation {
    fn current_step(&self) -> u64 {
        self.context.step()
    }

    fn topology(&self) -> &MolecularSystem {
        self.context.topology()
    }

    fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), EngineError> {
        self.context.set_positions(positions)
    }

    fn minimize_energy(
        &mut self,
        options: &MinimizationOptions,
    ) -> Result<MinimizationSummary, EngineError> {
        self.context.minimize(options)
    }

    fn advance(&mut self, steps: u64) -> Result<(), EngineError> {
        self.context.integrate(steps)
    }

    fn state(&self) -> Result<StateSnapshot, EngineError> {
        Ok(self.context.snapshot())
    }

    fn save_checkpoint(&self, writer: &mut dyn Write) -> Result<(), EngineError> {
        self.context.checkpoint().write_to(writer)?;
        Ok(())
    }

    fn load_checkpoint(&mut self, reader: &mut dyn Read) -> Result<(), EngineError> {
        let checkpoint = Checkpoint::read_from(reader)?;
        debug!(step = checkpoint.step, time = checkpoint.time, "Loaded checkpoint");
        self.context.restore(checkpoint)
    }
}
