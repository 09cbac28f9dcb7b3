use super::checkpoint::Checkpoint;
use super::config::MinimizationOptions;
use super::constraints::ConstraintSet;
use super::error::EngineError;
use super::forces::{ForceEvaluation, ForceModel};
use super::integrator::{self, LangevinMiddleIntegrator};
use super::minimize::{self, MinimizationError, MinimizationSummary};
use super::state::StateSnapshot;
use crate::core::models::system::{MolecularSystem, SystemBuildError};
use nalgebra::{Point3, Vector3};
use tracing::warn;

/// The live state of a reference simulation together with the model that moves it.
///
/// Forces at the current positions are cached after every change, so each integration step
/// costs exactly one force evaluation.
#[derive(Debug, Clone)]
pub struct Context {
    topology: MolecularSystem,
    forces: ForceModel,
    constraints: ConstraintSet,
    integrator: LangevinMiddleIntegrator,
    masses: Vec<f64>,
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    evaluation: ForceEvaluation,
    step: u64,
    time: f64,
}

impl Context {
    /// Creates a context at step zero with the topology's positions and zero velocities.
    pub fn new(
        topology: MolecularSystem,
        forces: ForceModel,
        constraints: ConstraintSet,
        integrator: LangevinMiddleIntegrator,
        masses: Vec<f64>,
    ) -> Self {
        let positions = topology.positions();
        let evaluation = forces.compute(&positions);
        let velocities = vec![Vector3::zeros(); positions.len()];
        Self {
            topology,
            forces,
            constraints,
            integrator,
            masses,
            positions,
            velocities,
            evaluation,
            step: 0,
            time: 0.0,
        }
    }

    pub fn topology(&self) -> &MolecularSystem {
        &self.topology
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), EngineError> {
        if positions.len() != self.positions.len() {
            return Err(SystemBuildError::PositionCount {
                expected: self.positions.len(),
                found: positions.len(),
            }
            .into());
        }
        self.positions.copy_from_slice(positions);
        self.evaluation = self.forces.compute(&self.positions);
        Ok(())
    }

    pub fn minimize(
        &mut self,
        options: &MinimizationOptions,
    ) -> Result<MinimizationSummary, EngineError> {
        let summary = minimize::steepest_descent(
            &self.forces,
            &self.constraints,
            &mut self.positions,
            options,
        )
        .map_err(|err| match err {
            MinimizationError::NonFiniteStart => EngineError::Divergence {
                step: self.step,
                reason: "non-finite energy at the start of minimization".to_string(),
            },
        })?;
        if !summary.converged {
            warn!(
                iterations = summary.iterations,
                max_force = summary.max_force,
                tolerance = options.tolerance,
                "Energy minimization stopped before reaching the force tolerance"
            );
        }
        self.evaluation = self.forces.compute(&self.positions);
        Ok(summary)
    }

    /// Integrates `steps` steps, failing on the first step that leaves a non-finite state.
    pub fn integrate(&mut self, steps: u64) -> Result<(), EngineError> {
        for _ in 0..steps {
            let next_step = self.step + 1;
            self.integrator
                .step(
                    &mut self.positions,
                    &mut self.velocities,
                    &self.evaluation.forces,
                    &self.masses,
                    &self.constraints,
                )
                .map_err(|_| EngineError::ConstraintFailure { step: next_step })?;

            self.evaluation = self.forces.compute(&self.positions);
            self.step = next_step;
            self.time += self.integrator.step_size();
            self.check_finite()?;
        }
        Ok(())
    }

    fn check_finite(&self) -> Result<(), EngineError> {
        let finite_coordinates = self
            .positions
            .iter()
            .all(|p| p.iter().all(|c| c.is_finite()))
            && self
                .velocities
                .iter()
                .all(|v| v.iter().all(|c| c.is_finite()));
        if !finite_coordinates {
            return Err(EngineError::Divergence {
                step: self.step,
                reason: "non-finite coordinates".to_string(),
            });
        }
        if !self.evaluation.is_finite() {
            return Err(EngineError::Divergence {
                step: self.step,
                reason: format!(
                    "non-finite energy or forces (potential energy {})",
                    self.evaluation.potential_energy
                ),
            });
        }
        Ok(())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let kinetic_energy = integrator::kinetic_energy(&self.velocities, &self.masses);
        let dof = integrator::degrees_of_freedom(self.positions.len(), self.constraints.len());
        StateSnapshot {
            step: self.step,
            time: self.time,
            positions: self.positions.clone(),
            velocities: self.velocities.clone(),
            potential_energy: self.evaluation.potential_energy,
            kinetic_energy,
            temperature: integrator::temperature(kinetic_energy, dof),
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            step: self.step,
            time: self.time,
            atom_count: self.positions.len() as u64,
            positions: self.positions.iter().map(|p| [p.x, p.y, p.z]).collect(),
            velocities: self.velocities.iter().map(|v| [v.x, v.y, v.z]).collect(),
            box_lengths: self
                .forces
                .periodic_box()
                .map(|b| [b.lengths().x, b.lengths().y, b.lengths().z]),
            rng: self.integrator.rng().clone(),
        }
    }

    /// Replaces the dynamic state with a checkpoint's.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> Result<(), EngineError> {
        checkpoint.expect_atoms(self.positions.len())?;

        let own_box = self
            .forces
            .periodic_box()
            .map(|b| [b.lengths().x, b.lengths().y, b.lengths().z]);
        if checkpoint.box_lengths != own_box {
            warn!(
                checkpoint = ?checkpoint.box_lengths,
                model = ?own_box,
                "Checkpoint box differs from the model's box; keeping the model's box"
            );
        }

        self.positions = checkpoint
            .positions
            .iter()
            .map(|p| Point3::new(p[0], p[1], p[2]))
            .collect();
        self.velocities = checkpoint
            .velocities
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();
        self.step = checkpoint.step;
        self.time = checkpoint.time;
        self.integrator.set_rng(checkpoint.rng);
        self.evaluation = self.forces.compute(&self.positions);
        self.check_finite()
    }
}
