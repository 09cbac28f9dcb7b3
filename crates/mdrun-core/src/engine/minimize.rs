use super::config::MinimizationOptions;
use super::constraints::{ConstraintError, ConstraintSet};
use super::forces::{ForceEvaluation, ForceModel};
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

const INITIAL_DISPLACEMENT: f64 = 0.01; // nm
const MIN_DISPLACEMENT: f64 = 1e-12;
const GROW: f64 = 1.2;
const SHRINK: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MinimizationSummary {
    pub iterations: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Largest per-atom force at the final positions, kJ/mol/nm.
    pub max_force: f64,
    pub converged: bool,
    /// Evaluations whose forces could not be projected onto the constraints and were used raw.
    pub projection_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MinimizationError {
    /// The starting configuration has a non-finite energy or force.
    NonFiniteStart,
}

/// Steepest descent with an adaptive maximum displacement.
///
/// A trial step moves the atom with the largest force by the current displacement and every
/// other atom proportionally. Accepted steps grow the displacement, rejected ones shrink it.
/// Forces are projected onto the constraint manifold and trial positions are constrained, so
/// constrained bonds keep their lengths throughout.
pub fn steepest_descent(
    forces: &ForceModel,
    constraints: &ConstraintSet,
    positions: &mut [Point3<f64>],
    options: &MinimizationOptions,
) -> Result<MinimizationSummary, MinimizationError> {
    let mut current = forces.compute(positions);
    if !current.is_finite() {
        return Err(MinimizationError::NonFiniteStart);
    }
    let initial_energy = current.potential_energy;
    let mut projection_failures = 0;
    let mut projected = project_or_raw(constraints, positions, &current, &mut projection_failures);
    let mut max_force = max_norm(&projected);
    let mut displacement = INITIAL_DISPLACEMENT;
    let mut iterations = 0;
    let mut converged = max_force < options.tolerance;

    while !converged && iterations < options.max_iterations {
        iterations += 1;

        let scale = displacement / max_force;
        let mut trial: Vec<Point3<f64>> = positions
            .iter()
            .zip(&projected)
            .map(|(x, f)| x + f * scale)
            .collect();

        let accepted = match constraints.apply_positions(positions, &mut trial) {
            Ok(()) => {
                let evaluation = forces.compute(&trial);
                if evaluation.is_finite()
                    && evaluation.potential_energy < current.potential_energy
                {
                    Some(evaluation)
                } else {
                    None
                }
            }
            Err(_) => None,
        };

        match accepted {
            Some(evaluation) => {
                positions.copy_from_slice(&trial);
                current = evaluation;
                projected =
                    project_or_raw(constraints, positions, &current, &mut projection_failures);
                max_force = max_norm(&projected);
                displacement *= GROW;
                converged = max_force < options.tolerance;
            }
            None => {
                displacement *= SHRINK;
                if displacement < MIN_DISPLACEMENT {
                    warn!(
                        iterations,
                        max_force, "Minimizer step size underflow; stopping early"
                    );
                    break;
                }
            }
        }
    }

    if projection_failures > 0 {
        warn!(
            projection_failures,
            iterations, "Constraint force projection did not converge; used unprojected forces"
        );
    }
    debug!(
        iterations,
        initial_energy,
        final_energy = current.potential_energy,
        max_force,
        converged,
        "Energy minimization finished"
    );

    Ok(MinimizationSummary {
        iterations,
        initial_energy,
        final_energy: current.potential_energy,
        max_force,
        converged,
        projection_failures,
    })
}

fn project(
    constraints: &ConstraintSet,
    positions: &[Point3<f64>],
    evaluation: &ForceEvaluation,
) -> Result<Vec<Vector3<f64>>, ConstraintError> {
    let mut projected = evaluation.forces.clone();
    constraints.apply_velocities(positions, &mut projected)?;
    Ok(projected)
}

fn project_or_raw(
    constraints: &ConstraintSet,
    positions: &[Point3<f64>],
    evaluation: &ForceEvaluation,
    failures: &mut usize,
) -> Vec<Vector3<f64>> {
    project(constraints, positions, evaluation).unwrap_or_else(|err| {
        debug!(error = %err, "Falling back to unprojected forces");
        *failures += 1;
        evaluation.forces.clone()
    })
}

fn max_norm(vectors: &[Vector3<f64>]) -> f64 {
    vectors.iter().map(|v| v.norm()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::parameterization::{AtomParams, BondTerm, ParameterizedSystem};
    use crate::core::models::atom::Element;
    use crate::core::models::system::MolecularSystemBuilder;
    use crate::core::models::topology::Bond;
    use crate::core::units::Nanometers;
    use crate::engine::config::{Constraints, NonbondedMethod};

    fn argon_pair() -> ForceModel {
        let mut builder = MolecularSystemBuilder::new();
        builder.start_chain('A', false);
        for serial in 1..=2 {
            builder.start_residue(serial as isize, "AR").unwrap();
            builder
                .add_atom(serial, "AR", Element::Ar, Point3::origin())
                .unwrap();
        }
        let argon = AtomParams {
            type_name: "Ar".into(),
            mass: 39.948,
            charge: 0.0,
            sigma: 0.3405,
            epsilon: 0.996,
            is_hydrogen: false,
        };
        let model = ParameterizedSystem {
            topology: builder.build(),
            atoms: vec![argon.clone(), argon],
            bonds: Vec::new(),
            angles: Vec::new(),
            exclusions: vec![Vec::new(), Vec::new()],
        };
        ForceModel::new(
            &model,
            NonbondedMethod::NoCutoff,
            Nanometers::new(1.0).unwrap(),
            Constraints::None,
        )
        .unwrap()
    }

    #[test]
    fn argon_pair_relaxes_to_lennard_jones_minimum() {
        let forces = argon_pair();
        let mut positions = vec![Point3::origin(), Point3::new(0.34, 0.0, 0.0)];
        let options = MinimizationOptions {
            tolerance: 0.01,
            max_iterations: 10_000,
        };

        let summary = steepest_descent(
            &forces,
            &ConstraintSet::default(),
            &mut positions,
            &options,
        )
        .unwrap();

        assert!(summary.converged);
        assert!(summary.final_energy < summary.initial_energy);
        let distance = (positions[1] - positions[0]).norm();
        let r_min = 2f64.powf(1.0 / 6.0) * 0.3405;
        assert!((distance - r_min).abs() < 1e-3, "distance {}", distance);
    }

    #[test]
    fn zero_iterations_leaves_positions_untouched() {
        let forces = argon_pair();
        let start = vec![Point3::origin(), Point3::new(0.34, 0.0, 0.0)];
        let mut positions = start.clone();
        let options = MinimizationOptions {
            tolerance: 1e-6,
            max_iterations: 0,
        };

        let summary = steepest_descent(
            &forces,
            &ConstraintSet::default(),
            &mut positions,
            &options,
        )
        .unwrap();

        assert_eq!(summary.iterations, 0);
        assert!(!summary.converged);
        assert_eq!(positions, start);
    }

    #[test]
    fn overlapping_atoms_are_rejected() {
        let forces = argon_pair();
        let mut positions = vec![Point3::origin(), Point3::origin()];
        assert_eq!(
            steepest_descent(
                &forces,
                &ConstraintSet::default(),
                &mut positions,
                &MinimizationOptions::default()
            ),
            Err(MinimizationError::NonFiniteStart)
        );
    }

    #[test]
    fn failed_projection_falls_back_to_raw_forces() {
        let mut builder = MolecularSystemBuilder::new();
        builder.start_chain('A', false);
        builder.start_residue(1, "CH").unwrap();
        builder
            .add_atom(1, "C", Element::C, Point3::origin())
            .unwrap();
        builder
            .add_atom(2, "H", Element::H, Point3::origin())
            .unwrap();
        let params = |mass: f64, is_hydrogen: bool| AtomParams {
            type_name: "X".into(),
            mass,
            charge: 0.0,
            sigma: 0.0,
            epsilon: 0.0,
            is_hydrogen,
        };
        // A massless hydrogen turns the velocity projection into NaN, so it never converges.
        let model = ParameterizedSystem {
            topology: builder.build(),
            atoms: vec![params(12.011, false), params(0.0, true)],
            bonds: vec![BondTerm {
                bond: Bond::new(0, 1),
                length: 0.1,
                k: 1000.0,
                involves_hydrogen: true,
            }],
            angles: Vec::new(),
            exclusions: vec![vec![1], vec![0]],
        };
        let forces = ForceModel::new(
            &model,
            NonbondedMethod::NoCutoff,
            Nanometers::new(1.0).unwrap(),
            Constraints::None,
        )
        .unwrap();
        let constraints = ConstraintSet::hydrogen_bonds(&model);
        let mut positions = vec![Point3::origin(), Point3::new(0.15, 0.0, 0.0)];
        let options = MinimizationOptions {
            tolerance: 1e-6,
            max_iterations: 50,
        };

        let summary = steepest_descent(&forces, &constraints, &mut positions, &options).unwrap();

        assert!(summary.projection_failures >= 1);
        assert!(summary.max_force.is_finite());
        assert!(summary.max_force > 0.0);
        assert!(!summary.converged);
        assert!(positions.iter().all(|p| p.iter().all(|c| c.is_finite())));
    }
}
