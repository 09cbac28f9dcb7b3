use crate::core::forcefield::parameterization::ParameterizedSystem;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

const MAX_ITERATIONS: usize = 1000;
/// Relative tolerance on squared constraint lengths.
const POSITION_TOLERANCE: f64 = 1e-10;
/// Tolerance on the relative velocity along a constraint, in units of the constraint length per ps.
const VELOCITY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Constraints did not converge within {iterations} iterations")]
pub struct ConstraintError {
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DistanceConstraint {
    i: usize,
    j: usize,
    distance: f64,
}

/// Rigid distance constraints, enforced with SHAKE on positions and a RATTLE projection on
/// velocities.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<DistanceConstraint>,
    inverse_masses: Vec<f64>,
}

impl ConstraintSet {
    /// Constrains every bond that involves a hydrogen atom to its equilibrium length.
    pub fn hydrogen_bonds(model: &ParameterizedSystem) -> Self {
        let constraints = model
            .bonds
            .iter()
            .filter(|b| b.involves_hydrogen)
            .map(|b| DistanceConstraint {
                i: b.bond.atom1_idx,
                j: b.bond.atom2_idx,
                distance: b.length,
            })
            .collect();
        Self {
            constraints,
            inverse_masses: model.atoms.iter().map(|a| 1.0 / a.mass).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Moves `positions` so that every constraint holds, correcting along the constraint
    /// vectors of `reference` (the positions before the unconstrained update).
    pub fn apply_positions(
        &self,
        reference: &[Point3<f64>],
        positions: &mut [Point3<f64>],
    ) -> Result<(), ConstraintError> {
        if self.constraints.is_empty() {
            return Ok(());
        }
        for _ in 0..MAX_ITERATIONS {
            let mut converged = true;
            for c in &self.constraints {
                let r = positions[c.i] - positions[c.j];
                let d2 = c.distance * c.distance;
                let diff = d2 - r.norm_squared();
                if diff.abs() <= 2.0 * POSITION_TOLERANCE * d2 {
                    continue;
                }
                converged = false;

                let r_ref = reference[c.i] - reference[c.j];
                let (inv_i, inv_j) = (self.inverse_masses[c.i], self.inverse_masses[c.j]);
                let denom = 2.0 * r.dot(&r_ref) * (inv_i + inv_j);
                if denom.abs() < f64::EPSILON {
                    return Err(ConstraintError {
                        iterations: MAX_ITERATIONS,
                    });
                }
                let g = diff / denom;
                positions[c.i] += r_ref * (g * inv_i);
                positions[c.j] -= r_ref * (g * inv_j);
            }
            if converged {
                return Ok(());
            }
        }
        Err(ConstraintError {
            iterations: MAX_ITERATIONS,
        })
    }

    /// Removes the velocity components along every constraint.
    pub fn apply_velocities(
        &self,
        positions: &[Point3<f64>],
        velocities: &mut [Vector3<f64>],
    ) -> Result<(), ConstraintError> {
        if self.constraints.is_empty() {
            return Ok(());
        }
        for _ in 0..MAX_ITERATIONS {
            let mut converged = true;
            for c in &self.constraints {
                let r = positions[c.i] - positions[c.j];
                let rv = r.dot(&(velocities[c.i] - velocities[c.j]));
                if rv.abs() <= VELOCITY_TOLERANCE * c.distance * c.distance {
                    continue;
                }
                converged = false;

                let (inv_i, inv_j) = (self.inverse_masses[c.i], self.inverse_masses[c.j]);
                let k = rv / (r.norm_squared() * (inv_i + inv_j));
                velocities[c.i] -= r * (k * inv_i);
                velocities[c.j] += r * (k * inv_j);
            }
            if converged {
                return Ok(());
            }
        }
        Err(ConstraintError {
            iterations: MAX_ITERATIONS,
        })
    }
}
