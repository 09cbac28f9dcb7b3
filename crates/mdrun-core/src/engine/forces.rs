use super::config::{Constraints, NonbondedMethod};
use super::error::EngineError;
use crate::core::forcefield::parameterization::{AngleTerm, BondTerm, ParameterizedSystem};
use crate::core::forcefield::potentials::{
    REACTION_FIELD_DIELECTRIC, combine_lorentz_berthelot, coulomb, harmonic, lennard_jones,
    reaction_field,
};
use crate::core::units::Nanometers;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

const MIN_SIN_ANGLE: f64 = 1e-8;

/// An orthorhombic periodic box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    lengths: Vector3<f64>,
}

impl PeriodicBox {
    pub fn new(lengths: Vector3<f64>) -> Result<Self, EngineError> {
        if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return Err(EngineError::InvalidBox(format!(
                "edge lengths must be positive, got {:?}",
                lengths.as_slice()
            )));
        }
        Ok(Self { lengths })
    }

    pub fn lengths(&self) -> Vector3<f64> {
        self.lengths
    }

    #[inline]
    pub fn minimum_image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        let shift = delta.component_div(&self.lengths).map(f64::round);
        delta - self.lengths.component_mul(&shift)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceEvaluation {
    /// kJ/mol/nm, in atom order.
    pub forces: Vec<Vector3<f64>>,
    /// kJ/mol
    pub potential_energy: f64,
}

impl ForceEvaluation {
    pub fn max_force(&self) -> f64 {
        self.forces.iter().map(|f| f.norm()).fold(0.0, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.potential_energy.is_finite()
            && self.forces.iter().all(|f| f.iter().all(|c| c.is_finite()))
    }
}

#[derive(Debug, Clone, Copy)]
struct NonbondedAtom {
    charge: f64,
    sigma: f64,
    epsilon: f64,
}

/// Energy and forces of a parameterized system: harmonic bonds and angles plus
/// Lennard-Jones and Coulomb (or reaction-field) nonbonded pairs.
#[derive(Debug, Clone)]
pub struct ForceModel {
    atoms: Vec<NonbondedAtom>,
    exclusions: Vec<Vec<usize>>,
    bonds: Vec<BondTerm>,
    angles: Vec<AngleTerm>,
    method: NonbondedMethod,
    cutoff: f64,
    periodic_box: Option<PeriodicBox>,
}

impl ForceModel {
    /// Bonds that become rigid constraints under `constraints` carry no harmonic term.
    pub fn new(
        model: &ParameterizedSystem,
        method: NonbondedMethod,
        cutoff: Nanometers,
        constraints: Constraints,
    ) -> Result<Self, EngineError> {
        let cutoff = cutoff.value();
        let periodic_box = if method.is_periodic() {
            let cell = model.topology.unit_cell().ok_or_else(|| {
                EngineError::InvalidBox(
                    "periodic nonbonded method requires a unit cell (CRYST1)".to_string(),
                )
            })?;
            if !cell.is_orthorhombic() {
                return Err(EngineError::InvalidBox(format!(
                    "only orthorhombic cells are supported, got angles {:?}",
                    cell.angles.as_slice()
                )));
            }
            let periodic_box = PeriodicBox::new(cell.lengths)?;
            let shortest = cell.lengths.min();
            if cutoff > 0.5 * shortest {
                return Err(EngineError::InvalidBox(format!(
                    "cutoff {} nm exceeds half the shortest box edge ({} nm)",
                    cutoff, shortest
                )));
            }
            Some(periodic_box)
        } else {
            None
        };

        let bonds = model
            .bonds
            .iter()
            .filter(|b| !(constraints == Constraints::HBonds && b.involves_hydrogen))
            .copied()
            .collect();

        Ok(Self {
            atoms: model
                .atoms
                .iter()
                .map(|a| NonbondedAtom {
                    charge: a.charge,
                    sigma: a.sigma,
                    epsilon: a.epsilon,
                })
                .collect(),
            exclusions: model.exclusions.clone(),
            bonds,
            angles: model.angles.clone(),
            method,
            cutoff,
            periodic_box,
        })
    }

    pub fn periodic_box(&self) -> Option<&PeriodicBox> {
        self.periodic_box.as_ref()
    }

    pub fn compute(&self, positions: &[Point3<f64>]) -> ForceEvaluation {
        let (mut forces, nonbonded_energies): (Vec<Vector3<f64>>, Vec<f64>) = (0..positions.len())
            .into_par_iter()
            .map(|i| self.nonbonded_on(i, positions))
            .unzip();

        // Each pair was visited from both ends.
        let mut energy = 0.5 * nonbonded_energies.iter().sum::<f64>();
        energy += self.add_bond_forces(positions, &mut forces);
        energy += self.add_angle_forces(positions, &mut forces);

        ForceEvaluation {
            forces,
            potential_energy: energy,
        }
    }

    fn nonbonded_on(&self, i: usize, positions: &[Point3<f64>]) -> (Vector3<f64>, f64) {
        let use_cutoff = self.method.uses_cutoff();
        let cutoff2 = self.cutoff * self.cutoff;
        let a = &self.atoms[i];
        let excluded = &self.exclusions[i];

        let mut force = Vector3::zeros();
        let mut energy = 0.0;
        for (j, b) in self.atoms.iter().enumerate() {
            if j == i || excluded.binary_search(&j).is_ok() {
                continue;
            }
            let mut delta = positions[i] - positions[j];
            if let Some(pbc) = &self.periodic_box {
                delta = pbc.minimum_image(delta);
            }
            let r2 = delta.norm_squared();
            if use_cutoff && r2 > cutoff2 {
                continue;
            }
            let r = r2.sqrt();

            let (sigma, epsilon) =
                combine_lorentz_berthelot(a.sigma, a.epsilon, b.sigma, b.epsilon);
            let (e_lj, de_lj) = lennard_jones(r, sigma, epsilon);
            let qq = a.charge * b.charge;
            let (e_el, de_el) = if qq == 0.0 {
                (0.0, 0.0)
            } else if use_cutoff {
                reaction_field(r, qq, self.cutoff, REACTION_FIELD_DIELECTRIC)
            } else {
                coulomb(r, qq)
            };

            energy += e_lj + e_el;
            force -= delta * ((de_lj + de_el) / r);
        }
        (force, energy)
    }

    fn add_bond_forces(&self, positions: &[Point3<f64>], forces: &mut [Vector3<f64>]) -> f64 {
        let mut energy = 0.0;
        for term in &self.bonds {
            let (i, j) = (term.bond.atom1_idx, term.bond.atom2_idx);
            let delta = positions[i] - positions[j];
            let r = delta.norm();
            let (e, de_dr) = harmonic(r, term.length, term.k);
            let f = delta * (de_dr / r);
            forces[i] -= f;
            forces[j] += f;
            energy += e;
        }
        energy
    }

    fn add_angle_forces(&self, positions: &[Point3<f64>], forces: &mut [Vector3<f64>]) -> f64 {
        let mut energy = 0.0;
        for term in &self.angles {
            let [i, j, k] = term.atoms;
            let a = positions[i] - positions[j];
            let b = positions[k] - positions[j];
            let (len_a, len_b) = (a.norm(), b.norm());
            let (a_hat, b_hat) = (a / len_a, b / len_b);
            let cos = a_hat.dot(&b_hat).clamp(-1.0, 1.0);
            let theta = cos.acos();
            let sin = (1.0 - cos * cos).sqrt().max(MIN_SIN_ANGLE);

            let (e, de_dtheta) = harmonic(theta, term.theta0, term.k);
            let f_i = (b_hat - a_hat * cos) * (de_dtheta / (len_a * sin));
            let f_k = (a_hat - b_hat * cos) * (de_dtheta / (len_b * sin));
            forces[i] += f_i;
            forces[k] += f_k;
            forces[j] -= f_i + f_k;
            energy += e;
        }
        energy
    }
}
