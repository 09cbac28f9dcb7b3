use super::config::IntegratorConfig;
use super::constraints::{ConstraintError, ConstraintSet};
use crate::core::units::BOLTZ;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::debug;

/// Langevin dynamics with the "middle" splitting: a full velocity kick, a half drift, the
/// Ornstein-Uhlenbeck velocity update, a second half drift, then position constraints.
///
/// Every random number comes from one ChaCha8 stream whose state travels with the checkpoint,
/// so a restored integrator continues the exact noise sequence.
#[derive(Debug, Clone)]
pub struct LangevinMiddleIntegrator {
    step_size: f64,
    friction: f64,
    temperature: f64,
    rng: ChaCha8Rng,
}

impl LangevinMiddleIntegrator {
    pub fn new(config: &IntegratorConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(
            seed,
            temperature = config.temperature.value(),
            friction = config.friction.value(),
            step_size = config.step_size.value(),
            "Constructed Langevin integrator"
        );
        Self {
            step_size: config.step_size.value(),
            friction: config.friction.value(),
            temperature: config.temperature.value(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn rng(&self) -> &ChaCha8Rng {
        &self.rng
    }

    pub fn set_rng(&mut self, rng: ChaCha8Rng) {
        self.rng = rng;
    }

    /// Advances positions and velocities by one step using the forces at the current
    /// positions.
    pub fn step(
        &mut self,
        positions: &mut [Point3<f64>],
        velocities: &mut [Vector3<f64>],
        forces: &[Vector3<f64>],
        masses: &[f64],
        constraints: &ConstraintSet,
    ) -> Result<(), ConstraintError> {
        let dt = self.step_size;
        let half_dt = 0.5 * dt;

        for ((v, f), m) in velocities.iter_mut().zip(forces).zip(masses) {
            *v += f * (dt / m);
        }
        constraints.apply_velocities(positions, velocities)?;

        let start = positions.to_vec();
        for (x, v) in positions.iter_mut().zip(velocities.iter()) {
            *x += v * half_dt;
        }

        let decay = (-self.friction * dt).exp();
        let kt = BOLTZ * self.temperature;
        let noise_variance = kt * (1.0 - decay * decay);
        for (v, m) in velocities.iter_mut().zip(masses) {
            *v *= decay;
            if noise_variance > 0.0 {
                let sigma = (noise_variance / m).sqrt();
                let noise = Vector3::new(
                    self.rng.sample::<f64, _>(StandardNormal),
                    self.rng.sample::<f64, _>(StandardNormal),
                    self.rng.sample::<f64, _>(StandardNormal),
                );
                *v += noise * sigma;
            }
        }

        for (x, v) in positions.iter_mut().zip(velocities.iter()) {
            *x += v * half_dt;
        }

        if !constraints.is_empty() {
            constraints.apply_positions(&start, positions)?;
            for ((v, x), x0) in velocities.iter_mut().zip(positions.iter()).zip(&start) {
                *v = (x - x0) / dt;
            }
        }

        remove_center_of_mass_motion(velocities, masses);
        Ok(())
    }
}

pub fn remove_center_of_mass_motion(velocities: &mut [Vector3<f64>], masses: &[f64]) {
    let total_mass: f64 = masses.iter().sum();
    if total_mass <= 0.0 {
        return;
    }
    let momentum = velocities
        .iter()
        .zip(masses)
        .fold(Vector3::zeros(), |acc, (v, m)| acc + v * *m);
    let com_velocity = momentum / total_mass;
    for v in velocities.iter_mut() {
        *v -= com_velocity;
    }
}

pub fn kinetic_energy(velocities: &[Vector3<f64>], masses: &[f64]) -> f64 {
    0.5 * velocities
        .iter()
        .zip(masses)
        .map(|(v, m)| m * v.norm_squared())
        .sum::<f64>()
}

/// Degrees of freedom of `atom_count` atoms with `constraint_count` constraints and the
/// center-of-mass motion removed.
pub fn degrees_of_freedom(atom_count: usize, constraint_count: usize) -> usize {
    (3 * atom_count).saturating_sub(constraint_count + 3)
}

pub fn temperature(kinetic_energy: f64, dof: usize) -> f64 {
    if dof == 0 {
        0.0
    } else {
        2.0 * kinetic_energy / (dof as f64 * BOLTZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::{InversePicoseconds, Kelvin, Picoseconds};

    fn config(temperature: f64, friction: f64, seed: u64) -> IntegratorConfig {
        IntegratorConfig {
            temperature: Kelvin::new(temperature).unwrap(),
            friction: InversePicoseconds::new(friction).unwrap(),
            step_size: Picoseconds::new(0.002).unwrap(),
            seed: Some(seed),
        }
    }

    fn gas(n: usize) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>, Vec<Vector3<f64>>, Vec<f64>) {
        let positions = (0..n)
            .map(|i| Point3::new(i as f64 * 0.5, 0.0, 0.0))
            .collect();
        (
            positions,
            vec![Vector3::zeros(); n],
            vec![Vector3::zeros(); n],
            vec![39.948; n],
        )
    }

    #[test]
    fn same_seed_gives_identical_trajectories() {
        let run = |seed| {
            let mut integrator = LangevinMiddleIntegrator::new(&config(300.0, 1.0, seed));
            let (mut x, mut v, f, m) = gas(8);
            for _ in 0..20 {
                integrator
                    .step(&mut x, &mut v, &f, &m, &ConstraintSet::default())
                    .unwrap();
            }
            (x, v)
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn restored_rng_continues_the_same_noise_sequence() {
        let mut first = LangevinMiddleIntegrator::new(&config(300.0, 1.0, 11));
        let (mut x, mut v, f, m) = gas(4);
        first
            .step(&mut x, &mut v, &f, &m, &ConstraintSet::default())
            .unwrap();

        let mut second = LangevinMiddleIntegrator::new(&config(300.0, 1.0, 99));
        second.set_rng(first.rng().clone());
        let (mut x2, mut v2) = (x.clone(), v.clone());

        first
            .step(&mut x, &mut v, &f, &m, &ConstraintSet::default())
            .unwrap();
        second
            .step(&mut x2, &mut v2, &f, &m, &ConstraintSet::default())
            .unwrap();
        assert_eq!(x, x2);
        assert_eq!(v, v2);
    }

    #[test]
    fn zero_friction_and_force_keeps_relative_velocities() {
        let mut integrator = LangevinMiddleIntegrator::new(&config(300.0, 0.0, 1));
        let (mut x, _, f, m) = gas(2);
        let mut v = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0)];
        integrator
            .step(&mut x, &mut v, &f, &m, &ConstraintSet::default())
            .unwrap();
        assert_eq!(v[0], Vector3::new(1.0, 0.0, 0.0));
        assert!((x[0].x - 0.002).abs() < 1e-15);
    }

    #[test]
    fn thermostat_brings_free_particles_to_target_temperature() {
        let n = 200;
        let mut integrator = LangevinMiddleIntegrator::new(&config(300.0, 10.0, 3));
        let (mut x, mut v, f, m) = gas(n);
        let dof = degrees_of_freedom(n, 0);

        let mut sum = 0.0;
        let samples = 2000;
        for step in 0..4000 {
            integrator
                .step(&mut x, &mut v, &f, &m, &ConstraintSet::default())
                .unwrap();
            if step >= 4000 - samples {
                sum += temperature(kinetic_energy(&v, &m), dof);
            }
        }
        let mean = sum / samples as f64;
        assert!((mean - 300.0).abs() < 15.0, "mean temperature {}", mean);
    }

    #[test]
    fn center_of_mass_motion_is_removed() {
        let masses = [1.0, 3.0];
        let mut v = vec![Vector3::new(4.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0)];
        remove_center_of_mass_motion(&mut v, &masses);
        let momentum = v[0] * masses[0] + v[1] * masses[1];
        assert!(momentum.norm() < 1e-12);
    }

    #[test]
    fn degrees_of_freedom_account_for_constraints_and_com() {
        assert_eq!(degrees_of_freedom(3, 2), 4);
        assert_eq!(degrees_of_freedom(1, 0), 0);
        assert_eq!(temperature(1.0, 0), 0.0);
    }
}
