use crate::core::units::ONE_4PI_EPS0;

/// Dielectric constant of the continuum beyond the cutoff in reaction-field electrostatics.
pub const REACTION_FIELD_DIELECTRIC: f64 = 78.3;

// Each potential returns `(energy, dE/dr)`; the force on the first particle along the
// separation vector r = x1 - x2 is `-dE/dr * r / |r|`.

#[inline]
pub fn lennard_jones(dist: f64, sigma: f64, epsilon: f64) -> (f64, f64) {
    if epsilon == 0.0 || sigma == 0.0 {
        return (0.0, 0.0);
    }
    let sr = sigma / dist;
    let sr6 = sr.powi(6);
    let sr12 = sr6 * sr6;
    let energy = 4.0 * epsilon * (sr12 - sr6);
    let de_dr = 4.0 * epsilon * (-12.0 * sr12 + 6.0 * sr6) / dist;
    (energy, de_dr)
}

#[inline]
pub fn coulomb(dist: f64, charge_product: f64) -> (f64, f64) {
    let prefactor = ONE_4PI_EPS0 * charge_product;
    (prefactor / dist, -prefactor / (dist * dist))
}

/// Coulomb interaction with a reaction-field correction, zero at `cutoff`.
#[inline]
pub fn reaction_field(dist: f64, charge_product: f64, cutoff: f64, dielectric: f64) -> (f64, f64) {
    let k_rf = (dielectric - 1.0) / ((2.0 * dielectric + 1.0) * cutoff.powi(3));
    let c_rf = 1.0 / cutoff + k_rf * cutoff * cutoff;
    let prefactor = ONE_4PI_EPS0 * charge_product;
    let energy = prefactor * (1.0 / dist + k_rf * dist * dist - c_rf);
    let de_dr = prefactor * (-1.0 / (dist * dist) + 2.0 * k_rf * dist);
    (energy, de_dr)
}

#[inline]
pub fn harmonic(value: f64, equilibrium: f64, k: f64) -> (f64, f64) {
    let delta = value - equilibrium;
    (0.5 * k * delta * delta, k * delta)
}

/// Lorentz-Berthelot combination of two atom types' Lennard-Jones parameters.
#[inline]
pub fn combine_lorentz_berthelot(
    sigma1: f64,
    epsilon1: f64,
    sigma2: f64,
    epsilon2: f64,
) -> (f64, f64) {
    (0.5 * (sigma1 + sigma2), (epsilon1 * epsilon2).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn numeric_derivative(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        let h = 1e-6;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    #[test]
    fn lennard_jones_minimum_is_at_two_to_the_sixth_sigma() {
        let sigma = 0.34;
        let r_min = 2f64.powf(1.0 / 6.0) * sigma;
        let (energy, de_dr) = lennard_jones(r_min, sigma, 1.0);
        assert!(f64_approx_equal(energy, -1.0));
        assert!(de_dr.abs() < 1e-9);
    }

    #[test]
    fn lennard_jones_is_zero_at_sigma_and_repulsive_inside() {
        let (energy, de_dr) = lennard_jones(0.34, 0.34, 0.5);
        assert!(f64_approx_equal(energy, 0.0));
        assert!(de_dr < 0.0);
    }

    #[test]
    fn lennard_jones_with_zero_epsilon_vanishes() {
        assert_eq!(lennard_jones(0.1, 0.3, 0.0), (0.0, 0.0));
    }

    #[test]
    fn lennard_jones_derivative_matches_finite_difference() {
        let r = 0.41;
        let (_, de_dr) = lennard_jones(r, 0.34, 0.99);
        let numeric = numeric_derivative(|x| lennard_jones(x, 0.34, 0.99).0, r);
        assert!((de_dr - numeric).abs() < 1e-5);
    }

    #[test]
    fn coulomb_sign_follows_charge_product() {
        let (repulsive, _) = coulomb(1.0, 1.0);
        let (attractive, _) = coulomb(2.0, -1.0);
        assert!(f64_approx_equal(repulsive, ONE_4PI_EPS0));
        assert!(f64_approx_equal(attractive, -ONE_4PI_EPS0 / 2.0));
    }

    #[test]
    fn reaction_field_vanishes_at_cutoff_and_matches_derivative() {
        let cutoff = 1.0;
        let (at_cutoff, _) = reaction_field(cutoff, 0.5, cutoff, REACTION_FIELD_DIELECTRIC);
        assert!(at_cutoff.abs() < 1e-9);

        let r = 0.37;
        let (_, de_dr) = reaction_field(r, 0.5, cutoff, REACTION_FIELD_DIELECTRIC);
        let numeric = numeric_derivative(
            |x| reaction_field(x, 0.5, cutoff, REACTION_FIELD_DIELECTRIC).0,
            r,
        );
        assert!((de_dr - numeric).abs() < 1e-4);
    }

    #[test]
    fn harmonic_energy_and_derivative() {
        let (energy, de_dx) = harmonic(0.11, 0.1, 1000.0);
        assert!(f64_approx_equal(energy, 0.05));
        assert!(f64_approx_equal(de_dx, 10.0));
        assert_eq!(harmonic(0.1, 0.1, 1000.0), (0.0, 0.0));
    }

    #[test]
    fn lorentz_berthelot_uses_arithmetic_and_geometric_means() {
        let (sigma, epsilon) = combine_lorentz_berthelot(0.2, 4.0, 0.4, 1.0);
        assert!(f64_approx_equal(sigma, 0.3));
        assert!(f64_approx_equal(epsilon, 2.0));
    }
}
