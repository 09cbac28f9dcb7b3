//! Typed physical quantities.
//!
//! All quantities use the molecular dynamics unit system: nanometers, picoseconds,
//! kilojoules per mole, atomic mass units and kelvin. Each newtype validates its value on
//! construction so that a non-finite or out-of-range input is rejected before any
//! simulation state exists.

use std::fmt;
use thiserror::Error;

/// Boltzmann constant in kJ/(mol·K).
pub const BOLTZ: f64 = 0.008_314_462_618;

/// Coulomb prefactor 1/(4πε₀) in kJ·nm/(mol·e²).
pub const ONE_4PI_EPS0: f64 = 138.935_456;

/// Angstroms per nanometer, used when converting PDB coordinates.
pub const ANGSTROMS_PER_NM: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantityError {
    #[error("{quantity} must be a finite number (got {value})")]
    NotFinite { quantity: &'static str, value: f64 },
    #[error("{quantity} must be strictly positive (got {value})")]
    NotPositive { quantity: &'static str, value: f64 },
    #[error("{quantity} must not be negative (got {value})")]
    Negative { quantity: &'static str, value: f64 },
}

fn finite(quantity: &'static str, value: f64) -> Result<f64, QuantityError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QuantityError::NotFinite { quantity, value })
    }
}

fn positive(quantity: &'static str, value: f64) -> Result<f64, QuantityError> {
    let value = finite(quantity, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(QuantityError::NotPositive { quantity, value })
    }
}

fn non_negative(quantity: &'static str, value: f64) -> Result<f64, QuantityError> {
    let value = finite(quantity, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(QuantityError::Negative { quantity, value })
    }
}

macro_rules! quantity {
    ($(#[$meta:meta])* $name:ident, $label:literal, $unit:literal, $check:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
        pub struct $name(f64);

        impl $name {
            pub fn new(value: f64) -> Result<Self, QuantityError> {
                $check($label, value).map(Self)
            }

            #[inline]
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.0, $unit)
            }
        }
    };
}

quantity!(
    /// A length in nanometers, strictly positive (cutoff distances).
    Nanometers,
    "length",
    "nm",
    positive
);
quantity!(
    /// An absolute temperature in kelvin. Zero is allowed and disables thermal noise.
    Kelvin,
    "temperature",
    "K",
    non_negative
);
quantity!(
    /// A friction coefficient (collision rate) in ps⁻¹. Zero gives plain velocity Verlet.
    InversePicoseconds,
    "friction coefficient",
    "ps^-1",
    non_negative
);
quantity!(
    /// A duration in picoseconds, strictly positive (integration step sizes).
    Picoseconds,
    "step size",
    "ps",
    positive
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_quantities_reject_zero_and_negative_values() {
        assert!(matches!(
            Nanometers::new(0.0),
            Err(QuantityError::NotPositive { .. })
        ));
        assert!(matches!(
            Picoseconds::new(-0.002),
            Err(QuantityError::NotPositive { .. })
        ));
        assert_eq!(Picoseconds::new(0.002).unwrap().value(), 0.002);
    }

    #[test]
    fn non_negative_quantities_accept_zero_and_real_values() {
        assert_eq!(Kelvin::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Kelvin::new(300.5).unwrap().value(), 300.5);
        assert_eq!(InversePicoseconds::new(0.25).unwrap().value(), 0.25);
        assert!(matches!(
            InversePicoseconds::new(-1.0),
            Err(QuantityError::Negative { .. })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected_for_every_quantity() {
        assert!(matches!(
            Nanometers::new(f64::NAN),
            Err(QuantityError::NotFinite { .. })
        ));
        assert!(matches!(
            Kelvin::new(f64::INFINITY),
            Err(QuantityError::NotFinite { .. })
        ));
    }

    #[test]
    fn display_includes_unit_suffix() {
        assert_eq!(Nanometers::new(1.0).unwrap().to_string(), "1 nm");
        assert_eq!(Kelvin::new(300.0).unwrap().to_string(), "300 K");
    }
}
