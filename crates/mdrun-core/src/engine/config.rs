use crate::core::models::system::MolecularSystem;
use crate::core::units::{InversePicoseconds, Kelvin, Nanometers, Picoseconds, QuantityError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// How nonbonded interactions are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonbondedMethod {
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
}

impl NonbondedMethod {
    pub fn is_periodic(self) -> bool {
        matches!(self, Self::CutoffPeriodic)
    }

    pub fn uses_cutoff(self) -> bool {
        !matches!(self, Self::NoCutoff)
    }
}

impl fmt::Display for NonbondedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoCutoff => "no-cutoff",
            Self::CutoffNonPeriodic => "cutoff-non-periodic",
            Self::CutoffPeriodic => "cutoff-periodic",
        })
    }
}

impl FromStr for NonbondedMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "no-cutoff" | "nocutoff" => Ok(Self::NoCutoff),
            "cutoff-non-periodic" | "cutoffnonperiodic" => Ok(Self::CutoffNonPeriodic),
            "cutoff-periodic" | "cutoffperiodic" | "pbc" => Ok(Self::CutoffPeriodic),
            _ => Err(ConfigError::InvalidValue {
                parameter: "nonbonded-method",
                reason: format!(
                    "'{}' (expected no-cutoff, cutoff-non-periodic or cutoff-periodic)",
                    s
                ),
            }),
        }
    }
}

/// Which bonds are replaced by rigid distance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constraints {
    None,
    #[default]
    HBonds,
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::HBonds => "h-bonds",
        })
    }
}

impl FromStr for Constraints {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "h-bonds" | "hbonds" => Ok(Self::HBonds),
            _ => Err(ConfigError::InvalidValue {
                parameter: "constraints",
                reason: format!("'{}' (expected none or h-bonds)", s),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedPolicy {
    /// `None` selects `CutoffPeriodic` for structures with a unit cell and
    /// `CutoffNonPeriodic` otherwise.
    pub method: Option<NonbondedMethod>,
    pub cutoff: Nanometers,
    pub constraints: Constraints,
}

impl NonbondedPolicy {
    pub fn method_for(&self, structure: &MolecularSystem) -> NonbondedMethod {
        self.method.unwrap_or(if structure.unit_cell().is_some() {
            NonbondedMethod::CutoffPeriodic
        } else {
            NonbondedMethod::CutoffNonPeriodic
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    pub temperature: Kelvin,
    pub friction: InversePicoseconds,
    pub step_size: Picoseconds,
    /// Seed for the thermostat's random stream. A random seed is drawn when absent; either
    /// way the stream state is stored in every checkpoint.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizationOptions {
    /// Convergence threshold on the largest per-atom force, kJ/mol/nm.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl MinimizationOptions {
    pub const DEFAULT_TOLERANCE: f64 = 10.0;
    pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "minimize-tolerance",
                reason: format!("{} (must be a positive number)", self.tolerance),
            });
        }
        Ok(())
    }
}

impl Default for MinimizationOptions {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}
