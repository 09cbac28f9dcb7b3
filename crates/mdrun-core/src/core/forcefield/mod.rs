//! # Force Field Module
//!
//! Parameter files and the classical potentials used by the reference engine.
//!
//! ## Key Components
//!
//! - [`params`] - TOML force-field files and the merged [`params::Forcefield`]
//! - [`library`] - Resolution of force-field identifiers against search directories
//! - [`parameterization`] - Typing atoms from residue templates and building the bonded
//!   terms and nonbonded exclusions of a system
//! - [`potentials`] - Lennard-Jones, Coulomb, reaction-field and harmonic functions
//!
//! All parameters use nanometers, kJ/mol, degrees (in files) and elementary charges.

pub mod library;
pub mod parameterization;
pub mod params;
pub mod potentials;
