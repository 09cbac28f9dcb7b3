//! # Core Module
//!
//! Fundamental building blocks shared by the engine and the workflows.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds and the
//!   `MolecularSystem` that owns them
//! - **Physical Quantities** ([`units`]) - Validated newtypes for lengths, temperatures,
//!   times and rates
//! - **File I/O** ([`io`]) - Reading and writing PDB structures
//! - **Force Fields** ([`forcefield`]) - Parameter files, identifier resolution and the
//!   analytic potentials used by the reference engine

pub mod forcefield;
pub mod io;
pub mod models;
pub mod units;
