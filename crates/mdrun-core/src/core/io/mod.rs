//! Input/output for molecular structure files.
//!
//! Structures are read through the [`traits::MolecularFile`] interface. The PDB format
//! is the one supported format: it is the input for a fresh run and the format of the
//! final structure written at the end of every successful run.

pub mod pdb;
pub mod traits;
