//! # Core Models Module
//!
//! Data structures describing the molecular system being simulated: its atoms, the
//! residues and chains that group them, the covalent bonds between them and, for periodic
//! systems, the unit cell.
//!
//! - [`atom`] - Atoms and chemical elements
//! - [`residue`] - Named residues grouping atoms
//! - [`chain`] - Chains grouping residues
//! - [`topology`] - Covalent bonds
//! - [`system`] - The complete system and its builder
//!
//! Positions are stored in nanometers. Conversion to and from file units happens in
//! [`crate::core::io`].

pub mod atom;
pub mod chain;
pub mod residue;
pub mod system;
pub mod topology;
