//! # Engine Module
//!
//! The physics collaborator behind the run controller.
//!
//! The controller only talks to the traits in [`simulation`]: a [`simulation::ModelBuilder`]
//! turns a structure and settings into a [`simulation::Simulation`], which can be minimized,
//! stepped, observed through [`simulation::Reporter`]s and saved to or restored from a
//! checkpoint. Everything else in this module is the reference implementation of those
//! traits:
//!
//! - [`forces`] - Bonded and nonbonded energies and forces, evaluated in parallel
//! - [`constraints`] - SHAKE/RATTLE distance constraints
//! - [`integrator`] - Langevin "middle" integrator with a checkpointable random stream
//! - [`minimize`] - Steepest-descent energy minimization
//! - [`context`] - The live dynamic state tying the pieces together
//! - [`checkpoint`] - The binary checkpoint format
//! - [`reference`] - `ReferenceBuilder` and `ReferenceSimulation`

pub mod checkpoint;
pub mod config;
pub mod constraints;
pub mod context;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod minimize;
pub mod progress;
pub mod reference;
pub mod simulation;
pub mod state;
