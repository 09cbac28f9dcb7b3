//! # mdrun Core Library
//!
//! A resumable driver for long-running molecular dynamics simulations, together with a
//! small reference engine that makes the driver usable end to end.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`), typed physical
//!   quantities, PDB structure I/O and force-field parameter files.
//!
//! - **[`engine`]: The Physics Collaborator.** The `Simulation`, `ModelBuilder` and `Reporter`
//!   traits the driver is written against, plus the reference implementation: nonbonded and
//!   bonded forces, SHAKE constraints, a Langevin integrator, an energy minimizer and the
//!   binary checkpoint codec.
//!
//! - **[`workflows`]: The Public API.** The run controller that decides between a cold start
//!   and a resume, attaches the reporting and checkpointing observers, consumes the remaining
//!   steps and writes the final structure.

pub mod core;
pub mod engine;
pub mod workflows;
