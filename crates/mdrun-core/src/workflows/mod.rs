//! # Workflows Module
//!
//! The top-level entry point for running a simulation to completion.
//!
//! ## Overview
//!
//! A run is restartable: it may be killed at any moment and invoked again with the same
//! configuration. On each invocation the workflow in [`run`] decides once whether to resume
//! from the checkpoint file or to start cold from the input structure, runs only the steps
//! that remain, and writes the final structure when the target step count is reached.
//!
//! - [`run`] - Configuration, start-mode detection and the run controller itself
//! - [`reporters`] - The state-data and checkpoint observers attached to every run
//! - [`error`] - The fatal error kinds a run can end with

pub mod error;
pub mod reporters;
pub mod run;
