use nalgebra::{Point3, Vector3};

/// A read-only view of a simulation's state at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub step: u64,
    /// Simulated time in ps.
    pub time: f64,
    /// Positions in nm, in topology atom order.
    pub positions: Vec<Point3<f64>>,
    /// Velocities in nm/ps.
    pub velocities: Vec<Vector3<f64>>,
    /// kJ/mol
    pub potential_energy: f64,
    /// kJ/mol
    pub kinetic_energy: f64,
    /// Instantaneous temperature in K.
    pub temperature: f64,
}
