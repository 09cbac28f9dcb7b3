use super::atom::{Atom, Element};
use super::chain::Chain;
use super::residue::Residue;
use super::topology::Bond;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Periodic unit cell as given by a structure file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// Edge lengths in nanometers.
    pub lengths: Vector3<f64>,
    /// Cell angles alpha, beta, gamma in degrees.
    pub angles: Vector3<f64>,
}

impl UnitCell {
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self {
            lengths: Vector3::new(a, b, c),
            angles: Vector3::new(90.0, 90.0, 90.0),
        }
    }

    pub fn is_orthorhombic(&self) -> bool {
        self.angles.iter().all(|angle| (angle - 90.0).abs() < 1e-6)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemBuildError {
    #[error("Residue started before any chain")]
    NoCurrentChain,
    #[error("Atom '{0}' added before any residue")]
    NoCurrentResidue(String),
    #[error("Duplicate atom serial: {0}")]
    DuplicateSerial(usize),
    #[error("Bond references unknown atom serial {0}")]
    UnknownSerial(usize),
    #[error("Atom serial {0} cannot be bonded to itself")]
    SelfBond(usize),
    #[error("Expected {expected} positions, got {found}")]
    PositionCount { expected: usize, found: usize },
}

/// A complete molecular system: atoms grouped into residues and chains, covalent bonds,
/// and an optional periodic unit cell.
///
/// The atom list order is the order used by every engine array (positions, velocities,
/// forces), so an atom's `index` is stable for the lifetime of the system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolecularSystem {
    atoms: Vec<Atom>,
    chains: Vec<Chain>,
    bonds: Vec<Bond>,
    unit_cell: Option<UnitCell>,
    atom_serial_map: HashMap<usize, usize>,
    chain_id_map: HashMap<char, usize>,
}

impl MolecularSystem {
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn unit_cell(&self) -> Option<&UnitCell> {
        self.unit_cell.as_ref()
    }

    pub fn get_atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn get_atom_by_serial(&self, serial: usize) -> Option<&Atom> {
        self.atom_serial_map
            .get(&serial)
            .and_then(|&idx| self.atoms.get(idx))
    }

    pub fn get_chain_by_id(&self, id: char) -> Option<&Chain> {
        self.chain_id_map
            .get(&id)
            .and_then(|&idx| self.chains.get(idx))
    }

    /// Iterates over every residue in chain order, paired with its chain.
    pub fn residues(&self) -> impl Iterator<Item = (&Chain, &Residue)> {
        self.chains
            .iter()
            .flat_map(|chain| chain.residues.iter().map(move |res| (chain, res)))
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|atom| atom.position).collect()
    }

    /// Returns a copy of this system with every atom moved to the given positions.
    pub fn with_positions(&self, positions: &[Point3<f64>]) -> Result<Self, SystemBuildError> {
        if positions.len() != self.atoms.len() {
            return Err(SystemBuildError::PositionCount {
                expected: self.atoms.len(),
                found: positions.len(),
            });
        }
        let mut system = self.clone();
        for (atom, position) in system.atoms.iter_mut().zip(positions) {
            atom.position = *position;
        }
        Ok(system)
    }

    /// Returns a copy of this system with a different unit cell.
    pub fn with_unit_cell(&self, unit_cell: Option<UnitCell>) -> Self {
        let mut system = self.clone();
        system.unit_cell = unit_cell;
        system
    }

    /// Adds bonds (by atom index) that are not already present.
    pub(crate) fn merge_bonds(&mut self, extra: impl IntoIterator<Item = Bond>) {
        let mut all: BTreeSet<Bond> = self.bonds.iter().copied().collect();
        all.extend(extra);
        self.bonds = all.into_iter().collect();
    }
}

pub struct MolecularSystemBuilder {
    system: MolecularSystem,
    current_chain_idx: Option<usize>,
    current_residue_idx: Option<usize>,
    bonds: BTreeSet<Bond>,
}

impl Default for MolecularSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MolecularSystemBuilder {
    pub fn new() -> Self {
        Self {
            system: MolecularSystem::default(),
            current_chain_idx: None,
            current_residue_idx: None,
            bonds: BTreeSet::new(),
        }
    }

    pub fn start_chain(&mut self, id: char, is_hetero: bool) -> &mut Self {
        let idx = *self.system.chain_id_map.entry(id).or_insert_with(|| {
            let index = self.system.chains.len();
            self.system.chains.push(Chain::new(id, is_hetero));
            index
        });
        self.current_chain_idx = Some(idx);
        self.current_residue_idx = None;
        self
    }

    pub fn start_residue(
        &mut self,
        number: isize,
        name: &str,
    ) -> Result<&mut Self, SystemBuildError> {
        let chain_idx = self
            .current_chain_idx
            .ok_or(SystemBuildError::NoCurrentChain)?;
        let chain = &mut self.system.chains[chain_idx];

        let res_idx = *chain.residue_map.entry(number).or_insert_with(|| {
            let index = chain.residues.len();
            chain.residues.push(Residue::new(number, name));
            index
        });
        self.current_residue_idx = Some(res_idx);
        Ok(self)
    }

    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        element: Element,
        position: Point3<f64>,
    ) -> Result<&mut Self, SystemBuildError> {
        let (Some(chain_idx), Some(res_idx)) = (self.current_chain_idx, self.current_residue_idx)
        else {
            return Err(SystemBuildError::NoCurrentResidue(name.to_string()));
        };
        if self.system.atom_serial_map.contains_key(&serial) {
            return Err(SystemBuildError::DuplicateSerial(serial));
        }

        let atom_idx = self.system.atoms.len();
        self.system.atoms.push(Atom {
            index: atom_idx,
            serial,
            name: name.to_string(),
            element,
            position,
        });
        self.system.atom_serial_map.insert(serial, atom_idx);
        self.system.chains[chain_idx].residues[res_idx].add_atom(name, atom_idx);
        Ok(self)
    }

    /// Records a bond between two atoms identified by serial. Duplicate bonds collapse.
    pub fn add_bond(
        &mut self,
        serial1: usize,
        serial2: usize,
    ) -> Result<&mut Self, SystemBuildError> {
        if serial1 == serial2 {
            return Err(SystemBuildError::SelfBond(serial1));
        }
        let lookup = |serial: usize| {
            self.system
                .atom_serial_map
                .get(&serial)
                .copied()
                .ok_or(SystemBuildError::UnknownSerial(serial))
        };
        let idx1 = lookup(serial1)?;
        let idx2 = lookup(serial2)?;
        self.bonds.insert(Bond::new(idx1, idx2));
        Ok(self)
    }

    pub fn unit_cell(&mut self, cell: UnitCell) -> &mut Self {
        self.system.unit_cell = Some(cell);
        self
    }

    pub fn build(mut self) -> MolecularSystem {
        self.system.bonds = self.bonds.into_iter().collect();
        self.system
    }
}
