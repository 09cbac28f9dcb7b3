use super::params::Forcefield;
use crate::core::models::system::MolecularSystem;
use crate::core::models::topology::Bond;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParameterizationError {
    #[error("No residue template for '{residue_name}' (chain {chain_id}, residue {residue_number})")]
    MissingTemplate {
        residue_name: String,
        chain_id: char,
        residue_number: isize,
    },
    #[error("Residue template '{residue_name}' has no atom named '{atom_name}'")]
    MissingTemplateAtom {
        residue_name: String,
        atom_name: String,
    },
    #[error("No bond parameters for atom types {type1}-{type2}")]
    MissingBondParameters { type1: String, type2: String },
    #[error("No angle parameters for atom types {type1}-{type2}-{type3}")]
    MissingAngleParameters {
        type1: String,
        type2: String,
        type3: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomParams {
    pub type_name: String,
    pub mass: f64,
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
    pub is_hydrogen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondTerm {
    pub bond: Bond,
    /// Equilibrium length in nm.
    pub length: f64,
    pub k: f64,
    pub involves_hydrogen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleTerm {
    /// Outer, center, outer.
    pub atoms: [usize; 3],
    /// Equilibrium angle in radians.
    pub theta0: f64,
    pub k: f64,
}

/// A molecular system with every atom typed and every bonded term parameterized.
#[derive(Debug, Clone)]
pub struct ParameterizedSystem {
    /// The input system with template bonds merged into its bond list.
    pub topology: MolecularSystem,
    pub atoms: Vec<AtomParams>,
    pub bonds: Vec<BondTerm>,
    pub angles: Vec<AngleTerm>,
    /// For each atom, the sorted indices of atoms excluded from nonbonded interactions
    /// (1-2 and 1-3 neighbors).
    pub exclusions: Vec<Vec<usize>>,
}

impl ParameterizedSystem {
    #[inline]
    pub fn is_excluded(&self, i: usize, j: usize) -> bool {
        self.exclusions[i].binary_search(&j).is_ok()
    }
}

pub struct Parameterizer<'a> {
    forcefield: &'a Forcefield,
}

impl<'a> Parameterizer<'a> {
    pub fn new(forcefield: &'a Forcefield) -> Self {
        Self { forcefield }
    }

    pub fn parameterize(
        &self,
        system: &MolecularSystem,
    ) -> Result<ParameterizedSystem, ParameterizationError> {
        let (atoms, template_bonds) = self.assign_atom_types(system)?;

        let mut topology = system.clone();
        topology.merge_bonds(template_bonds);

        let bonds = self.bond_terms(&topology, &atoms)?;
        let neighbors = adjacency(topology.atom_count(), topology.bonds());
        let angles = self.angle_terms(&neighbors, &atoms)?;
        let exclusions = exclusions(&neighbors);

        debug!(
            atoms = atoms.len(),
            bonds = bonds.len(),
            angles = angles.len(),
            "Parameterized system"
        );

        Ok(ParameterizedSystem {
            topology,
            atoms,
            bonds,
            angles,
            exclusions,
        })
    }

    fn assign_atom_types(
        &self,
        system: &MolecularSystem,
    ) -> Result<(Vec<AtomParams>, Vec<Bond>), ParameterizationError> {
        let mut params: Vec<Option<AtomParams>> = vec![None; system.atom_count()];
        let mut template_bonds = Vec::new();

        for (chain, residue) in system.residues() {
            let template = self.forcefield.residues.get(&residue.name).ok_or_else(|| {
                ParameterizationError::MissingTemplate {
                    residue_name: residue.name.clone(),
                    chain_id: chain.id,
                    residue_number: residue.number,
                }
            })?;

            for &atom_idx in &residue.atom_indices {
                let atom = &system.atoms()[atom_idx];
                let type_name = template.atoms.get(&atom.name).ok_or_else(|| {
                    ParameterizationError::MissingTemplateAtom {
                        residue_name: residue.name.clone(),
                        atom_name: atom.name.clone(),
                    }
                })?;
                // Template references are checked when the force field is loaded.
                let Some(atom_type) = self.forcefield.atom_types.get(type_name) else {
                    return Err(ParameterizationError::MissingTemplateAtom {
                        residue_name: residue.name.clone(),
                        atom_name: atom.name.clone(),
                    });
                };
                if atom_type.element != atom.element {
                    warn!(
                        "Atom '{}' in residue {} {} is {} in the structure but typed as {} ({})",
                        atom.name,
                        residue.name,
                        residue.number,
                        atom.element,
                        atom_type.element,
                        type_name
                    );
                }
                params[atom_idx] = Some(AtomParams {
                    type_name: type_name.clone(),
                    mass: atom_type.mass,
                    charge: atom_type.charge,
                    sigma: atom_type.sigma,
                    epsilon: atom_type.epsilon,
                    is_hydrogen: atom_type.element.is_hydrogen(),
                });
            }

            for [name1, name2] in &template.bonds {
                match (residue.atom_index(name1), residue.atom_index(name2)) {
                    (Some(a), Some(b)) if a != b => template_bonds.push(Bond::new(a, b)),
                    _ => debug!(
                        "Skipping template bond {}-{} in residue {} {}: atom not present",
                        name1, name2, residue.name, residue.number
                    ),
                }
            }
        }

        // Every atom belongs to exactly one residue, so every slot is filled.
        let atoms = params.into_iter().flatten().collect::<Vec<_>>();
        Ok((atoms, template_bonds))
    }

    fn bond_terms(
        &self,
        topology: &MolecularSystem,
        atoms: &[AtomParams],
    ) -> Result<Vec<BondTerm>, ParameterizationError> {
        topology
            .bonds()
            .iter()
            .map(|bond| {
                let a = &atoms[bond.atom1_idx];
                let b = &atoms[bond.atom2_idx];
                let param = self.forcefield.bond(&a.type_name, &b.type_name).ok_or_else(|| {
                    ParameterizationError::MissingBondParameters {
                        type1: a.type_name.clone(),
                        type2: b.type_name.clone(),
                    }
                })?;
                Ok(BondTerm {
                    bond: *bond,
                    length: param.length,
                    k: param.k,
                    involves_hydrogen: a.is_hydrogen || b.is_hydrogen,
                })
            })
            .collect()
    }

    fn angle_terms(
        &self,
        neighbors: &[BTreeSet<usize>],
        atoms: &[AtomParams],
    ) -> Result<Vec<AngleTerm>, ParameterizationError> {
        let mut terms = Vec::new();
        for (center, bonded) in neighbors.iter().enumerate() {
            let bonded: Vec<usize> = bonded.iter().copied().collect();
            for (n, &i) in bonded.iter().enumerate() {
                for &k in &bonded[n + 1..] {
                    let (ti, tj, tk) = (
                        &atoms[i].type_name,
                        &atoms[center].type_name,
                        &atoms[k].type_name,
                    );
                    let param = self.forcefield.angle(ti, tj, tk).ok_or_else(|| {
                        ParameterizationError::MissingAngleParameters {
                            type1: ti.clone(),
                            type2: tj.clone(),
                            type3: tk.clone(),
                        }
                    })?;
                    terms.push(AngleTerm {
                        atoms: [i, center, k],
                        theta0: param.angle.to_radians(),
                        k: param.k,
                    });
                }
            }
        }
        Ok(terms)
    }
}

fn adjacency(atom_count: usize, bonds: &[Bond]) -> Vec<BTreeSet<usize>> {
    let mut neighbors = vec![BTreeSet::new(); atom_count];
    for bond in bonds {
        neighbors[bond.atom1_idx].insert(bond.atom2_idx);
        neighbors[bond.atom2_idx].insert(bond.atom1_idx);
    }
    neighbors
}

fn exclusions(neighbors: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    neighbors
        .iter()
        .enumerate()
        .map(|(i, direct)| {
            let mut excluded: BTreeSet<usize> = direct.clone();
            for &j in direct {
                excluded.extend(neighbors[j].iter().copied().filter(|&k| k != i));
            }
            excluded.into_iter().collect()
        })
        .collect()
}
