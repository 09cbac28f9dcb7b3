use super::residue::Residue;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: char,
    /// Whether the chain was read from HETATM records.
    pub is_hetero: bool,
    pub(crate) residues: Vec<Residue>,
    pub(crate) residue_map: HashMap<isize, usize>,
}

impl Chain {
    pub(crate) fn new(id: char, is_hetero: bool) -> Self {
        Self {
            id,
            is_hetero,
            residues: Vec::new(),
            residue_map: HashMap::new(),
        }
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, number: isize) -> Option<&Residue> {
        self.residue_map
            .get(&number)
            .and_then(|&idx| self.residues.get(idx))
    }
}
