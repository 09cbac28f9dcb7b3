use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub number: isize,                 // Residue sequence number from the structure file
    pub name: String,                  // Residue name (e.g., "HOH", "ALA")
    pub atom_indices: Vec<usize>,      // Indices into the system's atom list
    atom_map: HashMap<String, usize>,  // Atom name -> system atom index
}

impl Residue {
    pub(crate) fn new(number: isize, name: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            atom_indices: Vec::new(),
            atom_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, name: &str, index: usize) {
        self.atom_indices.push(index);
        self.atom_map.entry(name.to_string()).or_insert(index);
    }

    /// Returns the system index of the first atom with the given name.
    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atom_map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_lookup_by_name_returns_first_occurrence() {
        let mut residue = Residue::new(1, "HOH");
        residue.add_atom("O", 0);
        residue.add_atom("H1", 1);
        residue.add_atom("H1", 2);
        assert_eq!(residue.atom_index("O"), Some(0));
        assert_eq!(residue.atom_index("H1"), Some(1));
        assert_eq!(residue.atom_index("H2"), None);
        assert_eq!(residue.atom_indices, vec![0, 1, 2]);
    }
}
