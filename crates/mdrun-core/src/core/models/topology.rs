/// A covalent bond between two atoms, stored as system atom indices with
/// `atom1_idx < atom2_idx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    pub atom1_idx: usize,
    pub atom2_idx: usize,
}

impl Bond {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            atom1_idx: a.min(b),
            atom2_idx: a.max(b),
        }
    }

    pub fn contains(&self, atom_idx: usize) -> bool {
        self.atom1_idx == atom_idx || self.atom2_idx == atom_idx
    }

    /// Returns the bonded partner of `atom_idx`, if it is part of this bond.
    pub fn partner(&self, atom_idx: usize) -> Option<usize> {
        if self.atom1_idx == atom_idx {
            Some(self.atom2_idx)
        } else if self.atom2_idx == atom_idx {
            Some(self.atom1_idx)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_new_orders_indices() {
        let bond = Bond::new(7, 3);
        assert_eq!(bond.atom1_idx, 3);
        assert_eq!(bond.atom2_idx, 7);
        assert_eq!(bond, Bond::new(3, 7));
    }

    #[test]
    fn bond_partner_and_contains_agree() {
        let bond = Bond::new(1, 2);
        assert!(bond.contains(1));
        assert!(bond.contains(2));
        assert!(!bond.contains(3));
        assert_eq!(bond.partner(1), Some(2));
        assert_eq!(bond.partner(2), Some(1));
        assert_eq!(bond.partner(3), None);
    }
}
