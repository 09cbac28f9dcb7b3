use nalgebra::Point3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements recognized in structure files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    H,
    He,
    Li,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Fe,
    Cu,
    Zn,
    Br,
    Kr,
    I,
    Xe,
}

static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "H" => Element::H,
    "D" => Element::H,
    "HE" => Element::He,
    "LI" => Element::Li,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "NE" => Element::Ne,
    "NA" => Element::Na,
    "MG" => Element::Mg,
    "P" => Element::P,
    "S" => Element::S,
    "CL" => Element::Cl,
    "AR" => Element::Ar,
    "K" => Element::K,
    "CA" => Element::Ca,
    "FE" => Element::Fe,
    "CU" => Element::Cu,
    "ZN" => Element::Zn,
    "BR" => Element::Br,
    "KR" => Element::Kr,
    "I" => Element::I,
    "XE" => Element::Xe,
};

impl Element {
    /// Standard atomic mass in amu.
    pub fn mass(self) -> f64 {
        match self {
            Self::H => 1.007947,
            Self::He => 4.003,
            Self::Li => 6.941,
            Self::C => 12.01078,
            Self::N => 14.00672,
            Self::O => 15.99943,
            Self::F => 18.998,
            Self::Ne => 20.18,
            Self::Na => 22.98977,
            Self::Mg => 24.305,
            Self::P => 30.973762,
            Self::S => 32.0655,
            Self::Cl => 35.453,
            Self::Ar => 39.948,
            Self::K => 39.0983,
            Self::Ca => 40.078,
            Self::Fe => 55.845,
            Self::Cu => 63.546,
            Self::Zn => 65.409,
            Self::Br => 79.904,
            Self::Kr => 83.798,
            Self::I => 126.90447,
            Self::Xe => 131.293,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::H => "H",
            Self::He => "He",
            Self::Li => "Li",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::F => "F",
            Self::Ne => "Ne",
            Self::Na => "Na",
            Self::Mg => "Mg",
            Self::P => "P",
            Self::S => "S",
            Self::Cl => "Cl",
            Self::Ar => "Ar",
            Self::K => "K",
            Self::Ca => "Ca",
            Self::Fe => "Fe",
            Self::Cu => "Cu",
            Self::Zn => "Zn",
            Self::Br => "Br",
            Self::Kr => "Kr",
            Self::I => "I",
            Self::Xe => "Xe",
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Self::H
    }

    /// Guesses the element from a PDB atom name when the element columns are blank.
    ///
    /// Single-atom residues whose residue name equals the atom name (`NA`/`NA`, `AR`/`AR`)
    /// are looked up as whole symbols. Otherwise leading digits are skipped (`1HB` is a
    /// hydrogen) and the first letter decides, so `CA` in a protein stays a carbon.
    pub fn guess_from_atom_name(atom_name: &str, residue_name: &str) -> Option<Self> {
        let upper = atom_name.trim().to_ascii_uppercase();
        if upper == residue_name.trim().to_ascii_uppercase() {
            if let Some(&element) = ELEMENT_SYMBOLS.get(upper.as_str()) {
                return Some(element);
            }
        }
        let first = upper
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .chars()
            .next()?;
        ELEMENT_SYMBOLS.get(first.to_string().as_str()).copied()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ELEMENT_SYMBOLS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An atom of the simulated system.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Position of the atom in the system's atom list.
    pub index: usize,
    /// Serial number from the structure file.
    pub serial: usize,
    /// Atom name within its residue (e.g., "CA", "OW").
    pub name: String,
    pub element: Element,
    /// Coordinates in nanometers.
    pub position: Point3<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_parses_case_insensitively() {
        assert_eq!("o".parse::<Element>(), Ok(Element::O));
        assert_eq!(" Cl ".parse::<Element>(), Ok(Element::Cl));
        assert_eq!("NA".parse::<Element>(), Ok(Element::Na));
        assert_eq!("D".parse::<Element>(), Ok(Element::H));
    }

    #[test]
    fn unknown_element_symbol_is_rejected() {
        assert_eq!(
            "Qq".parse::<Element>(),
            Err(ParseElementError("Qq".to_string()))
        );
    }

    #[test]
    fn guess_from_atom_name_skips_digits_and_uses_first_letter() {
        assert_eq!(Element::guess_from_atom_name("1HB", "ALA"), Some(Element::H));
        assert_eq!(Element::guess_from_atom_name("CA", "ALA"), Some(Element::C));
        assert_eq!(Element::guess_from_atom_name("OW", "HOH"), Some(Element::O));
        assert_eq!(Element::guess_from_atom_name("", "HOH"), None);
    }

    #[test]
    fn guess_from_atom_name_treats_single_atom_residues_as_ions() {
        assert_eq!(Element::guess_from_atom_name("CA", "CA"), Some(Element::Ca));
        assert_eq!(Element::guess_from_atom_name("AR", "AR"), Some(Element::Ar));
        assert_eq!(Element::guess_from_atom_name("CL", " cl"), Some(Element::Cl));
    }

    #[test]
    fn masses_are_positive_and_hydrogen_is_lightest() {
        assert!(Element::H.mass() < Element::He.mass());
        assert!((Element::Ar.mass() - 39.948).abs() < 1e-9);
        assert!(Element::H.is_hydrogen());
        assert!(!Element::O.is_hydrogen());
    }
}
