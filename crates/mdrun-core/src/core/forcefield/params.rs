use crate::core::models::atom::Element;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomTypeParam {
    pub element: String,
    /// Mass in amu; the element's standard mass is used when absent.
    pub mass: Option<f64>,
    pub charge: f64,
    /// Lennard-Jones sigma in nm.
    pub sigma: f64,
    /// Lennard-Jones well depth in kJ/mol.
    pub epsilon: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ResidueTemplate {
    /// Atom name -> atom type name.
    pub atoms: HashMap<String, String>,
    /// Intra-residue bonds by atom name.
    #[serde(default)]
    pub bonds: Vec<[String; 2]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BondParam {
    pub types: [String; 2],
    /// Equilibrium length in nm.
    pub length: f64,
    /// Force constant in kJ/mol/nm².
    pub k: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AngleParam {
    pub types: [String; 3],
    /// Equilibrium angle in degrees.
    pub angle: f64,
    /// Force constant in kJ/mol/rad².
    pub k: f64,
}

/// The contents of one force-field TOML file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForceFieldFile {
    #[serde(default)]
    pub atom_types: HashMap<String, AtomTypeParam>,
    #[serde(default)]
    pub residues: HashMap<String, ResidueTemplate>,
    #[serde(default)]
    pub bonds: Vec<BondParam>,
    #[serde(default)]
    pub angles: Vec<AngleParam>,
}

/// A resolved atom type with its element parsed and its mass filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    pub name: String,
    pub element: Element,
    pub mass: f64,
    pub charge: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

pub type BondKey = (String, String);
pub type AngleKey = (String, String, String);

/// Order-independent lookup key for a bond between two atom types.
pub fn bond_key(a: &str, b: &str) -> BondKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Lookup key for an angle; the outer types are ordered, the center stays in place.
pub fn angle_key(a: &str, center: &str, c: &str) -> AngleKey {
    if a <= c {
        (a.to_string(), center.to_string(), c.to_string())
    } else {
        (c.to_string(), center.to_string(), a.to_string())
    }
}

/// Force-field parameters merged from one or more files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forcefield {
    pub atom_types: HashMap<String, AtomType>,
    pub residues: HashMap<String, ResidueTemplate>,
    pub bonds: HashMap<BondKey, BondParam>,
    pub angles: HashMap<AngleKey, AngleParam>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}", path = path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unknown force field '{id}' (searched: {searched:?})")]
    UnknownForceField { id: String, searched: Vec<PathBuf> },
    #[error("{kind} '{key}' defined more than once (again in '{source_name}')")]
    Duplicate {
        kind: &'static str,
        key: String,
        source_name: String,
    },
    #[error("Atom type '{atom_type}' has unknown element '{element}'")]
    UnknownElement { atom_type: String, element: String },
    #[error("{context} references undefined atom type '{atom_type}'")]
    UnknownAtomType { context: String, atom_type: String },
    #[error("Invalid value for {field} of '{key}': {value}")]
    InvalidValue {
        field: &'static str,
        key: String,
        value: f64,
    },
}

fn require(valid: bool, field: &'static str, key: &str, value: f64) -> Result<(), ParamLoadError> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(ParamLoadError::InvalidValue {
            field,
            key: key.to_string(),
            value,
        })
    }
}

impl Forcefield {
    /// Loads and merges the given files in order.
    pub fn load(paths: &[PathBuf]) -> Result<Self, ParamLoadError> {
        let mut forcefield = Self::default();
        for path in paths {
            let file = Self::load_file(path)?;
            forcefield.merge(file, &path.display().to_string())?;
        }
        forcefield.validate_references()?;
        Ok(forcefield)
    }

    fn load_file(path: &Path) -> Result<ForceFieldFile, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Merges one file into this force field. Redefinitions are errors.
    pub fn merge(&mut self, file: ForceFieldFile, source_name: &str) -> Result<(), ParamLoadError> {
        let duplicate = |kind: &'static str, key: String| ParamLoadError::Duplicate {
            kind,
            key,
            source_name: source_name.to_string(),
        };

        for (name, param) in file.atom_types {
            if self.atom_types.contains_key(&name) {
                return Err(duplicate("Atom type", name));
            }
            let element: Element =
                param
                    .element
                    .parse()
                    .map_err(|_| ParamLoadError::UnknownElement {
                        atom_type: name.clone(),
                        element: param.element.clone(),
                    })?;
            let mass = param.mass.unwrap_or_else(|| element.mass());
            require(mass > 0.0, "mass", &name, mass)?;
            require(param.sigma >= 0.0, "sigma", &name, param.sigma)?;
            require(param.epsilon >= 0.0, "epsilon", &name, param.epsilon)?;
            require(true, "charge", &name, param.charge)?;
            self.atom_types.insert(
                name.clone(),
                AtomType {
                    name,
                    element,
                    mass,
                    charge: param.charge,
                    sigma: param.sigma,
                    epsilon: param.epsilon,
                },
            );
        }

        for (name, template) in file.residues {
            if self.residues.contains_key(&name) {
                return Err(duplicate("Residue template", name));
            }
            self.residues.insert(name, template);
        }

        for bond in file.bonds {
            let key = bond_key(&bond.types[0], &bond.types[1]);
            let label = format!("{}-{}", key.0, key.1);
            require(bond.length > 0.0, "length", &label, bond.length)?;
            require(bond.k >= 0.0, "k", &label, bond.k)?;
            if self.bonds.contains_key(&key) {
                return Err(duplicate("Bond parameter", label));
            }
            self.bonds.insert(key, bond);
        }

        for angle in file.angles {
            let key = angle_key(&angle.types[0], &angle.types[1], &angle.types[2]);
            let label = format!("{}-{}-{}", key.0, key.1, key.2);
            require(
                angle.angle > 0.0 && angle.angle <= 180.0,
                "angle",
                &label,
                angle.angle,
            )?;
            require(angle.k >= 0.0, "k", &label, angle.k)?;
            if self.angles.contains_key(&key) {
                return Err(duplicate("Angle parameter", label));
            }
            self.angles.insert(key, angle);
        }
        Ok(())
    }

    /// Checks that every template, bond and angle refers to a defined atom type.
    pub fn validate_references(&self) -> Result<(), ParamLoadError> {
        let check = |context: String, atom_type: &str| {
            if self.atom_types.contains_key(atom_type) {
                Ok(())
            } else {
                Err(ParamLoadError::UnknownAtomType {
                    context,
                    atom_type: atom_type.to_string(),
                })
            }
        };
        for (res_name, template) in &self.residues {
            for (atom_name, atom_type) in &template.atoms {
                check(format!("Residue {} atom {}", res_name, atom_name), atom_type)?;
            }
        }
        for (a, b) in self.bonds.keys() {
            check(format!("Bond {}-{}", a, b), a)?;
            check(format!("Bond {}-{}", a, b), b)?;
        }
        for (a, b, c) in self.angles.keys() {
            for t in [a, b, c] {
                check(format!("Angle {}-{}-{}", a, b, c), t)?;
            }
        }
        Ok(())
    }

    pub fn bond(&self, type1: &str, type2: &str) -> Option<&BondParam> {
        self.bonds.get(&bond_key(type1, type2))
    }

    pub fn angle(&self, type1: &str, center: &str, type3: &str) -> Option<&AngleParam> {
        self.angles.get(&angle_key(type1, center, type3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WATER_TOML: &str = r#"
        [atom_types.OW]
        element = "O"
        charge = -0.834
        sigma = 0.315061
        epsilon = 0.636386

        [atom_types.HW]
        element = "H"
        charge = 0.417
        sigma = 0.0
        epsilon = 0.0

        [residues.HOH]
        atoms = { O = "OW", H1 = "HW", H2 = "HW" }
        bonds = [["O", "H1"], ["O", "H2"]]

        [[bonds]]
        types = ["OW", "HW"]
        length = 0.09572
        k = 462750.4

        [[angles]]
        types = ["HW", "OW", "HW"]
        angle = 104.52
        k = 836.8
    "#;

    const ARGON_TOML: &str = r#"
        [atom_types.Ar]
        element = "Ar"
        charge = 0.0
        sigma = 0.3405
        epsilon = 0.996

        [residues.AR]
        atoms = { AR = "Ar" }
    "#;

    #[test]
    fn load_parses_and_resolves_element_masses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.toml");
        fs::write(&path, WATER_TOML).unwrap();

        let ff = Forcefield::load(&[path]).unwrap();
        let ow = &ff.atom_types["OW"];
        assert_eq!(ow.element, Element::O);
        assert!((ow.mass - Element::O.mass()).abs() < 1e-12);
        assert_eq!(ff.residues["HOH"].bonds.len(), 2);
        assert_eq!(ff.bond("HW", "OW").unwrap().length, 0.09572);
        assert_eq!(ff.angle("HW", "OW", "HW").unwrap().angle, 104.52);
        assert!(ff.angle("OW", "HW", "HW").is_none());
    }

    #[test]
    fn load_merges_multiple_files_in_order() {
        let dir = tempdir().unwrap();
        let water = dir.path().join("water.toml");
        let argon = dir.path().join("argon.toml");
        fs::write(&water, WATER_TOML).unwrap();
        fs::write(&argon, ARGON_TOML).unwrap();

        let ff = Forcefield::load(&[water, argon]).unwrap();
        assert_eq!(ff.atom_types.len(), 3);
        assert!(ff.residues.contains_key("AR"));
        assert!(ff.residues.contains_key("HOH"));
    }

    #[test]
    fn redefining_an_atom_type_is_an_error() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        fs::write(&a, ARGON_TOML).unwrap();
        fs::write(&b, ARGON_TOML).unwrap();
        assert!(matches!(
            Forcefield::load(&[a, b]),
            Err(ParamLoadError::Duplicate { kind: "Atom type", .. })
        ));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = Forcefield::load(&[dir.path().join("missing.toml")]);
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml_and_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not toml").unwrap();
        assert!(matches!(
            Forcefield::load(&[path.clone()]),
            Err(ParamLoadError::Toml { .. })
        ));

        fs::write(&path, "[dihedrals]\nfoo = 1\n").unwrap();
        assert!(matches!(
            Forcefield::load(&[path]),
            Err(ParamLoadError::Toml { .. })
        ));
    }

    #[test]
    fn template_referencing_undefined_type_is_rejected() {
        let mut ff = Forcefield::default();
        let file: ForceFieldFile =
            toml::from_str("[residues.XXX]\natoms = { A = \"Nope\" }\n").unwrap();
        ff.merge(file, "inline").unwrap();
        assert!(matches!(
            ff.validate_references(),
            Err(ParamLoadError::UnknownAtomType { .. })
        ));
    }

    #[test]
    fn unknown_element_and_negative_values_are_rejected() {
        let mut ff = Forcefield::default();
        let file: ForceFieldFile = toml::from_str(
            "[atom_types.X]\nelement = \"Qq\"\ncharge = 0.0\nsigma = 0.1\nepsilon = 0.1\n",
        )
        .unwrap();
        assert!(matches!(
            ff.merge(file, "inline"),
            Err(ParamLoadError::UnknownElement { .. })
        ));

        let file: ForceFieldFile = toml::from_str(
            "[atom_types.X]\nelement = \"C\"\ncharge = 0.0\nsigma = -0.1\nepsilon = 0.1\n",
        )
        .unwrap();
        assert!(matches!(
            ff.merge(file, "inline"),
            Err(ParamLoadError::InvalidValue { field: "sigma", .. })
        ));
    }

    #[test]
    fn bond_and_angle_keys_are_order_independent() {
        assert_eq!(bond_key("OW", "HW"), bond_key("HW", "OW"));
        assert_eq!(angle_key("A", "B", "C"), angle_key("C", "B", "A"));
        assert_ne!(angle_key("A", "B", "C"), angle_key("B", "A", "C"));
    }
}
