use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Element;
use crate::core::models::system::{
    MolecularSystem, MolecularSystemBuilder, SystemBuildError, UnitCell,
};
use crate::core::units::ANGSTROMS_PER_NM;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data on line {line}: {source}")]
    Inconsistency {
        line: usize,
        #[source]
        source: SystemBuildError,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: &'static str },
    #[error("Line is too short for {record} record (must be at least {min} chars)")]
    LineTooShort { record: &'static str, min: usize },
    #[error("Cannot determine element for atom '{atom_name}'")]
    UnknownElement { atom_name: String },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &'static str,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns,
            value: value.into(),
        },
    })
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &'static str,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.into(),
        },
    })
}

/// Reader and writer for the Protein Data Bank text format.
///
/// Only the first model is read. Coordinates are converted from Å to nm on input and
/// back on output. `CONECT` records become bonds; `CRYST1` becomes the unit cell.
pub struct PdbFile;

impl PdbFile {
    fn parse_cryst1(line: &str, line_num: usize) -> Result<UnitCell, PdbError> {
        if line.len() < 54 {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::LineTooShort {
                    record: "CRYST1",
                    min: 54,
                },
            });
        }
        let a = parse_float(line, line_num, 6, 15, "7-15")?;
        let b = parse_float(line, line_num, 15, 24, "16-24")?;
        let c = parse_float(line, line_num, 24, 33, "25-33")?;
        let alpha = parse_float(line, line_num, 33, 40, "34-40")?;
        let beta = parse_float(line, line_num, 40, 47, "41-47")?;
        let gamma = parse_float(line, line_num, 47, 54, "48-54")?;
        Ok(UnitCell {
            lengths: [a, b, c].map(|x| x / ANGSTROMS_PER_NM).into(),
            angles: [alpha, beta, gamma].into(),
        })
    }

    fn parse_conect(line: &str, line_num: usize) -> Result<Vec<(usize, usize)>, PdbError> {
        let origin: usize = parse_int(line, line_num, 6, 11, "7-11")?;
        const PARTNER_COLUMNS: [(usize, usize, &str); 4] = [
            (11, 16, "12-16"),
            (16, 21, "17-21"),
            (21, 26, "22-26"),
            (26, 31, "27-31"),
        ];
        let mut pairs = Vec::new();
        for (start, end, columns) in PARTNER_COLUMNS {
            if slice_and_trim(line, start, end).is_empty() {
                continue;
            }
            let partner: usize = parse_int(line, line_num, start, end, columns)?;
            pairs.push((origin, partner));
        }
        Ok(pairs)
    }
}

impl MolecularFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<MolecularSystem, Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut conect: Vec<(usize, usize, usize)> = Vec::new();
        let mut atom_count = 0usize;

        let mut current_chain_id: Option<char> = None;
        let mut current_residue: Option<(isize, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort {
                                record: "ATOM/HETATM",
                                min: 54,
                            },
                        });
                    }
                    let serial: usize = parse_int(&line, line_num, 6, 11, "7-11")?;
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField { columns: "13-16" },
                        });
                    }
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_id = slice_and_trim(&line, 21, 22).chars().next().unwrap_or('A');
                    let res_seq: isize = parse_int(&line, line_num, 22, 26, "23-26")?;
                    let x = parse_float(&line, line_num, 30, 38, "31-38")?;
                    let y = parse_float(&line, line_num, 38, 46, "39-46")?;
                    let z = parse_float(&line, line_num, 46, 54, "47-54")?;

                    let element_str = slice_and_trim(&line, 76, 78);
                    let element = element_str
                        .parse::<Element>()
                        .ok()
                        .or_else(|| Element::guess_from_atom_name(name, res_name))
                        .ok_or_else(|| PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::UnknownElement {
                                atom_name: name.to_string(),
                            },
                        })?;

                    let inconsistency = |source| PdbError::Inconsistency {
                        line: line_num,
                        source,
                    };

                    if current_chain_id != Some(chain_id) {
                        builder.start_chain(chain_id, record_type == "HETATM");
                        current_chain_id = Some(chain_id);
                        current_residue = None;
                    }
                    let residue_key = (res_seq, res_name.to_string());
                    if current_residue.as_ref() != Some(&residue_key) {
                        builder
                            .start_residue(res_seq, res_name)
                            .map_err(inconsistency)?;
                        current_residue = Some(residue_key);
                    }
                    let position = Point3::new(x, y, z) / ANGSTROMS_PER_NM;
                    builder
                        .add_atom(serial, name, element, position)
                        .map_err(inconsistency)?;
                    atom_count += 1;
                }
                "CONECT" => {
                    for (a, b) in Self::parse_conect(&line, line_num)? {
                        conect.push((line_num, a, b));
                    }
                }
                "CRYST1" => {
                    let cell = Self::parse_cryst1(&line, line_num)?;
                    builder.unit_cell(cell);
                }
                "ENDMDL" | "END" => break,
                _ => {}
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        for (line, a, b) in conect {
            if a == b {
                continue;
            }
            builder
                .add_bond(a, b)
                .map_err(|source| PdbError::Inconsistency { line, source })?;
        }
        Ok(builder.build())
    }

    fn write_to(system: &MolecularSystem, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "REMARK   1 CREATED WITH MDRUN {}", env!("CARGO_PKG_VERSION"))?;
        if let Some(cell) = system.unit_cell() {
            let lengths = cell.lengths * ANGSTROMS_PER_NM;
            writeln!(
                writer,
                "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
                lengths.x, lengths.y, lengths.z, cell.angles.x, cell.angles.y, cell.angles.z
            )?;
        }

        for chain in system.chains() {
            let record_type = if chain.is_hetero { "HETATM" } else { "ATOM" };
            let mut last_serial = 0;
            let mut last_residue = None;
            for residue in chain.residues() {
                for &atom_idx in &residue.atom_indices {
                    let Some(atom) = system.get_atom(atom_idx) else {
                        continue;
                    };
                    let symbol = atom.element.symbol();
                    let name = if atom.name.len() < 4 && symbol.len() == 1 {
                        format!(" {:<3}", atom.name)
                    } else {
                        format!("{:<4}", atom.name)
                    };
                    let position = atom.position * ANGSTROMS_PER_NM;
                    writeln!(
                        writer,
                        "{:<6}{:>5} {} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}  ",
                        record_type,
                        atom.serial,
                        name,
                        residue.name,
                        chain.id,
                        residue.number,
                        position.x,
                        position.y,
                        position.z,
                        1.0,
                        0.0,
                        symbol.to_ascii_uppercase()
                    )?;
                    last_serial = atom.serial;
                    last_residue = Some(residue);
                }
            }
            if let Some(residue) = last_residue {
                writeln!(
                    writer,
                    "TER   {:>5}      {:>3} {}{:>4}",
                    last_serial + 1,
                    residue.name,
                    chain.id,
                    residue.number
                )?;
            }
        }

        let mut partners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let serial_of: HashMap<usize, usize> = system
            .atoms()
            .iter()
            .map(|a| (a.index, a.serial))
            .collect();
        for bond in system.bonds() {
            let (Some(&s1), Some(&s2)) = (
                serial_of.get(&bond.atom1_idx),
                serial_of.get(&bond.atom2_idx),
            ) else {
                continue;
            };
            partners.entry(s1).or_default().push(s2);
            partners.entry(s2).or_default().push(s1);
        }
        for (serial, bonded) in &partners {
            for chunk in bonded.chunks(4) {
                write!(writer, "CONECT{:>5}", serial)?;
                for partner in chunk {
                    write!(writer, "{:>5}", partner)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::Bond;
    use std::io::Cursor;

    const WATER_PDB: &str = "\
REMARK   test water
CRYST1   30.000   30.000   30.000  90.00  90.00  90.00 P 1           1
HETATM    1  O   HOH A   1       0.000   0.000   0.000  1.00  0.00           O
HETATM    2  H1  HOH A   1       0.957   0.000   0.000  1.00  0.00           H
HETATM    3  H2  HOH A   1      -0.240   0.927   0.000  1.00  0.00           H
CONECT    1    2    3
END
";

    fn read(text: &str) -> Result<MolecularSystem, PdbError> {
        PdbFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn read_parses_atoms_bonds_and_cell_in_nanometers() {
        let system = read(WATER_PDB).unwrap();
        assert_eq!(system.atom_count(), 3);
        let h1 = system.get_atom_by_serial(2).unwrap();
        assert_eq!(h1.element, Element::H);
        assert!((h1.position.x - 0.0957).abs() < 1e-12);
        assert_eq!(system.bonds(), &[Bond::new(0, 1), Bond::new(0, 2)]);
        let cell = system.unit_cell().unwrap();
        assert!((cell.lengths.x - 3.0).abs() < 1e-12);
        assert!(cell.is_orthorhombic());
        assert!(system.chains()[0].is_hetero);
    }

    #[test]
    fn read_guesses_element_when_columns_are_missing() {
        let text = "ATOM      1  CA  ALA A   1       1.000   2.000   3.000\nEND\n";
        let system = read(text).unwrap();
        assert_eq!(system.atoms()[0].element, Element::C);
    }

    #[test]
    fn read_stops_at_first_model() {
        let text = "\
MODEL        1
ATOM      1 AR    AR A   1       1.000   2.000   3.000  1.00  0.00          AR
ENDMDL
MODEL        2
ATOM      2 AR    AR A   2       1.000   2.000   3.000  1.00  0.00          AR
ENDMDL
";
        assert_eq!(read(text).unwrap().atom_count(), 1);
    }

    #[test]
    fn read_fails_without_atoms() {
        assert!(matches!(
            read("REMARK nothing\nEND\n"),
            Err(PdbError::MissingRecord(_))
        ));
    }

    #[test]
    fn read_reports_line_of_bad_coordinate() {
        let text = "ATOM      1  CA  ALA A   1       1.000   abcde   3.000  1.00  0.00           C\n";
        match read(text) {
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { columns, .. },
            }) => assert_eq!(columns, "39-46"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn read_rejects_short_atom_line() {
        assert!(matches!(
            read("ATOM      1  CA  ALA A   1       1.000\n"),
            Err(PdbError::Parse {
                kind: PdbParseErrorKind::LineTooShort { .. },
                ..
            })
        ));
    }

    #[test]
    fn read_rejects_conect_to_unknown_atom() {
        let text = "\
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C
CONECT    1    7
END
";
        assert!(matches!(
            read(text),
            Err(PdbError::Inconsistency {
                line: 2,
                source: SystemBuildError::UnknownSerial(7)
            })
        ));
    }

    #[test]
    fn write_then_read_preserves_topology_and_coordinates() {
        let system = read(WATER_PDB).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&system, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("REMARK"));
        assert!(text.contains("CRYST1   30.000   30.000   30.000"));
        assert!(text.contains("CONECT    1    2    3"));
        assert!(text.trim_end().ends_with("END"));

        let reread = read(&text).unwrap();
        assert_eq!(reread.bonds(), system.bonds());
        for (a, b) in reread.atoms().iter().zip(system.atoms()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.element, b.element);
            assert!((a.position - b.position).norm() < 1e-4);
        }
    }

    #[test]
    fn write_to_path_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdb");
        std::fs::write(&path, "stale contents that should disappear").unwrap();
        let system = read(WATER_PDB).unwrap();
        PdbFile::write_to_path(&system, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(read(&text).unwrap().atom_count(), 3);
    }
}
