use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::system::MoleculeSystem;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

/// Per-atom data a PSF carries that has no place in [`MoleculeSystem`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PsfMetadata {
    pub segment_names: Vec<String>,
    pub masses: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum PsfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
}

fn parse_err(line: usize, message: impl Into<String>) -> PsfError {
    PsfError::Parse {
        line,
        message: message.into(),
    }
}

fn section_count(line: &str, line_no: usize) -> Result<usize, PsfError> {
    line.split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| parse_err(line_no, "invalid section count"))
}

/// Reader for CHARMM/X-PLOR protein structure files.
///
/// Only the atom and bond records are interpreted. PSF files hold no coordinates,
/// so every atom is placed at the origin.
pub struct PsfFile;

impl MolecularFile for PsfFile {
    type Metadata = PsfMetadata;
    type Error = PsfError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MoleculeSystem, Self::Metadata), Self::Error> {
        let lines: Vec<(usize, String)> = reader
            .lines()
            .enumerate()
            .map(|(i, l)| l.map(|v| (i + 1, v)))
            .collect::<Result<_, _>>()?;

        let mut system = MoleculeSystem::new("psf");
        let mut metadata = PsfMetadata::default();
        let mut serial_map: HashMap<usize, usize> = HashMap::new();
        let mut saw_atoms = false;

        let mut cursor = 0;
        while cursor < lines.len() {
            let (line_no, line) = &lines[cursor];
            cursor += 1;

            if line.contains("!NATOM") {
                saw_atoms = true;
                let count = section_count(line, *line_no)?;
                for _ in 0..count {
                    let (atom_line_no, atom_line) = lines
                        .get(cursor)
                        .ok_or_else(|| parse_err(*line_no, "NATOM section ended early"))?;
                    cursor += 1;
                    let parts: Vec<&str> = atom_line.split_whitespace().collect();
                    if parts.len() < 8 {
                        return Err(parse_err(*atom_line_no, "atom record needs 8 fields"));
                    }
                    let serial: usize = parts[0]
                        .parse()
                        .map_err(|_| parse_err(*atom_line_no, "invalid atom id"))?;
                    let residue_number: isize = parts[2]
                        .parse()
                        .map_err(|_| parse_err(*atom_line_no, "invalid residue id"))?;
                    let charge: f64 = parts[6]
                        .parse()
                        .map_err(|_| parse_err(*atom_line_no, "invalid charge"))?;
                    let mass: f64 = parts[7]
                        .parse()
                        .map_err(|_| parse_err(*atom_line_no, "invalid mass"))?;

                    serial_map.insert(serial, system.atom_count());
                    system.push_atom(
                        Atom::new(serial, parts[4], Point3::origin())
                            .with_residue(residue_number, parts[3])
                            .with_parameters(parts[5], charge),
                    );
                    metadata.segment_names.push(parts[1].to_string());
                    metadata.masses.push(mass);
                }
            } else if line.contains("!NBOND") {
                let count = section_count(line, *line_no)?;
                let mut ids = Vec::with_capacity(count * 2);
                while ids.len() < count * 2 {
                    let (bond_line_no, bond_line) = lines
                        .get(cursor)
                        .ok_or_else(|| parse_err(*line_no, "NBOND section ended early"))?;
                    cursor += 1;
                    for token in bond_line.split_whitespace() {
                        let id: usize = token
                            .parse()
                            .map_err(|_| parse_err(*bond_line_no, "invalid bond atom id"))?;
                        ids.push((*bond_line_no, id));
                    }
                }
                for pair in ids.chunks_exact(2) {
                    let (ln, a) = pair[0];
                    let (_, b) = pair[1];
                    let (i, j) = match (serial_map.get(&a), serial_map.get(&b)) {
                        (Some(&i), Some(&j)) => (i, j),
                        _ => return Err(parse_err(ln, "bond references unknown atom")),
                    };
                    system
                        .push_bond(Bond::new(i, j, BondOrder::Single))
                        .ok_or_else(|| parse_err(ln, "bond index out of range"))?;
                }
            }
        }

        if !saw_atoms {
            return Err(PsfError::MissingRecord("!NATOM"));
        }
        Ok((system, metadata))
    }
}
