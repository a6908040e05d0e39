use crate::core::io::traits::{MolecularFile, MolecularFileWriter};
use crate::core::models::atom::Atom;
use crate::core::models::system::MoleculeSystem;
use crate::core::models::topology::{Bond, BondOrder};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const MOLECULE_SECTION: &str = "@<TRIPOS>MOLECULE";
const ATOM_SECTION: &str = "@<TRIPOS>ATOM";
const BOND_SECTION: &str = "@<TRIPOS>BOND";
const SUBSTRUCTURE_SECTION: &str = "@<TRIPOS>SUBSTRUCTURE";

/// A section the codec does not interpret, kept verbatim so it can be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub header: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mol2Metadata {
    pub molecule_type: String,
    pub charge_type: String,
    pub extra_sections: Vec<RawSection>,
}

impl Default for Mol2Metadata {
    fn default() -> Self {
        Self {
            molecule_type: "SMALL".to_string(),
            charge_type: "USER_CHARGES".to_string(),
            extra_sections: Vec::new(),
        }
    }
}

impl Mol2Metadata {
    fn substructure_count(&self) -> usize {
        self.extra_sections
            .iter()
            .find(|s| s.header.eq_ignore_ascii_case(SUBSTRUCTURE_SECTION))
            .map_or(0, |s| s.lines.iter().filter(|l| !l.trim().is_empty()).count())
    }
}

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Missing required section: {0}")]
    MissingSection(&'static str),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

fn parse_err(line: usize, message: impl Into<String>) -> Mol2Error {
    Mol2Error::Parse {
        line,
        message: message.into(),
    }
}

pub struct Mol2File;

impl MolecularFile for Mol2File {
    type Metadata = Mol2Metadata;
    type Error = Mol2Error;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MoleculeSystem, Self::Metadata), Self::Error> {
        let mut sections: Vec<(String, Vec<(usize, String)>)> = Vec::new();
        for (idx, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let trimmed = line.trim();
            if trimmed.starts_with("@<TRIPOS>") {
                sections.push((trimmed.to_ascii_uppercase(), Vec::new()));
            } else if let Some((_, lines)) = sections.last_mut() {
                lines.push((idx + 1, line));
            }
        }

        let mut molecule = None;
        let mut atom_lines = None;
        let mut bond_lines = None;
        let mut metadata = Mol2Metadata {
            extra_sections: Vec::new(),
            ..Default::default()
        };

        for (header, lines) in sections {
            match header.as_str() {
                MOLECULE_SECTION if molecule.is_none() => molecule = Some(lines),
                ATOM_SECTION if atom_lines.is_none() => atom_lines = Some(lines),
                BOND_SECTION if bond_lines.is_none() => bond_lines = Some(lines),
                _ => metadata.extra_sections.push(RawSection {
                    header,
                    lines: lines.into_iter().map(|(_, l)| l).collect(),
                }),
            }
        }

        let molecule = molecule.ok_or(Mol2Error::MissingSection(MOLECULE_SECTION))?;
        let atom_lines = atom_lines.ok_or(Mol2Error::MissingSection(ATOM_SECTION))?;

        let mut header_iter = molecule.into_iter();
        let name = header_iter
            .next()
            .map(|(_, l)| l.trim().to_string())
            .unwrap_or_default();
        let (counts_line_no, counts_line) = header_iter
            .next()
            .ok_or_else(|| parse_err(0, "missing counts line in MOLECULE section"))?;
        let expected_atoms = counts_line
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| parse_err(counts_line_no, "invalid atom count"))?;
        if let Some((_, mol_type)) = header_iter.next() {
            metadata.molecule_type = mol_type.trim().to_string();
        }
        if let Some((_, charge_type)) = header_iter.next() {
            metadata.charge_type = charge_type.trim().to_string();
        }

        let mut system = MoleculeSystem::new(&name);
        let mut id_map: HashMap<usize, usize> = HashMap::new();

        for (line_no, line) in atom_lines {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 6 {
                return Err(parse_err(line_no, "ATOM line needs at least 6 fields"));
            }
            let serial: usize = parts[0]
                .parse()
                .map_err(|_| parse_err(line_no, format!("invalid atom id '{}'", parts[0])))?;
            let coord = |i: usize| -> Result<f64, Mol2Error> {
                parts[i]
                    .parse()
                    .map_err(|_| parse_err(line_no, format!("invalid coordinate '{}'", parts[i])))
            };
            let position = Point3::new(coord(2)?, coord(3)?, coord(4)?);
            let residue_number: isize = match parts.get(6) {
                Some(v) => v
                    .parse()
                    .map_err(|_| parse_err(line_no, format!("invalid substructure id '{}'", v)))?,
                None => 1,
            };
            let residue_name = parts.get(7).copied().unwrap_or("UNK");
            let charge: f64 = match parts.get(8) {
                Some(v) => v
                    .parse()
                    .map_err(|_| parse_err(line_no, format!("invalid charge '{}'", v)))?,
                None => 0.0,
            };

            let atom = Atom::new(serial, parts[1], position)
                .with_residue(residue_number, residue_name)
                .with_parameters(parts[5], charge);
            if id_map.insert(serial, system.atom_count()).is_some() {
                return Err(Mol2Error::Inconsistency(format!(
                    "Duplicate atom id: {}",
                    serial
                )));
            }
            system.push_atom(atom);
        }

        if system.atom_count() != expected_atoms {
            return Err(Mol2Error::Inconsistency(format!(
                "MOLECULE section declares {} atoms but ATOM section has {}",
                expected_atoms,
                system.atom_count()
            )));
        }

        for (line_no, line) in bond_lines.unwrap_or_default() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 4 {
                return Err(parse_err(line_no, "BOND line needs 4 fields"));
            }
            let lookup = |token: &str| -> Result<usize, Mol2Error> {
                let id: usize = token
                    .parse()
                    .map_err(|_| parse_err(line_no, format!("invalid atom id '{}'", token)))?;
                id_map
                    .get(&id)
                    .copied()
                    .ok_or_else(|| parse_err(line_no, format!("bond references unknown atom {}", id)))
            };
            let a1 = lookup(parts[1])?;
            let a2 = lookup(parts[2])?;
            let order: BondOrder = parts[3]
                .parse()
                .map_err(|_| parse_err(line_no, format!("unsupported bond type '{}'", parts[3])))?;
            system
                .push_bond(Bond::new(a1, a2, order))
                .ok_or_else(|| parse_err(line_no, "bond index out of range"))?;
        }

        Ok((system, metadata))
    }
}

impl MolecularFileWriter for Mol2File {
    fn write_to(
        system: &MoleculeSystem,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let name = if system.name.is_empty() {
            "MOL"
        } else {
            system.name.as_str()
        };

        writeln!(writer, "{}", MOLECULE_SECTION)?;
        writeln!(writer, "{}", name)?;
        writeln!(
            writer,
            "{:>5} {:>5} {:>5} {:>5} {:>5}",
            system.atom_count(),
            system.bonds().len(),
            metadata.substructure_count(),
            0,
            0
        )?;
        writeln!(writer, "{}", metadata.molecule_type)?;
        writeln!(writer, "{}", metadata.charge_type)?;
        writeln!(writer)?;
        writeln!(writer)?;

        writeln!(writer, "{}", ATOM_SECTION)?;
        for (i, atom) in system.atoms().iter().enumerate() {
            writeln!(
                writer,
                "{:>7} {:<8} {:>10.4} {:>10.4} {:>10.4} {:<8} {:>5} {:<8} {:>10.6}",
                i + 1,
                atom.name,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.force_field_type,
                atom.residue_number,
                atom.residue_name,
                atom.partial_charge
            )?;
        }

        writeln!(writer, "{}", BOND_SECTION)?;
        for (i, bond) in system.bonds().iter().enumerate() {
            writeln!(
                writer,
                "{:>6} {:>5} {:>5} {}",
                i + 1,
                bond.atom1_idx + 1,
                bond.atom2_idx + 1,
                bond.order
            )?;
        }

        for section in &metadata.extra_sections {
            writeln!(writer, "{}", section.header)?;
            for line in &section.lines {
                writeln!(writer, "{}", line)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ETHANE_FRAGMENT: &str = "\
@<TRIPOS>MOLECULE
1chain
    3     2     1     0     0
SMALL
bcc


@<TRIPOS>ATOM
      1 C1           0.0000     0.0000     0.0000 c3            1 POL      -0.094100
      2 H1           1.0900     0.0000     0.0000 hc            1 POL       0.032900
      3 C2          -0.7700     1.3300     0.0000 c3            1 POL      -0.094100
@<TRIPOS>BOND
     1     1     2 1
     2     1     3 1
@<TRIPOS>SUBSTRUCTURE
     1 POL         1 TEMP              0 ****  ****    0 ROOT
";

    fn read(text: &str) -> Result<(MoleculeSystem, Mol2Metadata), Mol2Error> {
        Mol2File::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_atoms_bonds_and_charges() {
        let (system, metadata) = read(ETHANE_FRAGMENT).unwrap();

        assert_eq!(system.name, "1chain");
        assert_eq!(system.atom_count(), 3);
        assert_eq!(system.atoms()[1].name, "H1");
        assert_eq!(system.atoms()[1].force_field_type, "hc");
        assert_eq!(system.atoms()[1].partial_charge, 0.0329);
        assert_eq!(system.atoms()[2].position, Point3::new(-0.77, 1.33, 0.0));
        assert_eq!(system.atoms()[0].residue_name, "POL");
        assert_eq!(system.bonds().len(), 2);
        assert_eq!(system.bonds()[1], Bond::new(0, 2, BondOrder::Single));
        assert_eq!(metadata.charge_type, "bcc");
        assert_eq!(metadata.extra_sections.len(), 1);
        assert_eq!(metadata.extra_sections[0].header, SUBSTRUCTURE_SECTION);
    }

    #[test]
    fn write_then_read_preserves_parameters_and_topology() {
        let (system, metadata) = read(ETHANE_FRAGMENT).unwrap();

        let mut buffer = Vec::new();
        Mol2File::write_to(&system, &metadata, &mut buffer).unwrap();
        let (reread, reread_meta) = read(std::str::from_utf8(&buffer).unwrap()).unwrap();

        assert_eq!(reread, system);
        assert_eq!(reread_meta, metadata);
    }

    #[test]
    fn missing_atom_section_is_an_error() {
        let text = "@<TRIPOS>MOLECULE\nx\n 0 0 0 0 0\nSMALL\nNO_CHARGES\n";
        assert!(matches!(
            read(text),
            Err(Mol2Error::MissingSection(ATOM_SECTION))
        ));
    }

    #[test]
    fn atom_count_mismatch_is_an_inconsistency() {
        let text = ETHANE_FRAGMENT.replace("    3     2     1", "    4     2     1");
        assert!(matches!(read(&text), Err(Mol2Error::Inconsistency(_))));
    }

    #[test]
    fn bond_to_unknown_atom_is_a_parse_error() {
        let text = ETHANE_FRAGMENT.replace("     2     1     3 1", "     2     1     9 1");
        assert!(matches!(read(&text), Err(Mol2Error::Parse { .. })));
    }
}
