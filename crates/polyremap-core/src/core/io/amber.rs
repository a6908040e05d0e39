//! Readers for Amber parameter/topology (`prmtop`) and restart (`rst7`) files.
//!
//! Only the fields needed to emit a LAMMPS `full` data file are interpreted. Numeric
//! fields are split on whitespace; text fields honour the width of their `%FORMAT`.

use crate::core::models::cell::BoxMetadata;
use nalgebra::Point3;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Amber stores charges multiplied by this factor (sqrt of the Coulomb constant in kcal/mol).
pub const AMBER_CHARGE_SCALE: f64 = 18.2223;

#[derive(Debug, Error)]
pub enum AmberError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Missing required %FLAG {0}")]
    MissingFlag(&'static str),
    #[error("Invalid value '{value}' in %FLAG {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("Invalid restart file on line {line}: {message}")]
    Restart { line: usize, message: String },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmberAtom {
    pub name: String,
    pub amber_type: String,
    /// Charge in elementary charge units.
    pub charge: f64,
    pub mass: f64,
    /// 0-based Lennard-Jones type index.
    pub lj_type: usize,
    pub residue_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LennardJonesTable {
    pub ntypes: usize,
    pub nonbonded_index: Vec<i64>,
    pub acoef: Vec<f64>,
    pub bcoef: Vec<f64>,
}

impl LennardJonesTable {
    /// Returns `(epsilon, sigma)` for the self-interaction of a 0-based LJ type.
    ///
    /// Types without repulsion or dispersion (e.g. hydroxyl hydrogens) yield zeros.
    pub fn self_epsilon_sigma(&self, lj_type: usize) -> (f64, f64) {
        let index = self
            .nonbonded_index
            .get(self.ntypes * lj_type + lj_type)
            .copied()
            .unwrap_or(0);
        if index <= 0 {
            return (0.0, 0.0);
        }
        let slot = (index - 1) as usize;
        let (a, b) = (
            self.acoef.get(slot).copied().unwrap_or(0.0),
            self.bcoef.get(slot).copied().unwrap_or(0.0),
        );
        if a <= 0.0 || b <= 0.0 {
            return (0.0, 0.0);
        }
        (b * b / (4.0 * a), (a / b).powf(1.0 / 6.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondParam {
    pub force_constant: f64,
    pub equilibrium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParam {
    pub force_constant: f64,
    /// Equilibrium angle in radians.
    pub equilibrium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DihedralParam {
    pub force_constant: f64,
    pub periodicity: f64,
    /// Phase in radians.
    pub phase: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondTerm {
    pub atoms: [usize; 2],
    pub param: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleTerm {
    pub atoms: [usize; 3],
    pub param: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DihedralTerm {
    pub atoms: [usize; 4],
    pub param: usize,
    pub improper: bool,
}

/// A fully parameterized topology as written by the Amber system builder.
#[derive(Debug, Clone, PartialEq)]
pub struct AmberTopology {
    pub title: String,
    pub atoms: Vec<AmberAtom>,
    pub lennard_jones: LennardJonesTable,
    pub bond_params: Vec<BondParam>,
    pub bonds: Vec<BondTerm>,
    pub angle_params: Vec<AngleParam>,
    pub angles: Vec<AngleTerm>,
    pub dihedral_params: Vec<DihedralParam>,
    pub dihedrals: Vec<DihedralTerm>,
}

/// Coordinates and the box recorded in an Amber restart file.
#[derive(Debug, Clone, PartialEq)]
pub struct AmberRestart {
    pub title: String,
    pub positions: Vec<Point3<f64>>,
    pub cell: Option<BoxMetadata>,
}

/// A parameterized topology paired with coordinates and a periodic cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedSystem {
    pub topology: AmberTopology,
    pub positions: Vec<Point3<f64>>,
    cell: Option<BoxMetadata>,
}

impl ParameterizedSystem {
    /// Pairs a topology with restart coordinates, keeping the restart's box.
    ///
    /// # Errors
    ///
    /// Returns [`AmberError::Inconsistency`] if the atom counts differ.
    pub fn new(topology: AmberTopology, restart: AmberRestart) -> Result<Self, AmberError> {
        if topology.atoms.len() != restart.positions.len() {
            return Err(AmberError::Inconsistency(format!(
                "topology has {} atoms but restart has {} positions",
                topology.atoms.len(),
                restart.positions.len()
            )));
        }
        Ok(Self {
            topology,
            positions: restart.positions,
            cell: restart.cell,
        })
    }

    pub fn read_from_paths(prmtop: &Path, rst7: &Path) -> Result<Self, AmberError> {
        let topology = read_prmtop(BufReader::new(File::open(prmtop)?))?;
        let restart = read_rst7(BufReader::new(File::open(rst7)?))?;
        Self::new(topology, restart)
    }

    pub fn cell(&self) -> Option<&BoxMetadata> {
        self.cell.as_ref()
    }

    /// Replaces whatever box the restart carried with `cell`.
    pub fn with_cell(mut self, cell: BoxMetadata) -> Self {
        self.cell = Some(cell);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldFormat {
    Text(usize),
    Numeric,
}

fn parse_format(line: &str) -> FieldFormat {
    let spec = line
        .trim()
        .trim_start_matches("%FORMAT")
        .trim_matches(|c| c == '(' || c == ')')
        .to_ascii_lowercase();
    match spec.split_once('a') {
        Some((_, width)) => FieldFormat::Text(width.trim().parse().unwrap_or(4)),
        None => FieldFormat::Numeric,
    }
}

#[derive(Debug)]
struct Section {
    format: FieldFormat,
    lines: Vec<String>,
}

struct Sections(HashMap<String, Section>);

impl Sections {
    fn read(reader: impl BufRead) -> Result<Self, AmberError> {
        let mut sections: HashMap<String, Section> = HashMap::new();
        let mut current: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if let Some(flag) = line.strip_prefix("%FLAG") {
                let name = flag.trim().to_string();
                sections.insert(
                    name.clone(),
                    Section {
                        format: FieldFormat::Numeric,
                        lines: Vec::new(),
                    },
                );
                current = Some(name);
            } else if line.starts_with("%FORMAT") {
                if let Some(section) = current.as_ref().and_then(|n| sections.get_mut(n)) {
                    section.format = parse_format(&line);
                }
            } else if line.starts_with('%') {
                continue;
            } else if let Some(section) = current.as_ref().and_then(|n| sections.get_mut(n)) {
                section.lines.push(line);
            }
        }
        Ok(Self(sections))
    }

    fn section(&self, flag: &'static str) -> Result<&Section, AmberError> {
        self.0.get(flag).ok_or(AmberError::MissingFlag(flag))
    }

    fn strings(&self, flag: &'static str) -> Result<Vec<String>, AmberError> {
        let section = self.section(flag)?;
        let width = match section.format {
            FieldFormat::Text(w) if w > 0 => w,
            _ => 4,
        };
        Ok(section
            .lines
            .iter()
            .flat_map(|l| {
                l.as_bytes()
                    .chunks(width)
                    .map(|c| String::from_utf8_lossy(c).trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|s| !s.is_empty())
            .collect())
    }

    fn numbers<T: std::str::FromStr>(&self, flag: &'static str) -> Result<Vec<T>, AmberError> {
        self.section(flag)?
            .lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .map(|v| {
                v.parse::<T>().map_err(|_| AmberError::InvalidValue {
                    flag: flag.to_string(),
                    value: v.to_string(),
                })
            })
            .collect()
    }

    fn optional_numbers<T: std::str::FromStr>(
        &self,
        flag: &'static str,
    ) -> Result<Vec<T>, AmberError> {
        if self.0.contains_key(flag) {
            self.numbers(flag)
        } else {
            Ok(Vec::new())
        }
    }
}

fn coordinate_index(value: i64) -> usize {
    (value.unsigned_abs() / 3) as usize
}

fn param_index(value: i64, flag: &str, count: usize) -> Result<usize, AmberError> {
    if value < 1 || value as usize > count {
        return Err(AmberError::Inconsistency(format!(
            "{} references parameter {} but only {} exist",
            flag, value, count
        )));
    }
    Ok(value as usize - 1)
}

fn check_atoms<const N: usize>(atoms: &[usize; N], natom: usize, flag: &str) -> Result<(), AmberError> {
    match atoms.iter().find(|&&a| a >= natom) {
        Some(a) => Err(AmberError::Inconsistency(format!(
            "{} references atom {} but only {} exist",
            flag,
            a + 1,
            natom
        ))),
        None => Ok(()),
    }
}

/// Parses a `prmtop` stream.
///
/// # Errors
///
/// Returns an error for missing required flags, unparsable values, or index lists
/// that point outside the atom or parameter tables.
pub fn read_prmtop(reader: impl BufRead) -> Result<AmberTopology, AmberError> {
    let sections = Sections::read(reader)?;

    let pointers: Vec<i64> = sections.numbers("POINTERS")?;
    let natom = pointers.first().copied().unwrap_or(0).max(0) as usize;
    let ntypes = pointers.get(1).copied().unwrap_or(0).max(0) as usize;

    let names = sections.strings("ATOM_NAME")?;
    let amber_types = sections.strings("AMBER_ATOM_TYPE")?;
    let charges: Vec<f64> = sections.numbers("CHARGE")?;
    let masses: Vec<f64> = sections.numbers("MASS")?;
    let type_indices: Vec<i64> = sections.numbers("ATOM_TYPE_INDEX")?;

    for (flag, len) in [
        ("ATOM_NAME", names.len()),
        ("AMBER_ATOM_TYPE", amber_types.len()),
        ("CHARGE", charges.len()),
        ("MASS", masses.len()),
        ("ATOM_TYPE_INDEX", type_indices.len()),
    ] {
        if len != natom {
            return Err(AmberError::Inconsistency(format!(
                "{} has {} entries but POINTERS declares {} atoms",
                flag, len, natom
            )));
        }
    }

    let residue_labels = if sections.0.contains_key("RESIDUE_LABEL") {
        sections.strings("RESIDUE_LABEL")?
    } else {
        Vec::new()
    };
    let residue_pointers: Vec<i64> = sections.optional_numbers("RESIDUE_POINTER")?;
    let mut residue_of_atom = vec![String::new(); natom];
    for (r, label) in residue_labels.iter().enumerate() {
        let start = residue_pointers.get(r).map_or(natom, |&p| (p.max(1) - 1) as usize);
        let end = residue_pointers
            .get(r + 1)
            .map_or(natom, |&p| (p.max(1) - 1) as usize);
        for slot in residue_of_atom.iter_mut().take(end.min(natom)).skip(start) {
            *slot = label.clone();
        }
    }

    let mut atoms = Vec::with_capacity(natom);
    for i in 0..natom {
        let lj = type_indices[i];
        if lj < 1 || lj as usize > ntypes {
            return Err(AmberError::Inconsistency(format!(
                "atom {} has LJ type {} outside 1..={}",
                i + 1,
                lj,
                ntypes
            )));
        }
        atoms.push(AmberAtom {
            name: names[i].clone(),
            amber_type: amber_types[i].clone(),
            charge: charges[i] / AMBER_CHARGE_SCALE,
            mass: masses[i],
            lj_type: lj as usize - 1,
            residue_name: residue_of_atom[i].clone(),
        });
    }

    let lennard_jones = LennardJonesTable {
        ntypes,
        nonbonded_index: sections.numbers("NONBONDED_PARM_INDEX")?,
        acoef: sections.numbers("LENNARD_JONES_ACOEF")?,
        bcoef: sections.numbers("LENNARD_JONES_BCOEF")?,
    };

    let bond_k: Vec<f64> = sections.optional_numbers("BOND_FORCE_CONSTANT")?;
    let bond_r: Vec<f64> = sections.optional_numbers("BOND_EQUIL_VALUE")?;
    let bond_params: Vec<BondParam> = bond_k
        .iter()
        .zip(&bond_r)
        .map(|(&k, &r)| BondParam {
            force_constant: k,
            equilibrium: r,
        })
        .collect();

    let mut bonds = Vec::new();
    for flag in ["BONDS_INC_HYDROGEN", "BONDS_WITHOUT_HYDROGEN"] {
        let raw: Vec<i64> = sections.optional_numbers(flag)?;
        for chunk in raw.chunks_exact(3) {
            let term = BondTerm {
                atoms: [coordinate_index(chunk[0]), coordinate_index(chunk[1])],
                param: param_index(chunk[2], flag, bond_params.len())?,
            };
            check_atoms(&term.atoms, natom, flag)?;
            bonds.push(term);
        }
    }

    let angle_k: Vec<f64> = sections.optional_numbers("ANGLE_FORCE_CONSTANT")?;
    let angle_t: Vec<f64> = sections.optional_numbers("ANGLE_EQUIL_VALUE")?;
    let angle_params: Vec<AngleParam> = angle_k
        .iter()
        .zip(&angle_t)
        .map(|(&k, &t)| AngleParam {
            force_constant: k,
            equilibrium: t,
        })
        .collect();

    let mut angles = Vec::new();
    for flag in ["ANGLES_INC_HYDROGEN", "ANGLES_WITHOUT_HYDROGEN"] {
        let raw: Vec<i64> = sections.optional_numbers(flag)?;
        for chunk in raw.chunks_exact(4) {
            let term = AngleTerm {
                atoms: [
                    coordinate_index(chunk[0]),
                    coordinate_index(chunk[1]),
                    coordinate_index(chunk[2]),
                ],
                param: param_index(chunk[3], flag, angle_params.len())?,
            };
            check_atoms(&term.atoms, natom, flag)?;
            angles.push(term);
        }
    }

    let dihedral_k: Vec<f64> = sections.optional_numbers("DIHEDRAL_FORCE_CONSTANT")?;
    let dihedral_n: Vec<f64> = sections.optional_numbers("DIHEDRAL_PERIODICITY")?;
    let dihedral_p: Vec<f64> = sections.optional_numbers("DIHEDRAL_PHASE")?;
    let dihedral_params: Vec<DihedralParam> = dihedral_k
        .iter()
        .zip(&dihedral_n)
        .zip(&dihedral_p)
        .map(|((&k, &n), &p)| DihedralParam {
            force_constant: k,
            periodicity: n,
            phase: p,
        })
        .collect();

    let mut dihedrals = Vec::new();
    for flag in ["DIHEDRALS_INC_HYDROGEN", "DIHEDRALS_WITHOUT_HYDROGEN"] {
        let raw: Vec<i64> = sections.optional_numbers(flag)?;
        for chunk in raw.chunks_exact(5) {
            let term = DihedralTerm {
                atoms: [
                    coordinate_index(chunk[0]),
                    coordinate_index(chunk[1]),
                    coordinate_index(chunk[2]),
                    coordinate_index(chunk[3]),
                ],
                param: param_index(chunk[4], flag, dihedral_params.len())?,
                improper: chunk[3] < 0,
            };
            check_atoms(&term.atoms, natom, flag)?;
            dihedrals.push(term);
        }
    }

    let title = if sections.0.contains_key("TITLE") {
        sections.strings("TITLE")?.join(" ")
    } else {
        String::new()
    };

    Ok(AmberTopology {
        title,
        atoms,
        lennard_jones,
        bond_params,
        bonds,
        angle_params,
        angles,
        dihedral_params,
        dihedrals,
    })
}

const RESTART_FIELD_WIDTH: usize = 12;

/// Parses an ASCII `rst7`/`inpcrd` stream.
///
/// Velocities, if present, are skipped. A trailing six-value record is read as the box,
/// including when it could also be a two-atom velocity block.
pub fn read_rst7(reader: impl BufRead) -> Result<AmberRestart, AmberError> {
    let mut lines = reader.lines();
    let title = lines.next().transpose()?.unwrap_or_default().trim().to_string();
    let count_line = lines.next().transpose()?.ok_or(AmberError::Restart {
        line: 2,
        message: "missing atom count".to_string(),
    })?;
    let natom: usize = count_line
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or(AmberError::Restart {
            line: 2,
            message: format!("invalid atom count '{}'", count_line.trim()),
        })?;

    let mut values = Vec::with_capacity(natom * 3 + 6);
    for (idx, line) in lines.enumerate() {
        let line = line?;
        for chunk in line.as_bytes().chunks(RESTART_FIELD_WIDTH) {
            let field = String::from_utf8_lossy(chunk);
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            let value: f64 = field.parse().map_err(|_| AmberError::Restart {
                line: idx + 3,
                message: format!("invalid number '{}'", field),
            })?;
            values.push(value);
        }
    }

    let coords = natom * 3;
    // With two atoms a velocity block and a box record are the same size; read it as the box.
    let has_box = match values.len() {
        n if n == coords => false,
        n if n == coords + 6 || n == 2 * coords + 6 => true,
        n if n == 2 * coords => false,
        n => {
            return Err(AmberError::Restart {
                line: 3,
                message: format!("expected coordinates for {} atoms, found {} values", natom, n),
            });
        }
    };

    let positions = values[..coords]
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let cell = has_box.then(|| {
        let b = &values[values.len() - 6..];
        BoxMetadata::new([b[0], b[1], b[2]], [b[3], b[4], b[5]])
    });

    Ok(AmberRestart {
        title,
        positions,
        cell,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// A four-atom fragment: two carbons, each carrying one hydrogen.
    pub(crate) const FRAGMENT_PRMTOP: &str = "\
%VERSION  VERSION_STAMP = V0001.000  DATE = 01/01/24  00:00:00
%FLAG TITLE
%FORMAT(20a4)
sys
%FLAG POINTERS
%FORMAT(10I8)
       4       2       2       1       2       0       3       0       0       0
       0       1       1       0       0       2       1       3       2       0
       0       0       0       0       0       0       0       0       4       0
       0
%FLAG ATOM_NAME
%FORMAT(20a4)
C1  H1  C2  H2  
%FLAG CHARGE
%FORMAT(5E16.8)
 -1.82223000E+00  1.82223000E+00 -3.64446000E+00  3.64446000E+00
%FLAG MASS
%FORMAT(5E16.8)
  1.20100000E+01  1.00800000E+00  1.20100000E+01  1.00800000E+00
%FLAG ATOM_TYPE_INDEX
%FORMAT(10I8)
       1       2       1       2
%FLAG NONBONDED_PARM_INDEX
%FORMAT(10I8)
       1       2       2       3
%FLAG RESIDUE_LABEL
%FORMAT(20a4)
POL 
%FLAG RESIDUE_POINTER
%FORMAT(10I8)
       1
%FLAG BOND_FORCE_CONSTANT
%FORMAT(5E16.8)
  3.30600000E+02  3.00900000E+02
%FLAG BOND_EQUIL_VALUE
%FORMAT(5E16.8)
  1.53500000E+00  1.09700000E+00
%FLAG ANGLE_FORCE_CONSTANT
%FORMAT(5E16.8)
  4.67700000E+01
%FLAG ANGLE_EQUIL_VALUE
%FORMAT(5E16.8)
  1.91637152E+00
%FLAG DIHEDRAL_FORCE_CONSTANT
%FORMAT(5E16.8)
  1.60000000E-01  2.50000000E-01  1.10000000E+00
%FLAG DIHEDRAL_PERIODICITY
%FORMAT(5E16.8)
  3.00000000E+00  1.00000000E+00  2.00000000E+00
%FLAG DIHEDRAL_PHASE
%FORMAT(5E16.8)
  0.00000000E+00  3.14159400E+00  3.14159400E+00
%FLAG LENNARD_JONES_ACOEF
%FORMAT(5E16.8)
  1.04308023E+06  6.67977577E+04  3.25969625E+03
%FLAG LENNARD_JONES_BCOEF
%FORMAT(5E16.8)
  6.75612247E+02  1.06076943E+02  1.03606917E+01
%FLAG BONDS_INC_HYDROGEN
%FORMAT(10I8)
       0       3       2       6       9       2
%FLAG BONDS_WITHOUT_HYDROGEN
%FORMAT(10I8)
       0       6       1
%FLAG ANGLES_INC_HYDROGEN
%FORMAT(10I8)
       3       0       6       1       0       6       9       1
%FLAG ANGLES_WITHOUT_HYDROGEN
%FORMAT(10I8)

%FLAG DIHEDRALS_INC_HYDROGEN
%FORMAT(10I8)
       3       0       6       9       1       3       0      -6       9       2
       0       6       3      -9       3
%FLAG DIHEDRALS_WITHOUT_HYDROGEN
%FORMAT(10I8)

%FLAG AMBER_ATOM_TYPE
%FORMAT(20a4)
c3  hc  c3  hc  
";

    pub(crate) const FRAGMENT_RST7: &str = "\
sys
     4
   0.0000000   0.0000000   0.0000000   1.0900000   0.0000000   0.0000000
  -0.5100000   1.4400000   0.0000000 -10.6000000 123.4567890  -0.2500000
 200.0000000 200.0000000 200.0000000  90.0000000  90.0000000  90.0000000
";

    #[test]
    fn prmtop_atoms_are_parsed_with_scaled_charges() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();

        assert_eq!(top.title, "sys");
        assert_eq!(top.atoms.len(), 4);
        assert_eq!(top.atoms[1].name, "H1");
        assert_eq!(top.atoms[1].amber_type, "hc");
        assert!((top.atoms[0].charge + 0.1).abs() < 1e-12);
        assert!((top.atoms[3].charge - 0.2).abs() < 1e-12);
        assert_eq!(top.atoms[2].mass, 12.01);
        assert_eq!(top.atoms[1].lj_type, 1);
        assert_eq!(top.atoms[3].residue_name, "POL");
    }

    #[test]
    fn prmtop_terms_use_atom_indices_and_flag_impropers() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();

        assert_eq!(top.bonds.len(), 3);
        assert_eq!(top.bonds[0], BondTerm { atoms: [0, 1], param: 1 });
        assert_eq!(top.bonds[2], BondTerm { atoms: [0, 2], param: 0 });
        assert_eq!(top.angles.len(), 2);
        assert_eq!(top.angles[1].atoms, [0, 2, 3]);
        assert_eq!(top.dihedrals.len(), 3);
        assert_eq!(top.dihedrals[1].atoms, [1, 0, 2, 3]);
        assert!(!top.dihedrals[1].improper);
        assert!(top.dihedrals[2].improper);
        assert_eq!(top.dihedrals[2].atoms, [0, 2, 1, 3]);
    }

    #[test]
    fn lennard_jones_self_terms_match_a_b_coefficients() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();
        let (eps, sigma) = top.lennard_jones.self_epsilon_sigma(0);
        let a = 1.04308023e6_f64;
        let b = 6.75612247e2_f64;
        assert!((eps - b * b / (4.0 * a)).abs() < 1e-12);
        assert!((sigma - (a / b).powf(1.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn missing_required_flag_is_reported() {
        let without_mass = FRAGMENT_PRMTOP.replace("%FLAG MASS", "%FLAG NOT_MASS");
        assert!(matches!(
            read_prmtop(Cursor::new(without_mass)),
            Err(AmberError::MissingFlag("MASS"))
        ));
    }

    #[test]
    fn rst7_reads_fixed_width_coordinates_and_box() {
        let restart = read_rst7(Cursor::new(FRAGMENT_RST7)).unwrap();

        assert_eq!(restart.positions.len(), 4);
        assert_eq!(restart.positions[1], Point3::new(1.09, 0.0, 0.0));
        assert_eq!(restart.positions[3], Point3::new(-10.6, 123.456789, -0.25));
        assert_eq!(restart.cell, Some(BoxMetadata::orthorhombic(200.0, 200.0, 200.0)));
    }

    #[test]
    fn rst7_without_trailing_record_has_no_box() {
        let no_box: String = FRAGMENT_RST7.lines().take(4).collect::<Vec<_>>().join("\n");
        let restart = read_rst7(Cursor::new(no_box)).unwrap();
        assert_eq!(restart.positions.len(), 4);
        assert!(restart.cell.is_none());
    }

    #[test]
    fn with_cell_overrides_the_restart_box() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();
        let restart = read_rst7(Cursor::new(FRAGMENT_RST7)).unwrap();
        let system = ParameterizedSystem::new(top, restart)
            .unwrap()
            .with_cell(BoxMetadata::orthorhombic(41.2, 41.2, 41.2));
        assert_eq!(system.cell(), Some(&BoxMetadata::orthorhombic(41.2, 41.2, 41.2)));
    }

    #[test]
    fn rst7_trailing_record_is_the_box() {
        let with_box = format!(
            "sys\n     1\n{:12.7}{:12.7}{:12.7}\n{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}\n",
            1.0, 2.0, 3.0, 80.0, 81.0, 82.0, 90.0, 90.0, 90.0
        );
        let restart = read_rst7(Cursor::new(with_box)).unwrap();
        let cell = restart.cell.unwrap();
        assert_eq!(cell.lengths.z, 82.0);
        assert_eq!(restart.positions[0], Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn two_atom_restart_with_box_keeps_the_box() {
        let with_box = format!(
            "pair\n     2\n{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}\n{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}{:12.7}\n",
            0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 30.0, 31.0, 32.0, 90.0, 90.0, 90.0
        );
        let restart = read_rst7(Cursor::new(with_box)).unwrap();
        assert_eq!(restart.positions[1], Point3::new(1.5, 0.0, 0.0));
        assert_eq!(
            restart.cell,
            Some(BoxMetadata::orthorhombic(30.0, 31.0, 32.0))
        );
    }

    #[test]
    fn parameterized_system_rejects_count_mismatch() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();
        let restart = AmberRestart {
            title: String::new(),
            positions: vec![Point3::origin()],
            cell: None,
        };
        assert!(matches!(
            ParameterizedSystem::new(top, restart),
            Err(AmberError::Inconsistency(_))
        ));
    }
}
