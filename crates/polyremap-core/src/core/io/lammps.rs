//! LAMMPS data file writer for `atom_style full` with Amber-style functional forms.
//!
//! Styles assumed by the emitted coefficients: `pair_style lj/cut/coul/long`,
//! `bond_style harmonic`, `angle_style harmonic`, `dihedral_style fourier`,
//! `improper_style cvff`. Type numbering follows first appearance, so the same input
//! always produces the same bytes.

use crate::core::io::amber::ParameterizedSystem;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LammpsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("System has no periodic cell; refusing to write a data file without a box")]
    MissingCell,
}

/// Assigns 1-based type ids to keys in order of first appearance.
struct TypeTable<K> {
    ids: HashMap<K, usize>,
    keys: Vec<K>,
}

impl<K: std::hash::Hash + Eq + Clone> TypeTable<K> {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            keys: Vec::new(),
        }
    }

    fn id(&mut self, key: &K) -> usize {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        self.keys.push(key.clone());
        let id = self.keys.len();
        self.ids.insert(key.clone(), id);
        id
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Molecule ids from bond connectivity, numbered by the lowest atom index of each component.
fn molecule_ids(natom: usize, bonds: impl Iterator<Item = (usize, usize)>) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..natom).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for (a, b) in bonds {
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            parent[hi] = lo;
        }
    }

    let mut numbering: HashMap<usize, usize> = HashMap::new();
    (0..natom)
        .map(|i| {
            let root = find(&mut parent, i);
            let next = numbering.len() + 1;
            *numbering.entry(root).or_insert(next)
        })
        .collect()
}

/// Writes `system` as a LAMMPS data file.
///
/// # Errors
///
/// Returns [`LammpsError::MissingCell`] if the system carries no box.
pub fn write_data(
    system: &ParameterizedSystem,
    title: &str,
    writer: &mut impl Write,
) -> Result<(), LammpsError> {
    let cell = system.cell().ok_or(LammpsError::MissingCell)?;
    let top = &system.topology;

    let mut atom_types: TypeTable<String> = TypeTable::new();
    let atom_type_ids: Vec<usize> = top.atoms.iter().map(|a| atom_types.id(&a.amber_type)).collect();
    let type_representative: Vec<usize> = atom_types
        .keys
        .iter()
        .map(|t| top.atoms.iter().position(|a| &a.amber_type == t).unwrap_or(0))
        .collect();

    let mut bond_types: TypeTable<usize> = TypeTable::new();
    let bond_rows: Vec<(usize, [usize; 2])> = top
        .bonds
        .iter()
        .map(|b| (bond_types.id(&b.param), b.atoms))
        .collect();

    let mut angle_types: TypeTable<usize> = TypeTable::new();
    let angle_rows: Vec<(usize, [usize; 3])> = top
        .angles
        .iter()
        .map(|a| (angle_types.id(&a.param), a.atoms))
        .collect();

    // Multi-term proper dihedrals share one row; the type is the ordered term list.
    let mut proper_terms: Vec<([usize; 4], Vec<usize>)> = Vec::new();
    let mut proper_index: HashMap<[usize; 4], usize> = HashMap::new();
    for d in top.dihedrals.iter().filter(|d| !d.improper) {
        match proper_index.get(&d.atoms) {
            Some(&slot) => proper_terms[slot].1.push(d.param),
            None => {
                proper_index.insert(d.atoms, proper_terms.len());
                proper_terms.push((d.atoms, vec![d.param]));
            }
        }
    }
    let mut dihedral_types: TypeTable<Vec<usize>> = TypeTable::new();
    let dihedral_rows: Vec<(usize, [usize; 4])> = proper_terms
        .iter()
        .map(|(atoms, params)| (dihedral_types.id(params), *atoms))
        .collect();

    let mut improper_types: TypeTable<usize> = TypeTable::new();
    let improper_rows: Vec<(usize, [usize; 4])> = top
        .dihedrals
        .iter()
        .filter(|d| d.improper)
        .map(|d| (improper_types.id(&d.param), d.atoms))
        .collect();

    let molecules = molecule_ids(
        top.atoms.len(),
        top.bonds.iter().map(|b| (b.atoms[0], b.atoms[1])),
    );

    writeln!(writer, "{}", title)?;
    writeln!(writer)?;
    writeln!(writer, "{} atoms", top.atoms.len())?;
    writeln!(writer, "{} bonds", bond_rows.len())?;
    writeln!(writer, "{} angles", angle_rows.len())?;
    writeln!(writer, "{} dihedrals", dihedral_rows.len())?;
    writeln!(writer, "{} impropers", improper_rows.len())?;
    writeln!(writer)?;
    writeln!(writer, "{} atom types", atom_types.len())?;
    writeln!(writer, "{} bond types", bond_types.len())?;
    writeln!(writer, "{} angle types", angle_types.len())?;
    writeln!(writer, "{} dihedral types", dihedral_types.len())?;
    writeln!(writer, "{} improper types", improper_types.len())?;
    writeln!(writer)?;

    let extent = cell.extent();
    writeln!(writer, "{:.6} {:.6} xlo xhi", 0.0, extent.lx)?;
    writeln!(writer, "{:.6} {:.6} ylo yhi", 0.0, extent.ly)?;
    writeln!(writer, "{:.6} {:.6} zlo zhi", 0.0, extent.lz)?;
    if !cell.is_orthogonal() {
        writeln!(
            writer,
            "{:.6} {:.6} {:.6} xy xz yz",
            extent.xy, extent.xz, extent.yz
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Masses")?;
    writeln!(writer)?;
    for (i, (name, &rep)) in atom_types.keys.iter().zip(&type_representative).enumerate() {
        writeln!(writer, "{} {:.6} # {}", i + 1, top.atoms[rep].mass, name)?;
    }

    writeln!(writer)?;
    writeln!(writer, "Pair Coeffs # lj/cut/coul/long")?;
    writeln!(writer)?;
    for (i, (name, &rep)) in atom_types.keys.iter().zip(&type_representative).enumerate() {
        let (eps, sigma) = top.lennard_jones.self_epsilon_sigma(top.atoms[rep].lj_type);
        writeln!(writer, "{} {:.6} {:.6} # {}", i + 1, eps, sigma, name)?;
    }

    if !bond_types.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Bond Coeffs # harmonic")?;
        writeln!(writer)?;
        for (i, &param) in bond_types.keys.iter().enumerate() {
            let p = top.bond_params[param];
            writeln!(writer, "{} {:.6} {:.6}", i + 1, p.force_constant, p.equilibrium)?;
        }
    }

    if !angle_types.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Angle Coeffs # harmonic")?;
        writeln!(writer)?;
        for (i, &param) in angle_types.keys.iter().enumerate() {
            let p = top.angle_params[param];
            writeln!(
                writer,
                "{} {:.6} {:.6}",
                i + 1,
                p.force_constant,
                p.equilibrium.to_degrees()
            )?;
        }
    }

    if !dihedral_types.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Dihedral Coeffs # fourier")?;
        writeln!(writer)?;
        for (i, params) in dihedral_types.keys.iter().enumerate() {
            write!(writer, "{} {}", i + 1, params.len())?;
            for &param in params {
                let p = top.dihedral_params[param];
                write!(
                    writer,
                    " {:.6} {} {:.6}",
                    p.force_constant,
                    p.periodicity.abs().round() as i64,
                    p.phase.to_degrees()
                )?;
            }
            writeln!(writer)?;
        }
    }

    if !improper_types.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Improper Coeffs # cvff")?;
        writeln!(writer)?;
        for (i, &param) in improper_types.keys.iter().enumerate() {
            let p = top.dihedral_params[param];
            let sign = if p.phase.cos() < 0.0 { -1 } else { 1 };
            writeln!(
                writer,
                "{} {:.6} {} {}",
                i + 1,
                p.force_constant,
                sign,
                p.periodicity.abs().round() as i64
            )?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Atoms # full")?;
    writeln!(writer)?;
    for (i, (atom, pos)) in top.atoms.iter().zip(&system.positions).enumerate() {
        writeln!(
            writer,
            "{} {} {} {:.6} {:.6} {:.6} {:.6}",
            i + 1,
            molecules[i],
            atom_type_ids[i],
            atom.charge,
            pos.x,
            pos.y,
            pos.z
        )?;
    }

    if !bond_rows.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Bonds")?;
        writeln!(writer)?;
        for (i, (t, a)) in bond_rows.iter().enumerate() {
            writeln!(writer, "{} {} {} {}", i + 1, t, a[0] + 1, a[1] + 1)?;
        }
    }

    if !angle_rows.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Angles")?;
        writeln!(writer)?;
        for (i, (t, a)) in angle_rows.iter().enumerate() {
            writeln!(writer, "{} {} {} {} {}", i + 1, t, a[0] + 1, a[1] + 1, a[2] + 1)?;
        }
    }

    for (header, rows) in [("Dihedrals", &dihedral_rows), ("Impropers", &improper_rows)] {
        if rows.is_empty() {
            continue;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", header)?;
        writeln!(writer)?;
        for (i, (t, a)) in rows.iter().enumerate() {
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                i + 1,
                t,
                a[0] + 1,
                a[1] + 1,
                a[2] + 1,
                a[3] + 1
            )?;
        }
    }

    Ok(())
}

pub fn write_data_to_path<P: AsRef<Path>>(
    system: &ParameterizedSystem,
    title: &str,
    path: P,
) -> Result<(), LammpsError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_data(system, title, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::amber::tests::{FRAGMENT_PRMTOP, FRAGMENT_RST7};
    use crate::core::io::amber::{read_prmtop, read_rst7};
    use crate::core::models::cell::BoxMetadata;
    use std::io::Cursor;

    fn fragment() -> ParameterizedSystem {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();
        let restart = read_rst7(Cursor::new(FRAGMENT_RST7)).unwrap();
        ParameterizedSystem::new(top, restart).unwrap()
    }

    fn render(system: &ParameterizedSystem) -> String {
        let mut buffer = Vec::new();
        write_data(system, "Polymer System", &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn header_counts_and_overridden_box_are_written() {
        let system = fragment().with_cell(BoxMetadata::orthorhombic(41.2, 41.2, 41.2));
        let text = render(&system);

        assert!(text.starts_with("Polymer System\n"));
        assert!(text.contains("\n4 atoms\n3 bonds\n2 angles\n1 dihedrals\n1 impropers\n"));
        assert!(text.contains("\n2 atom types\n2 bond types\n1 angle types\n1 dihedral types\n1 improper types\n"));
        assert!(text.contains("0.000000 41.200000 xlo xhi"));
        assert!(text.contains("0.000000 41.200000 zlo zhi"));
        assert!(!text.contains("200.000000"));
        assert!(!text.contains("xy xz yz"));
    }

    #[test]
    fn multi_term_dihedral_is_merged_into_one_fourier_row() {
        let text = render(&fragment());

        assert!(text.contains("Dihedral Coeffs # fourier\n\n1 2 0.160000 3 0.000000 0.250000 1 180.000"));
        assert!(text.contains("Dihedrals\n\n1 1 2 1 3 4\n"));
        assert!(text.contains("Improper Coeffs # cvff\n\n1 1.100000 -1 2\n"));
    }

    #[test]
    fn atoms_section_uses_full_style_with_molecule_ids() {
        let text = render(&fragment());

        assert!(text.contains("Atoms # full\n\n1 1 1 -0.100000 0.000000 0.000000 0.000000\n"));
        assert!(text.contains("\n2 1 2 0.100000 1.090000 0.000000 0.000000\n"));
        assert!(text.contains("Masses\n\n1 12.010000 # c3\n2 1.008000 # hc\n"));
    }

    #[test]
    fn triclinic_cell_writes_tilt_factors() {
        let system = fragment().with_cell(BoxMetadata::new([10.0, 10.0, 10.0], [90.0, 60.0, 90.0]));
        let text = render(&system);
        assert!(text.contains("xy xz yz"));
    }

    #[test]
    fn missing_cell_is_refused() {
        let top = read_prmtop(Cursor::new(FRAGMENT_PRMTOP)).unwrap();
        let no_box: String = FRAGMENT_RST7.lines().take(4).collect::<Vec<_>>().join("\n");
        let restart = read_rst7(Cursor::new(no_box)).unwrap();
        let system = ParameterizedSystem::new(top, restart).unwrap();

        let mut buffer = Vec::new();
        assert!(matches!(
            write_data(&system, "x", &mut buffer),
            Err(LammpsError::MissingCell)
        ));
    }

    #[test]
    fn molecule_ids_follow_connected_components() {
        let ids = molecule_ids(5, [(0, 1), (3, 4)].into_iter());
        assert_eq!(ids, vec![1, 1, 2, 3, 3]);
    }

    #[test]
    fn output_is_deterministic() {
        let system = fragment();
        assert_eq!(render(&system), render(&system));
    }
}
