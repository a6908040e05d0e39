use super::atom::Atom;
use super::topology::Bond;
use std::collections::BTreeSet;

/// An ordered collection of atoms with their bonds.
///
/// Each pipeline stage produces a new `MoleculeSystem` rather than editing the one it
/// was given; the remapping step, for instance, returns a retyped copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeSystem {
    /// Molecule name as recorded by the producing tool.
    pub name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl MoleculeSystem {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn from_parts(name: &str, atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        Self {
            name: name.to_string(),
            atoms,
            bonds,
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn push_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Adds a bond between two existing atoms.
    ///
    /// # Return
    ///
    /// Returns `None` if either index is out of range.
    pub fn push_bond(&mut self, bond: Bond) -> Option<()> {
        if bond.atom1_idx >= self.atoms.len() || bond.atom2_idx >= self.atoms.len() {
            return None;
        }
        self.bonds.push(bond);
        Some(())
    }

    /// Returns a copy of this system whose atoms have been transformed by `f`.
    ///
    /// Bonds are carried over unchanged.
    pub fn map_atoms<F>(&self, f: F) -> Self
    where
        F: FnMut(&Atom) -> Atom,
    {
        Self {
            name: self.name.clone(),
            atoms: self.atoms.iter().map(f).collect(),
            bonds: self.bonds.clone(),
        }
    }

    /// The set of distinct atom names in the system.
    pub fn unique_atom_names(&self) -> BTreeSet<&str> {
        self.atoms.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn total_charge(&self) -> f64 {
        self.atoms.iter().map(|a| a.partial_charge).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;

    fn two_atom_system() -> MoleculeSystem {
        let mut system = MoleculeSystem::new("test");
        system.push_atom(Atom::new(1, "C1", Point3::new(0.0, 0.0, 0.0)).with_parameters("CT", -0.18));
        system.push_atom(Atom::new(2, "H1", Point3::new(1.09, 0.0, 0.0)).with_parameters("HC", 0.06));
        system.push_bond(Bond::new(0, 1, BondOrder::Single)).unwrap();
        system
    }

    #[test]
    fn push_bond_rejects_out_of_range_atoms() {
        let mut system = two_atom_system();
        assert!(system.push_bond(Bond::new(0, 2, BondOrder::Single)).is_none());
        assert_eq!(system.bonds().len(), 1);
    }

    #[test]
    fn map_atoms_returns_new_system_and_keeps_topology() {
        let system = two_atom_system();
        let renamed = system.map_atoms(|a| a.clone().with_parameters("x", 0.0));

        assert_eq!(system.atoms()[0].force_field_type, "CT");
        assert_eq!(renamed.atoms()[0].force_field_type, "x");
        assert_eq!(renamed.bonds(), system.bonds());
    }

    #[test]
    fn unique_atom_names_and_total_charge() {
        let mut system = two_atom_system();
        system.push_atom(Atom::new(3, "H1", Point3::origin()).with_parameters("HC", 0.06));

        let names: Vec<_> = system.unique_atom_names().into_iter().collect();
        assert_eq!(names, vec!["C1", "H1"]);
        assert!((system.total_charge() - (-0.06)).abs() < 1e-12);
    }
}
