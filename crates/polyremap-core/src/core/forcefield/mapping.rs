use crate::core::models::system::MoleculeSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Target-force-field parameters recorded for one atom name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomParams {
    #[serde(rename = "type")]
    pub force_field_type: String,
    pub charge: f64,
}

/// The monomer chemistry a mapping was derived from.
///
/// Wildcards written as `[*]` are normalized to `*` so that both spellings of the same
/// SMILES compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chemistry {
    pub repeat_unit: String,
    pub end_group: String,
}

impl Chemistry {
    pub fn new(repeat_unit: &str, end_group: &str) -> Self {
        Self {
            repeat_unit: normalize_smiles(repeat_unit),
            end_group: normalize_smiles(end_group),
        }
    }
}

impl fmt::Display for Chemistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (end group {})", self.repeat_unit, self.end_group)
    }
}

pub fn normalize_smiles(smiles: &str) -> String {
    smiles.trim().replace("[*]", "*")
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error(
        "Mapping is incomplete: names only in the source-typed chain {only_in_source:?}, only in the target-typed chain {only_in_target:?}"
    )]
    Incomplete {
        only_in_source: Vec<String>,
        only_in_target: Vec<String>,
    },
    #[error("No mapping entry for atom name(s) {missing:?}")]
    Lookup { missing: Vec<String> },
    #[error("Malformed mapping file '{path}': {source}")]
    Malformed {
        path: String,
        source: toml::de::Error,
    },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to serialize mapping: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Mapping '{path}' was built for {found}, not {expected}")]
    ChemistryMismatch {
        path: String,
        expected: Chemistry,
        found: Chemistry,
    },
}

/// A name-keyed translation of atom types and charges from one force field to another.
///
/// The mapping is derived once from a small representative chain typed under both force
/// fields and then reused for every larger system built from the same chemistry. Lookups
/// are by atom name only, so the builder must name atoms identically in both systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomMapping {
    source: String,
    target: String,
    chemistry: Chemistry,
    atoms: BTreeMap<String, AtomParams>,
}

impl AtomMapping {
    /// The file name a mapping between two force fields is cached under.
    pub fn file_name(source: &str, target: &str) -> String {
        format!("{}2{}.map", source, target)
    }

    /// Builds a mapping from the same chain typed under the source and target force fields.
    ///
    /// Parameters are taken from `retyped`. When a name occurs more than once the last
    /// occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Incomplete`] if any name appears in only one of the two
    /// systems.
    pub fn create(
        source: &str,
        target: &str,
        chemistry: Chemistry,
        typed: &MoleculeSystem,
        retyped: &MoleculeSystem,
    ) -> Result<Self, MappingError> {
        let typed_names = typed.unique_atom_names();
        let retyped_names = retyped.unique_atom_names();

        let only_in_source: Vec<String> = typed_names
            .difference(&retyped_names)
            .map(|n| n.to_string())
            .collect();
        let only_in_target: Vec<String> = retyped_names
            .difference(&typed_names)
            .map(|n| n.to_string())
            .collect();
        if !only_in_source.is_empty() || !only_in_target.is_empty() {
            return Err(MappingError::Incomplete {
                only_in_source,
                only_in_target,
            });
        }

        let mut atoms = BTreeMap::new();
        for atom in retyped.atoms() {
            let params = AtomParams {
                force_field_type: atom.force_field_type.clone(),
                charge: atom.partial_charge,
            };
            if let Some(previous) = atoms.insert(atom.name.clone(), params) {
                debug!(
                    name = %atom.name,
                    replaced_type = %previous.force_field_type,
                    "Duplicate atom name in retyped chain; keeping last occurrence"
                );
            }
        }

        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            chemistry,
            atoms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn chemistry(&self) -> &Chemistry {
        &self.chemistry
    }

    pub fn get(&self, name: &str) -> Option<&AtomParams> {
        self.atoms.get(name)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn persist(&self, path: &Path) -> Result<(), MappingError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| MappingError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|e| MappingError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| MappingError::Malformed {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Loads a cached mapping and rejects it if it was built for other chemistry.
    pub fn load_for(path: &Path, chemistry: &Chemistry) -> Result<Self, MappingError> {
        let mapping = Self::load(path)?;
        if &mapping.chemistry != chemistry {
            return Err(MappingError::ChemistryMismatch {
                path: path.to_string_lossy().to_string(),
                expected: chemistry.clone(),
                found: mapping.chemistry,
            });
        }
        Ok(mapping)
    }

    /// Verifies every distinct atom name of `system` has an entry.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Lookup`] listing all names without an entry.
    pub fn check_coverage(&self, system: &MoleculeSystem) -> Result<(), MappingError> {
        let missing: Vec<String> = system
            .unique_atom_names()
            .into_iter()
            .filter(|name| !self.atoms.contains_key(*name))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::Lookup { missing })
        }
    }

    /// Returns a copy of `system` with every atom's type and charge replaced from the mapping.
    ///
    /// Coverage is checked before anything is built, so on error no system is produced.
    pub fn apply(&self, system: &MoleculeSystem) -> Result<MoleculeSystem, MappingError> {
        self.check_coverage(system)?;
        Ok(system.map_atoms(|atom| match self.atoms.get(&atom.name) {
            Some(params) => atom
                .clone()
                .with_parameters(&params.force_field_type, params.charge),
            None => atom.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::{Bond, BondOrder};
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn chain(params: &[(&str, &str, f64)]) -> MoleculeSystem {
        let atoms = params
            .iter()
            .enumerate()
            .map(|(i, (name, ff_type, charge))| {
                Atom::new(i + 1, name, Point3::new(i as f64, 0.5, -1.0))
                    .with_residue(1, "POL")
                    .with_parameters(ff_type, *charge)
            })
            .collect();
        let bonds = (1..params.len())
            .map(|i| Bond::new(i - 1, i, BondOrder::Single))
            .collect();
        MoleculeSystem::from_parts("chain", atoms, bonds)
    }

    fn opls_chain() -> MoleculeSystem {
        chain(&[
            ("C1", "opls_135", -0.18),
            ("H1", "opls_140", 0.06),
            ("C2", "opls_136", -0.12),
        ])
    }

    fn gaff_chain() -> MoleculeSystem {
        chain(&[("C1", "c3", -0.09), ("H1", "hc", 0.03), ("C2", "c3", -0.06)])
    }

    fn chemistry() -> Chemistry {
        Chemistry::new("*CC*", "*C")
    }

    #[test]
    fn create_takes_parameters_from_retyped_chain() {
        let mapping =
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &gaff_chain())
                .unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.get("H1").unwrap().force_field_type, "hc");
        assert_eq!(mapping.get("C2").unwrap().charge, -0.06);
        assert_eq!(mapping.source(), "opls-aa");
        assert_eq!(mapping.target(), "gaff2");
    }

    #[test]
    fn create_fails_when_a_name_is_missing_on_either_side() {
        let short = chain(&[("C1", "c3", -0.09), ("H1", "hc", 0.03)]);
        let err = AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &short)
            .unwrap_err();
        match err {
            MappingError::Incomplete {
                only_in_source,
                only_in_target,
            } => {
                assert_eq!(only_in_source, vec!["C2".to_string()]);
                assert!(only_in_target.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let extra = chain(&[
            ("C1", "c3", -0.09),
            ("H1", "hc", 0.03),
            ("C2", "c3", -0.06),
            ("H9", "hc", 0.03),
        ]);
        assert!(matches!(
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &extra),
            Err(MappingError::Incomplete { .. })
        ));
    }

    #[test]
    fn duplicate_names_keep_the_last_occurrence() {
        let typed = chain(&[("C1", "opls_135", 0.0), ("C1", "opls_135", 0.0)]);
        let retyped = chain(&[("C1", "c3", -0.1), ("C1", "c3", -0.2)]);
        let mapping =
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &typed, &retyped).unwrap();
        assert_eq!(mapping.get("C1").unwrap().charge, -0.2);
    }

    #[test]
    fn persist_then_load_reproduces_the_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(AtomMapping::file_name("opls-aa", "gaff2"));
        let mapping =
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &gaff_chain())
                .unwrap();

        mapping.persist(&path).unwrap();
        let loaded = AtomMapping::load(&path).unwrap();

        assert_eq!(loaded, mapping);
        assert!(path.ends_with("opls-aa2gaff2.map"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[atoms.C1]"));
        assert!(text.contains("type = \"c3\""));
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.map");
        std::fs::write(&path, "source = \"opls-aa\"\n[atoms.C1]\ntype = 5\n").unwrap();
        assert!(matches!(
            AtomMapping::load(&path),
            Err(MappingError::Malformed { .. })
        ));
    }

    #[test]
    fn load_of_absent_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            AtomMapping::load(&dir.path().join("missing.map")),
            Err(MappingError::Io { .. })
        ));
    }

    #[test]
    fn load_for_rejects_mapping_built_for_other_chemistry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.map");
        AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &gaff_chain())
            .unwrap()
            .persist(&path)
            .unwrap();

        assert!(AtomMapping::load_for(&path, &Chemistry::new("[*]CC[*]", "*C")).is_ok());
        assert!(matches!(
            AtomMapping::load_for(&path, &Chemistry::new("*CC(C)*", "*C")),
            Err(MappingError::ChemistryMismatch { .. })
        ));
    }

    #[test]
    fn apply_replaces_types_and_charges_only() {
        let mapping =
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &gaff_chain())
                .unwrap();
        let full = chain(&[
            ("C1", "opls_135", -0.18),
            ("H1", "opls_140", 0.06),
            ("C2", "opls_136", -0.12),
            ("H1", "opls_140", 0.06),
        ]);

        let remapped = mapping.apply(&full).unwrap();

        assert_eq!(remapped.atom_count(), 4);
        assert_eq!(remapped.bonds(), full.bonds());
        for (before, after) in full.atoms().iter().zip(remapped.atoms()) {
            assert_eq!(before.position, after.position);
            assert_eq!(before.name, after.name);
            assert_eq!(before.residue_name, after.residue_name);
        }
        assert_eq!(remapped.atoms()[3].force_field_type, "hc");
        assert_eq!(remapped.atoms()[3].partial_charge, 0.03);
        assert_eq!(remapped.atoms()[0].force_field_type, "c3");
    }

    #[test]
    fn apply_is_all_or_nothing_and_names_every_missing_atom() {
        let mapping =
            AtomMapping::create("opls-aa", "gaff2", chemistry(), &opls_chain(), &gaff_chain())
                .unwrap();
        let full = chain(&[
            ("C1", "opls_135", -0.18),
            ("X7", "opls_999", 0.0),
            ("C9", "opls_999", 0.0),
        ]);

        match mapping.apply(&full).unwrap_err() {
            MappingError::Lookup { missing } => {
                assert_eq!(missing, vec!["C9".to_string(), "X7".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(full.atoms()[0].force_field_type, "opls_135");
    }

    #[test]
    fn chemistry_normalizes_bracketed_wildcards() {
        assert_eq!(Chemistry::new("[*]CC[*]", " *C "), Chemistry::new("*CC*", "*C"));
    }
}
