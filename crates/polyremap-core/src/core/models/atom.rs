use nalgebra::Point3;

/// Represents an atom of a molecular system together with its force-field assignment.
///
/// The atom name identifies the atom within its molecule under the naming scheme of
/// the builder that produced it. It is the key used when translating parameters
/// between force fields, so two systems built from the same chemistry share names.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The 1-based serial number as it appeared in the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "C1", "H12").
    pub name: String,
    /// The force field atom type (e.g., "c3", "opls_135").
    pub force_field_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The label of the residue this atom belongs to (e.g., "POL").
    pub residue_name: String,
    /// The number of the residue this atom belongs to.
    pub residue_number: isize,
}

impl Atom {
    /// Creates a new `Atom` with an empty type and zero charge.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            force_field_type: String::new(),
            partial_charge: 0.0,
            position,
            residue_name: String::new(),
            residue_number: 1,
        }
    }

    pub fn with_residue(mut self, number: isize, name: &str) -> Self {
        self.residue_number = number;
        self.residue_name = name.to_string();
        self
    }

    pub fn with_parameters(mut self, force_field_type: &str, partial_charge: f64) -> Self {
        self.force_field_type = force_field_type.to_string();
        self.partial_charge = partial_charge;
        self
    }
}
