use std::fmt;
use std::str::FromStr;

/// Bond types as they are written in Tripos MOL2 files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
    Amide,
    Dummy,
    Unknown,
    NotConnected,
}

impl BondOrder {
    pub fn as_mol2(&self) -> &'static str {
        match self {
            BondOrder::Single => "1",
            BondOrder::Double => "2",
            BondOrder::Triple => "3",
            BondOrder::Aromatic => "ar",
            BondOrder::Amide => "am",
            BondOrder::Dummy => "du",
            BondOrder::Unknown => "un",
            BondOrder::NotConnected => "nc",
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mol2())
    }
}

impl FromStr for BondOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" => Ok(BondOrder::Single),
            "2" => Ok(BondOrder::Double),
            "3" => Ok(BondOrder::Triple),
            "ar" => Ok(BondOrder::Aromatic),
            "am" => Ok(BondOrder::Amide),
            "du" => Ok(BondOrder::Dummy),
            "un" => Ok(BondOrder::Unknown),
            "nc" => Ok(BondOrder::NotConnected),
            _ => Err(()),
        }
    }
}

/// A bond between two atoms, referenced by their 0-based index in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1_idx: usize,
    pub atom2_idx: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1_idx: usize, atom2_idx: usize, order: BondOrder) -> Self {
        Self {
            atom1_idx,
            atom2_idx,
            order,
        }
    }

    pub fn contains(&self, atom_idx: usize) -> bool {
        self.atom1_idx == atom_idx || self.atom2_idx == atom_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_parses_mol2_tokens_case_insensitively() {
        assert_eq!("1".parse(), Ok(BondOrder::Single));
        assert_eq!("AR".parse(), Ok(BondOrder::Aromatic));
        assert_eq!("am".parse(), Ok(BondOrder::Amide));
        assert_eq!("x".parse::<BondOrder>(), Err(()));
    }

    #[test]
    fn bond_order_display_matches_mol2_token() {
        assert_eq!(BondOrder::Double.to_string(), "2");
        assert_eq!(BondOrder::NotConnected.to_string(), "nc");
    }

    #[test]
    fn bond_contains_reports_both_ends() {
        let bond = Bond::new(2, 5, BondOrder::Single);
        assert!(bond.contains(2));
        assert!(bond.contains(5));
        assert!(!bond.contains(3));
    }
}
