//! Force fields known to the external tools.
//!
//! The builder parameterizes the initial system with one of its own force fields; the
//! typing tool and the system assembler then re-express it in an Amber force field.

use phf::{Map, Set, phf_map, phf_set};

/// Force fields the polymer builder ships parameter files for.
static BUILDER_FIELDS: Set<&'static str> = phf_set! {
    "opls-aa",
    "opls-ua",
    "pcff",
    "trappe",
};

/// How the typing tool and the assembler refer to an Amber-family target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetField {
    /// Value passed to the typing tool's atom-type option.
    pub atom_type_scheme: &'static str,
    /// Leap source file providing the parameters.
    pub leap_source: &'static str,
}

static TARGET_FIELDS: Map<&'static str, TargetField> = phf_map! {
    "gaff" => TargetField { atom_type_scheme: "gaff", leap_source: "leaprc.gaff" },
    "gaff2" => TargetField { atom_type_scheme: "gaff2", leap_source: "leaprc.gaff2" },
};

pub fn is_builder_field(name: &str) -> bool {
    BUILDER_FIELDS.contains(name)
}

pub fn target_field(name: &str) -> Option<&'static TargetField> {
    TARGET_FIELDS.get(name)
}

/// Lists builder force fields in a stable order, for error messages.
pub fn builder_fields() -> Vec<&'static str> {
    let mut names: Vec<_> = BUILDER_FIELDS.iter().copied().collect();
    names.sort_unstable();
    names
}

pub fn target_fields() -> Vec<&'static str> {
    let mut names: Vec<_> = TARGET_FIELDS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fields_are_recognized() {
        assert!(is_builder_field("opls-aa"));
        assert!(is_builder_field("trappe"));
        assert!(!is_builder_field("gaff2"));
        assert_eq!(builder_fields(), vec!["opls-aa", "opls-ua", "pcff", "trappe"]);
    }

    #[test]
    fn targets_carry_typing_scheme_and_leap_source() {
        let gaff2 = target_field("gaff2").unwrap();
        assert_eq!(gaff2.atom_type_scheme, "gaff2");
        assert_eq!(gaff2.leap_source, "leaprc.gaff2");
        assert_eq!(target_field("gaff").unwrap().leap_source, "leaprc.gaff");
        assert!(target_field("opls-aa").is_none());
        assert_eq!(target_fields(), vec!["gaff", "gaff2"]);
    }
}
