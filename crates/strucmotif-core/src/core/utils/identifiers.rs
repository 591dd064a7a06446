use phf::{Set, phf_set};

/// Atom whose position represents the residue backbone.
pub const BACKBONE_REPRESENTATIVE_ATOM: &str = "CA";

static PROTEIN_BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "CA", "C", "O", "OXT", "OT1", "OT2",
};

static HYDROGEN_ELEMENTS: Set<&'static str> = phf_set! {
    "H", "D",
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    PROTEIN_BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

/// Classifies by element symbol when the record provides one, otherwise by the
/// leading character of the atom name.
pub fn is_heavy_atom(atom_name: &str, element: Option<&str>) -> bool {
    if let Some(element) = element.map(str::trim).filter(|e| !e.is_empty()) {
        return !HYDROGEN_ELEMENTS.contains(element.to_ascii_uppercase().as_str());
    }
    let first_char = atom_name
        .trim()
        .chars()
        .find(|c| !c.is_ascii_digit())
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}

/// Atoms contributing to the side-chain representative coordinate.
pub fn is_side_chain_heavy_atom(atom_name: &str, element: Option<&str>) -> bool {
    !is_backbone_atom(atom_name) && is_heavy_atom(atom_name, element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_backbone_atom_recognizes_standard_backbone_atoms() {
        assert!(is_backbone_atom("N"));
        assert!(is_backbone_atom("CA"));
        assert!(is_backbone_atom("C"));
        assert!(is_backbone_atom("O"));
        assert!(is_backbone_atom("OXT"));
    }

    #[test]
    fn is_backbone_atom_is_case_sensitive_and_trims_whitespace() {
        assert!(!is_backbone_atom("ca"));
        assert!(is_backbone_atom(" CA "));
        assert!(!is_backbone_atom("CB"));
    }

    #[test]
    fn is_heavy_atom_prefers_the_element_column() {
        assert!(!is_heavy_atom("HG", Some("H")));
        assert!(is_heavy_atom("HG", Some("HG")));
        assert!(!is_heavy_atom("D1", Some(" D")));
    }

    #[test]
    fn is_heavy_atom_falls_back_to_atom_name() {
        assert!(!is_heavy_atom("HA", None));
        assert!(!is_heavy_atom("1HB", None));
        assert!(!is_heavy_atom("H", Some("")));
        assert!(is_heavy_atom("CB", None));
        assert!(is_heavy_atom(" SG ", None));
    }

    #[test]
    fn side_chain_heavy_atoms_exclude_backbone_and_hydrogens() {
        assert!(is_side_chain_heavy_atom("CB", None));
        assert!(is_side_chain_heavy_atom("OG", Some("O")));
        assert!(!is_side_chain_heavy_atom("CA", None));
        assert!(!is_side_chain_heavy_atom("HB2", None));
    }
}
