use super::ids::{ResidueIdentifier, StructureIdentifier};
use super::residue::Residue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Revision (major.minor) of an archive entry.
///
/// Only used to detect that an entry changed between update runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision {
    pub major: u32,
    pub minor: u32,
}

impl Revision {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self { major: 1, minor: 0 }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Serialize, Deserialize)]
struct StructureData {
    identifier: StructureIdentifier,
    revision: Revision,
    residues: Vec<Residue>,
}

/// An immutable, ordered collection of polymer residues of one archive entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StructureData", into = "StructureData")]
pub struct Structure {
    identifier: StructureIdentifier,
    revision: Revision,
    residues: Vec<Residue>,
    residue_index: HashMap<ResidueIdentifier, usize>, // Lookup from position to index in `residues`
}

impl Structure {
    /// Builds a structure; later residues with an already seen identifier are dropped.
    pub fn new(identifier: StructureIdentifier, revision: Revision, residues: Vec<Residue>) -> Self {
        let mut unique = Vec::with_capacity(residues.len());
        let mut residue_index = HashMap::with_capacity(residues.len());
        for residue in residues {
            if residue_index.contains_key(&residue.identifier) {
                continue;
            }
            residue_index.insert(residue.identifier, unique.len());
            unique.push(residue);
        }
        Self {
            identifier,
            revision,
            residues: unique,
            residue_index,
        }
    }

    pub fn identifier(&self) -> &StructureIdentifier {
        &self.identifier
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, id: &ResidueIdentifier) -> Option<&Residue> {
        self.residue_index.get(id).map(|&i| &self.residues[i])
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

impl From<StructureData> for Structure {
    fn from(data: StructureData) -> Self {
        Structure::new(data.identifier, data.revision, data.residues)
    }
}

impl From<Structure> for StructureData {
    fn from(structure: Structure) -> Self {
        Self {
            identifier: structure.identifier,
            revision: structure.revision,
            residues: structure.residues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ResidueType;
    use nalgebra::Point3;

    fn residue(chain_id: char, seq_id: isize, residue_type: ResidueType) -> Residue {
        Residue::new(
            ResidueIdentifier::new(chain_id, seq_id),
            residue_type,
            Point3::new(seq_id as f64, 0.0, 0.0),
            None,
        )
    }

    #[test]
    fn residues_are_addressable_by_identifier() {
        let structure = Structure::new(
            StructureIdentifier::new("1abc"),
            Revision::new(2, 1),
            vec![
                residue('A', 1, ResidueType::Serine),
                residue('B', 1, ResidueType::Histidine),
            ],
        );

        assert_eq!(structure.len(), 2);
        assert_eq!(
            structure
                .residue(&ResidueIdentifier::new('B', 1))
                .unwrap()
                .residue_type,
            ResidueType::Histidine
        );
        assert!(structure.residue(&ResidueIdentifier::new('C', 1)).is_none());
        assert_eq!(structure.revision().to_string(), "2.1");
    }

    #[test]
    fn duplicate_residue_identifiers_keep_the_first_occurrence() {
        let structure = Structure::new(
            StructureIdentifier::new("1abc"),
            Revision::default(),
            vec![
                residue('A', 5, ResidueType::Serine),
                residue('A', 5, ResidueType::Alanine),
            ],
        );

        assert_eq!(structure.len(), 1);
        assert_eq!(structure.residues()[0].residue_type, ResidueType::Serine);
    }

    #[test]
    fn serialized_structure_rebuilds_its_lookup_table() {
        let structure = Structure::new(
            StructureIdentifier::new("1abc"),
            Revision::new(3, 0),
            vec![residue('A', 7, ResidueType::Cysteine)],
        );

        let text = toml::to_string(&structure).unwrap();
        let restored: Structure = toml::from_str(&text).unwrap();

        assert_eq!(restored, structure);
        assert!(restored.residue(&ResidueIdentifier::new('A', 7)).is_some());
    }
}
