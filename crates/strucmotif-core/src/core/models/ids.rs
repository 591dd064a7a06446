use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Archive key of a structure (e.g. a 4-character PDB accession).
///
/// Identifiers are normalized to lowercase on construction so that `1ACJ` and
/// `1acj` address the same archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureIdentifier(String);

impl StructureIdentifier {
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StructureIdentifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Position of a residue within one structure: chain label, sequence number
/// and optional insertion code (`A:184` and `A:184A` are distinct residues).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResidueIdentifier {
    pub chain_id: char,
    pub seq_id: isize,
    pub insertion_code: Option<char>,
}

impl ResidueIdentifier {
    pub fn new(chain_id: char, seq_id: isize) -> Self {
        Self {
            chain_id,
            seq_id,
            insertion_code: None,
        }
    }

    pub fn with_insertion_code(self, insertion_code: char) -> Self {
        Self {
            insertion_code: Some(insertion_code),
            ..self
        }
    }
}

impl fmt::Display for ResidueIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.seq_id)?;
        if let Some(code) = self.insertion_code {
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid residue identifier '{0}' (expected CHAIN:NUMBER[INSERTION], e.g. A:57 or A:184A)")]
pub struct ParseResidueIdentifierError(pub String);

impl FromStr for ResidueIdentifier {
    type Err = ParseResidueIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResidueIdentifierError(s.to_string());
        let (chain, number) = s.trim().split_once(':').ok_or_else(err)?;
        let mut chars = chain.chars();
        let chain_id = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(err()),
        };
        let number = number.trim();
        let (number, insertion_code) = match number.chars().last() {
            Some(c) if c.is_ascii_alphabetic() => (&number[..number.len() - 1], Some(c)),
            _ => (number, None),
        };
        let seq_id = number.parse::<isize>().map_err(|_| err())?;
        Ok(Self {
            chain_id,
            seq_id,
            insertion_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_identifier_is_normalized_to_lowercase() {
        assert_eq!(StructureIdentifier::new(" 1ACJ "), StructureIdentifier::new("1acj"));
        assert_eq!(StructureIdentifier::new("4HHB").as_str(), "4hhb");
    }

    #[test]
    fn residue_identifier_parses_chain_and_number() {
        let id: ResidueIdentifier = "B:57".parse().unwrap();
        assert_eq!(id, ResidueIdentifier::new('B', 57));
        assert_eq!(id.to_string(), "B:57");
    }

    #[test]
    fn residue_identifier_accepts_negative_numbers() {
        let id: ResidueIdentifier = "A:-3".parse().unwrap();
        assert_eq!(id.seq_id, -3);
    }

    #[test]
    fn residue_identifier_keeps_insertion_code() {
        let id: ResidueIdentifier = "A:184A".parse().unwrap();
        assert_eq!(id, ResidueIdentifier::new('A', 184).with_insertion_code('A'));
        assert_ne!(id, ResidueIdentifier::new('A', 184));
        assert_eq!(id.to_string(), "A:184A");
        assert!(ResidueIdentifier::new('A', 184) < id);
    }

    #[test]
    fn residue_identifier_rejects_malformed_input() {
        assert!("A57".parse::<ResidueIdentifier>().is_err());
        assert!("A:A".parse::<ResidueIdentifier>().is_err());
        assert!("A:12AB".parse::<ResidueIdentifier>().is_err());
        assert!("AB:57".parse::<ResidueIdentifier>().is_err());
        assert!("A:x".parse::<ResidueIdentifier>().is_err());
        assert!(":5".parse::<ResidueIdentifier>().is_err());
    }
}
