use super::ids::ResidueIdentifier;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The residue alphabet indexed by the motif search.
///
/// Variants are declared in one-letter code order, so the derived `Ord` is the
/// lexicographic order used to canonicalize residue-pair descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResidueType {
    Alanine,       // A
    Cysteine,      // C
    AsparticAcid,  // D
    GlutamicAcid,  // E
    Phenylalanine, // F
    Glycine,       // G
    Histidine,     // H
    Isoleucine,    // I
    Lysine,        // K
    Leucine,       // L
    Methionine,    // M
    Asparagine,    // N
    Proline,       // P
    Glutamine,     // Q
    Arginine,      // R
    Serine,        // S
    Threonine,     // T
    Valine,        // V
    Tryptophan,    // W
    Tyrosine,      // Y
}

impl ResidueType {
    pub const ALL: [ResidueType; 20] = [
        ResidueType::Alanine,
        ResidueType::Cysteine,
        ResidueType::AsparticAcid,
        ResidueType::GlutamicAcid,
        ResidueType::Phenylalanine,
        ResidueType::Glycine,
        ResidueType::Histidine,
        ResidueType::Isoleucine,
        ResidueType::Lysine,
        ResidueType::Leucine,
        ResidueType::Methionine,
        ResidueType::Asparagine,
        ResidueType::Proline,
        ResidueType::Glutamine,
        ResidueType::Arginine,
        ResidueType::Serine,
        ResidueType::Threonine,
        ResidueType::Valine,
        ResidueType::Tryptophan,
        ResidueType::Tyrosine,
    ];

    pub fn from_three_letter(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "ALA" => Some(ResidueType::Alanine),
            "CYS" => Some(ResidueType::Cysteine),
            "ASP" => Some(ResidueType::AsparticAcid),
            "GLU" => Some(ResidueType::GlutamicAcid),
            "PHE" => Some(ResidueType::Phenylalanine),
            "GLY" => Some(ResidueType::Glycine),
            "HIS" | "HSE" | "HSD" | "HSP" => Some(ResidueType::Histidine),
            "ILE" => Some(ResidueType::Isoleucine),
            "LYS" => Some(ResidueType::Lysine),
            "LEU" => Some(ResidueType::Leucine),
            "MET" => Some(ResidueType::Methionine),
            "ASN" => Some(ResidueType::Asparagine),
            "PRO" => Some(ResidueType::Proline),
            "GLN" => Some(ResidueType::Glutamine),
            "ARG" => Some(ResidueType::Arginine),
            "SER" => Some(ResidueType::Serine),
            "THR" => Some(ResidueType::Threonine),
            "VAL" => Some(ResidueType::Valine),
            "TRP" => Some(ResidueType::Tryptophan),
            "TYR" => Some(ResidueType::Tyrosine),
            _ => None,
        }
    }

    pub fn from_one_letter(code: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.to_one_letter() == code.to_ascii_uppercase())
    }

    pub fn to_three_letter(&self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Cysteine => "CYS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Glycine => "GLY",
            ResidueType::Histidine => "HIS",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Lysine => "LYS",
            ResidueType::Leucine => "LEU",
            ResidueType::Methionine => "MET",
            ResidueType::Asparagine => "ASN",
            ResidueType::Proline => "PRO",
            ResidueType::Glutamine => "GLN",
            ResidueType::Arginine => "ARG",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Valine => "VAL",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
        }
    }

    pub fn to_one_letter(&self) -> char {
        match self {
            ResidueType::Alanine => 'A',
            ResidueType::Cysteine => 'C',
            ResidueType::AsparticAcid => 'D',
            ResidueType::GlutamicAcid => 'E',
            ResidueType::Phenylalanine => 'F',
            ResidueType::Glycine => 'G',
            ResidueType::Histidine => 'H',
            ResidueType::Isoleucine => 'I',
            ResidueType::Lysine => 'K',
            ResidueType::Leucine => 'L',
            ResidueType::Methionine => 'M',
            ResidueType::Asparagine => 'N',
            ResidueType::Proline => 'P',
            ResidueType::Glutamine => 'Q',
            ResidueType::Arginine => 'R',
            ResidueType::Serine => 'S',
            ResidueType::Threonine => 'T',
            ResidueType::Valine => 'V',
            ResidueType::Tryptophan => 'W',
            ResidueType::Tyrosine => 'Y',
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid residue type string: '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    /// Accepts three-letter names (`HIS`) as well as one-letter codes (`H`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let parsed = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_one_letter(c),
            _ => Self::from_three_letter(trimmed),
        };
        parsed.ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_three_letter())
    }
}

/// A polymer residue reduced to the two representative coordinates the motif
/// descriptors are computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residue {
    pub identifier: ResidueIdentifier,
    pub residue_type: ResidueType,
    pub backbone: Point3<f64>, // Alpha carbon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_chain: Option<Point3<f64>>, // Centroid of side-chain heavy atoms
}

impl Residue {
    pub fn new(
        identifier: ResidueIdentifier,
        residue_type: ResidueType,
        backbone: Point3<f64>,
        side_chain: Option<Point3<f64>>,
    ) -> Self {
        Self {
            identifier,
            residue_type,
            backbone,
            side_chain,
        }
    }

    /// Side-chain representative, falling back to the backbone position for
    /// residues without side-chain atoms (glycine, truncated models).
    pub fn side_chain_or_backbone(&self) -> Point3<f64> {
        self.side_chain.unwrap_or(self.backbone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_order_matches_one_letter_code_order() {
        let mut by_code = ResidueType::ALL.to_vec();
        by_code.sort_by_key(|t| t.to_one_letter());
        assert_eq!(by_code, ResidueType::ALL.to_vec());
        assert!(ResidueType::AsparticAcid < ResidueType::Histidine);
        assert!(ResidueType::Histidine < ResidueType::Serine);
    }

    #[test]
    fn parses_three_letter_and_one_letter_codes() {
        assert_eq!("HIS".parse::<ResidueType>().unwrap(), ResidueType::Histidine);
        assert_eq!("hsd".parse::<ResidueType>().unwrap(), ResidueType::Histidine);
        assert_eq!("s".parse::<ResidueType>().unwrap(), ResidueType::Serine);
        assert!("XYZ".parse::<ResidueType>().is_err());
        assert!("B".parse::<ResidueType>().is_err());
    }

    #[test]
    fn side_chain_falls_back_to_backbone_when_absent() {
        let glycine = Residue::new(
            ResidueIdentifier::new('A', 1),
            ResidueType::Glycine,
            Point3::new(1.0, 2.0, 3.0),
            None,
        );
        assert_eq!(glycine.side_chain_or_backbone(), Point3::new(1.0, 2.0, 3.0));

        let serine = Residue::new(
            ResidueIdentifier::new('A', 2),
            ResidueType::Serine,
            Point3::origin(),
            Some(Point3::new(0.0, 1.5, 0.0)),
        );
        assert_eq!(serine.side_chain_or_backbone(), Point3::new(0.0, 1.5, 0.0));
    }
}
