use thiserror::Error;

use super::alignment::AlignmentError;
use super::config::ConfigError;
use super::index::IndexError;
use super::state::StateError;
use crate::core::io::pdb::PdbError;
use crate::core::io::provider::ProviderError;
use crate::core::models::ids::{ResidueIdentifier, StructureIdentifier};

/// Invalid requests, rejected before any index or state access.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("Motif contains no residues")]
    EmptyMotif,

    #[error("Motif needs at least 2 residues, got {count}")]
    TooFewResidues { count: usize },

    #[error("Motif has {count} residues, exceeding the configured maximum of {max}")]
    MotifTooLarge { count: usize, max: usize },

    #[error("Residue {0} not found in query structure")]
    ResidueNotFound(ResidueIdentifier),

    #[error("Residue {0} is selected more than once")]
    DuplicateResidue(ResidueIdentifier),

    #[error(
        "Residues {a} and {b} are {distance:.2} Å apart, beyond the distance cutoff (maybe distance cutoff exceeded?)"
    )]
    PairBeyondCutoff {
        a: ResidueIdentifier,
        b: ResidueIdentifier,
        distance: f64,
    },

    #[error("Unknown scoring strategy '{0}' (expected 'descriptor' or 'alignment')")]
    UnknownScoringStrategy(String),

    #[error("Unknown atom pairing scheme '{0}' (expected 'backbone', 'side-chain' or 'all')")]
    UnknownPairingScheme(String),

    #[error("Unknown update operation '{0}' (expected 'add', 'remove' or 'recover')")]
    UnknownOperation(String),

    #[error("Invalid residue type '{0}'")]
    InvalidResidueType(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Index operation failed: {0}")]
    Index(#[from] IndexError),

    #[error("State repository operation failed: {0}")]
    State(#[from] StateError),

    #[error("Structure data access failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("Failed to parse structure '{id}': {source}")]
    Structure {
        id: StructureIdentifier,
        #[source]
        source: PdbError,
    },

    #[error("Motif extraction failed for '{id}': {reason}")]
    Extraction {
        id: StructureIdentifier,
        reason: String,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
