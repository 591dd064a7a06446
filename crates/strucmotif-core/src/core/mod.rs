//! # Core Module
//!
//! Stateless building blocks of the motif search: the residue-level structure
//! model, quantized residue-pair descriptors, the spatial residue graph that
//! enumerates indexable pairs, and structure I/O.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Identifiers, residue types, structures and descriptors
//! - **Pair Extraction** ([`graph`]) - Cell-grid neighbour search producing residue-pair occurrences
//! - **File I/O** ([`io`]) - PDB reading and access to original and renumbered structure data
//! - **Utilities** ([`utils`]) - Geometry helpers and atom classification tables
//!
//! Nothing in this layer holds mutable state; the [`crate::engine`] layer owns
//! the index, the state repository and the search machinery built on top.

pub mod graph;
pub mod io;
pub mod models;
pub mod utils;
