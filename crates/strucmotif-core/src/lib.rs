//! # Structural Motif Search Library
//!
//! Finds small arrangements of residues (motifs) across a large archive of
//! macromolecular structures.
//!
//! Every structure is reduced to one backbone and one side-chain representative
//! per residue. Each pair of residues within a distance cutoff is quantized into
//! a [`ResiduePairDescriptor`](core::models::descriptor::ResiduePairDescriptor)
//! and recorded in an inverted index. A query motif is decomposed the same way;
//! the structures holding every query descriptor are joined into candidate
//! residue assignments, which are then scored and filtered.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless models (identifiers, residues,
//!   structures, descriptors), the residue graph, geometry helpers and structure I/O.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the inverted index, the
//!   state repository, query validation, target assembly, hit scoring and
//!   superposition.
//!
//! - **[`workflows`]: The Public API.** Archive updates
//!   ([`MotifSearchUpdate`](workflows::update::MotifSearchUpdate)) and searches
//!   ([`MotifSearchRuntime`](workflows::search::MotifSearchRuntime)).

pub mod core;
pub mod engine;
pub mod workflows;
