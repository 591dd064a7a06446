//! # Core Models Module
//!
//! Data structures describing archive entries at residue resolution and the
//! quantized keys under which residue pairs are indexed.
//!
//! ## Key Components
//!
//! - [`ids`] - Structure and residue identifiers
//! - [`residue`] - The residue alphabet and reduced residue representation
//! - [`structure`] - Immutable residue collections with their revision
//! - [`descriptor`] - Residue-pair descriptors, geometry and quantization
//!
//! ## Usage
//!
//! ```ignore
//! use strucmotif::core::models::descriptor::{Quantizer, ResiduePairGeometry, ResiduePairOccurrence};
//!
//! let quantizer = Quantizer::new(20.0, 1.0, 10.0);
//! let geometry = ResiduePairGeometry::measure(&serine, &histidine);
//! let occurrence = ResiduePairOccurrence::new(&serine, &histidine, geometry, &quantizer);
//! ```

pub mod descriptor;
pub mod ids;
pub mod residue;
pub mod structure;
