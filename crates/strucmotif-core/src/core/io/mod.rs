//! Structure input and storage.
//!
//! [`pdb`] reduces fixed-column PDB files to residue-level [`Structure`](crate::core::models::structure::Structure)s,
//! and [`provider`] abstracts where original files and their renumbered form live.

pub mod pdb;
pub mod provider;
pub mod traits;
