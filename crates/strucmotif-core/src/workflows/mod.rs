//! # Workflows Module
//!
//! Top-level entry points that tie the [`crate::core`] models and the
//! [`crate::engine`] components together.
//!
//! - **Update Workflow** ([`update`]) - Adds structures to and removes them from
//!   an archive, keeping the inverted index, the renumbered structures and the
//!   known/dirty state consistent, including recovery after interrupted runs.
//! - **Search Workflow** ([`search`]) - Answers motif queries: target assembly
//!   from the index, scoring, cutoffs and ranking.
//!
//! Both workflows borrow their collaborators, so the same index, state
//! repository and data provider can serve any number of runs.

pub mod search;
pub mod update;
