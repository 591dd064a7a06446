//! # Engine Module
//!
//! Stateful machinery behind motif search and index maintenance.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Quantization, partitioning and result limits
//! - **Persistence** ([`index`], [`state`]) - The inverted descriptor index and the known/dirty bookkeeping
//! - **Queries** ([`query`]) - Validated motif queries with tolerances and exchanges
//! - **Assembly** ([`assembler`]) - Joining index lookups into complete motif occurrences per target
//! - **Scoring** ([`scoring`], [`alignment`]) - Descriptor deviation scoring and rigid superposition
//! - **Results** ([`result`]) - Hits and timing breakdown of a search
//! - **Progress Monitoring** ([`progress`]) - Progress events for long-running updates
//! - **Error Handling** ([`error`]) - Input validation errors and the engine error taxonomy
//!
//! Every component receives its collaborators (index, state repository, data
//! provider, alignment service) explicitly; nothing here relies on global state.

pub mod alignment;
pub mod assembler;
pub mod config;
pub mod error;
pub mod index;
pub mod progress;
pub mod query;
pub mod result;
pub mod scoring;
pub mod state;
