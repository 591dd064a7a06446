use crate::core::graph::ResidueGraph;
use crate::core::io::pdb::PdbFile;
use crate::core::io::provider::{ProviderError, StructureDataProvider};
use crate::core::io::traits::StructureFile;
use crate::core::models::descriptor::ResiduePairDescriptor;
use crate::core::models::ids::StructureIdentifier;
use crate::core::models::structure::Revision;
use crate::engine::config::MotifSearchConfig;
use crate::engine::error::{EngineError, InputError};
use crate::engine::index::{InvertedIndex, OccurrenceMap};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::StateRepository;
use dashmap::DashMap;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    Recover,
}

impl FromStr for Operation {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Operation::Add),
            "remove" => Ok(Operation::Remove),
            "recover" => Ok(Operation::Recover),
            _ => Err(InputError::UnknownOperation(s.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("ADD"),
            Operation::Remove => f.write_str("REMOVE"),
            Operation::Recover => f.write_str("RECOVER"),
        }
    }
}

/// Outcome of one update run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSummary {
    /// Structures indexed and marked known.
    pub added: Vec<StructureIdentifier>,
    /// Structures without source file or usable residues.
    pub skipped: Vec<StructureIdentifier>,
    pub removed: Vec<StructureIdentifier>,
    /// Dirty structures left behind by an interrupted run and cleaned up.
    pub recovered: Vec<StructureIdentifier>,
}

/// Per-partition buffer: descriptor, then structure, then residue pairs.
type DescriptorBuffer = DashMap<ResiduePairDescriptor, OccurrenceMap>;

enum Extraction {
    Indexed { revision: Revision },
    Skipped,
}

/// Keeps the inverted index, the state repository and the renumbered structure
/// store consistent while structures are added or removed.
///
/// A structure becomes known only after its descriptors were inserted and
/// committed. Every partition is marked dirty before extraction starts, so an
/// interrupted run leaves at most one partition dirty; the next run removes it
/// again before doing anything else.
pub struct MotifSearchUpdate<'a> {
    state: &'a dyn StateRepository,
    provider: &'a dyn StructureDataProvider,
    index: &'a dyn InvertedIndex,
    config: &'a MotifSearchConfig,
    reporter: &'a ProgressReporter<'a>,
}

impl<'a> MotifSearchUpdate<'a> {
    pub fn new(
        state: &'a dyn StateRepository,
        provider: &'a dyn StructureDataProvider,
        index: &'a dyn InvertedIndex,
        config: &'a MotifSearchConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            state,
            provider,
            index,
            config,
            reporter,
        }
    }

    #[instrument(skip_all, name = "update_workflow", fields(operation = %operation))]
    pub fn run(
        &self,
        operation: Operation,
        requested: &[StructureIdentifier],
    ) -> Result<UpdateSummary, EngineError> {
        let mut summary = UpdateSummary::default();

        if operation != Operation::Recover {
            summary.recovered = self.recover()?;
        }

        info!(
            "Starting update - Operation: {}, {} ids ({})",
            operation,
            requested.len(),
            preview(requested)
        );

        match operation {
            Operation::Add => {
                let delta = self.delta_plus(requested)?;
                self.add(&delta, &mut summary)?;
            }
            Operation::Remove => {
                let delta = self.delta_minus(requested)?;
                self.remove(&delta)?;
                summary.removed = delta;
            }
            Operation::Recover => {
                summary.recovered = self.recover()?;
            }
        }

        info!("Finished update operation");
        Ok(summary)
    }

    /// Removes every structure left dirty by an interrupted run.
    pub fn recover(&self) -> Result<Vec<StructureIdentifier>, EngineError> {
        let dirty: Vec<StructureIdentifier> = self.state.select_dirty()?.into_iter().sorted().collect();
        if dirty.is_empty() {
            return Ok(dirty);
        }
        warn!(
            "Update state is dirty - problematic identifiers: [{}]",
            dirty.iter().join(", ")
        );
        info!("Recovering from dirty state");
        self.remove(&dirty)?;
        Ok(dirty)
    }

    /// Requested structures that are not known yet, in request order.
    pub fn delta_plus(&self, requested: &[StructureIdentifier]) -> Result<Vec<StructureIdentifier>, EngineError> {
        let known = self.state.select_known()?;
        if known.is_empty() {
            warn!("No existing data - starting from scratch");
        }
        Ok(requested
            .iter()
            .filter(|id| !known.contains_key(*id))
            .unique()
            .cloned()
            .collect())
    }

    /// Requested structures that are known, in request order; others are ignored.
    pub fn delta_minus(&self, requested: &[StructureIdentifier]) -> Result<Vec<StructureIdentifier>, EngineError> {
        let known = self.state.select_known()?;
        if known.is_empty() {
            warn!("No existing data - no need for cleanup of obsolete entries");
            return Ok(Vec::new());
        }
        Ok(requested
            .iter()
            .filter(|id| known.contains_key(*id))
            .unique()
            .cloned()
            .collect())
    }

    /// Indexes `identifiers` partition by partition.
    pub fn add(&self, identifiers: &[StructureIdentifier], summary: &mut UpdateSummary) -> Result<(), EngineError> {
        info!("{} files to process in total", identifiers.len());
        if identifiers.is_empty() {
            return Ok(());
        }

        let chunk_size = self.config.update_chunk_size;
        let partitions: Vec<&[StructureIdentifier]> = identifiers.chunks(chunk_size).collect();
        info!(
            "Formed {} partitions of {} structures",
            partitions.len(),
            chunk_size
        );

        for (i, partition) in partitions.iter().enumerate() {
            let context = format!("{} / {}", i + 1, partitions.len());
            info!("[{}] Start processing partition", context);
            self.reporter.report(Progress::PartitionStart {
                index: i + 1,
                total: partitions.len(),
                structures: partition.len(),
            });

            let members: HashSet<StructureIdentifier> = partition.iter().cloned().collect();
            self.state.insert_dirty(&members)?;

            let buffer = DescriptorBuffer::new();
            self.reporter.report(Progress::TaskStart {
                total_steps: partition.len() as u64,
            });
            let outcomes = partition
                .par_iter()
                .map(|id| {
                    let outcome = self.extract(id, &buffer, &context);
                    self.reporter.report(Progress::TaskIncrement);
                    outcome.map(|extraction| (id, extraction))
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.reporter.report(Progress::TaskFinish);

            let mut processed = Vec::new();
            for (id, extraction) in outcomes {
                match extraction {
                    Extraction::Indexed { revision } => processed.push((id.clone(), revision)),
                    Extraction::Skipped => summary.skipped.push(id.clone()),
                }
            }

            self.persist(buffer, &context)?;
            self.state.insert_known(&processed)?;
            self.state.delete_dirty(&members)?;
            summary.added.extend(processed.into_iter().map(|(id, _)| id));
        }
        Ok(())
    }

    fn extract(
        &self,
        id: &StructureIdentifier,
        buffer: &DescriptorBuffer,
        context: &str,
    ) -> Result<Extraction, EngineError> {
        let mut reader = match self.provider.original_input(id) {
            Ok(reader) => reader,
            Err(ProviderError::SourceMissing(_)) => {
                warn!("[{}] [{}] Source file missing unexpectedly - obsolete entry?", context, id);
                self.reporter
                    .report(Progress::Message(format!("Skipped {}: source file missing", id)));
                return Ok(Extraction::Skipped);
            }
            Err(e) => return Err(e.into()),
        };
        let parsed = PdbFile::read_from(&mut reader, id.clone()).map_err(|source| {
            EngineError::Structure {
                id: id.clone(),
                source,
            }
        })?;
        self.provider.write_renumbered(id, &parsed)?;

        let structure = match self.provider.read_renumbered(id) {
            Ok(structure) => structure,
            Err(ProviderError::SourceMissing(_)) => {
                warn!("[{}] [{}] Source file missing unexpectedly - obsolete entry?", context, id);
                return Ok(Extraction::Skipped);
            }
            Err(ProviderError::NoPolymerChain(_)) => {
                warn!("[{}] [{}] No valid polymer chains", context, id);
                self.reporter
                    .report(Progress::Message(format!("Skipped {}: no valid polymer chains", id)));
                self.provider.delete_renumbered(id)?;
                return Ok(Extraction::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let quantizer = self.config.quantizer();
        let occurrences = panic::catch_unwind(AssertUnwindSafe(|| {
            ResidueGraph::new(&structure, quantizer).par_residue_pair_occurrences()
        }))
        .map_err(|payload| {
            warn!("[{}] [{}] Residue graph determination failed", context, id);
            EngineError::Extraction {
                id: id.clone(),
                reason: panic_message(payload.as_ref()),
            }
        })?;

        if occurrences.is_empty() {
            warn!("[{}] [{}] No residue pairs within distance cutoff", context, id);
            self.provider.delete_renumbered(id)?;
            return Ok(Extraction::Skipped);
        }

        for occurrence in &occurrences {
            buffer
                .entry(occurrence.descriptor)
                .or_default()
                .entry(id.clone())
                .or_default()
                .insert(occurrence.identifier);
        }
        info!(structure = %id, pairs = occurrences.len(), "[{}] Extracted residue pairs", context);

        Ok(Extraction::Indexed {
            revision: structure.revision(),
        })
    }

    fn persist(&self, buffer: DescriptorBuffer, context: &str) -> Result<(), EngineError> {
        let total = buffer.len();
        info!("[{}] Persisting {} unique residue pair descriptors", context, total);
        self.reporter.report(Progress::TaskStart {
            total_steps: total as u64,
        });

        let entries: Vec<(ResiduePairDescriptor, OccurrenceMap)> = buffer.into_iter().collect();
        entries
            .into_par_iter()
            .try_for_each(|(descriptor, occurrences)| {
                self.index.insert(descriptor, occurrences)?;
                self.reporter.report(Progress::TaskIncrement);
                Ok::<_, EngineError>(())
            })?;
        self.index.commit()?;

        self.reporter.report(Progress::TaskFinish);
        Ok(())
    }

    /// Deletes renumbered data, index occurrences and state of `identifiers`.
    ///
    /// The structures stay dirty until everything is gone, so an interrupted
    /// removal is finished by the next run.
    pub fn remove(&self, identifiers: &[StructureIdentifier]) -> Result<(), EngineError> {
        if identifiers.is_empty() {
            return Ok(());
        }
        self.reporter.report(Progress::PhaseStart {
            name: "Removing structures",
        });
        let members: HashSet<StructureIdentifier> = identifiers.iter().cloned().collect();
        self.state.insert_dirty(&members)?;
        self.state.delete_known(&members)?;

        for (i, id) in identifiers.iter().enumerate() {
            info!(
                "[{} / {}] Removing renumbered structure for entry: {}",
                i + 1,
                identifiers.len(),
                id
            );
            self.provider.delete_renumbered(id)?;
        }

        self.index.delete(&members)?;
        self.index.commit()?;
        self.state.delete_dirty(&members)?;
        debug!("Removed {} structures from index", members.len());
        self.reporter.report(Progress::PhaseFinish);
        info!("Finished removal operation");
        Ok(())
    }
}

fn preview(ids: &[StructureIdentifier]) -> String {
    let shown = ids.iter().take(5).map(|id| format!("\"{}\"", id)).join(", ");
    if ids.len() > 5 {
        format!("[{}, ...]", shown)
    } else {
        format!("[{}]", shown)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
