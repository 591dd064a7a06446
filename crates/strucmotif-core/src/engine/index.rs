use crate::core::models::descriptor::{Quantizer, ResiduePairDescriptor, ResiduePairIdentifier};
use crate::core::models::ids::StructureIdentifier;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

/// Occurrences of one descriptor, grouped by the structure they were found in.
pub type OccurrenceMap = HashMap<StructureIdentifier, HashSet<ResiduePairIdentifier>>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Descriptor {descriptor} already holds occurrences of structure '{structure}'")]
    DuplicateEntry {
        descriptor: ResiduePairDescriptor,
        structure: StructureIdentifier,
    },
    #[error("Index snapshot I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Index snapshot is corrupt or unreadable: {0}")]
    Serialization(String),
    #[error(
        "Index was built with {stored:?} but the configuration requests {configured:?}; rebuild the index or restore the binning parameters"
    )]
    QuantizerMismatch {
        stored: Quantizer,
        configured: Quantizer,
    },
    #[error("Index lock is poisoned")]
    Poisoned,
}

/// Mapping from residue-pair descriptor to every archive location holding it.
pub trait InvertedIndex: Send + Sync {
    /// Adds the occurrences of one descriptor.
    ///
    /// Fails with [`IndexError::DuplicateEntry`] if any of the structures is
    /// already present under `descriptor`, in which case nothing is inserted.
    fn insert(&self, descriptor: ResiduePairDescriptor, occurrences: OccurrenceMap) -> Result<(), IndexError>;

    /// Exact-match lookup; an unknown descriptor yields an empty map.
    fn lookup(&self, descriptor: &ResiduePairDescriptor) -> Result<OccurrenceMap, IndexError>;

    /// Removes every occurrence of the given structures in a single pass.
    fn delete(&self, structures: &HashSet<StructureIdentifier>) -> Result<(), IndexError>;

    /// Makes preceding writes durable.
    fn commit(&self) -> Result<(), IndexError> {
        Ok(())
    }

    /// Number of distinct descriptors stored.
    fn len(&self) -> Result<usize, IndexError>;

    fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }
}

type DescriptorTable = HashMap<ResiduePairDescriptor, OccurrenceMap>;

#[derive(Debug, Default)]
pub struct MemoryInvertedIndex {
    table: RwLock<DescriptorTable>,
}

impl MemoryInvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_table(table: DescriptorTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }
}

impl InvertedIndex for MemoryInvertedIndex {
    fn insert(&self, descriptor: ResiduePairDescriptor, occurrences: OccurrenceMap) -> Result<(), IndexError> {
        if occurrences.is_empty() {
            return Ok(());
        }
        let mut table = self.table.write().map_err(|_| IndexError::Poisoned)?;
        let entry = table.entry(descriptor).or_default();
        if let Some(structure) = occurrences.keys().find(|id| entry.contains_key(*id)) {
            return Err(IndexError::DuplicateEntry {
                descriptor,
                structure: structure.clone(),
            });
        }
        entry.extend(occurrences);
        Ok(())
    }

    fn lookup(&self, descriptor: &ResiduePairDescriptor) -> Result<OccurrenceMap, IndexError> {
        let table = self.table.read().map_err(|_| IndexError::Poisoned)?;
        Ok(table.get(descriptor).cloned().unwrap_or_default())
    }

    fn delete(&self, structures: &HashSet<StructureIdentifier>) -> Result<(), IndexError> {
        if structures.is_empty() {
            return Ok(());
        }
        let mut table = self.table.write().map_err(|_| IndexError::Poisoned)?;
        table.retain(|_, occurrences| {
            occurrences.retain(|id, _| !structures.contains(id));
            !occurrences.is_empty()
        });
        Ok(())
    }

    fn len(&self) -> Result<usize, IndexError> {
        Ok(self.table.read().map_err(|_| IndexError::Poisoned)?.len())
    }
}

#[derive(Deserialize)]
struct Snapshot {
    quantizer: Quantizer,
    table: DescriptorTable,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    quantizer: &'a Quantizer,
    table: &'a DescriptorTable,
}

/// In-memory index persisted as a `bincode` snapshot on [`InvertedIndex::commit`].
///
/// The snapshot records the [`Quantizer`] its descriptors were binned with.
#[derive(Debug)]
pub struct FileInvertedIndex {
    path: PathBuf,
    quantizer: Quantizer,
    inner: MemoryInvertedIndex,
    pending: AtomicBool,
}

impl FileInvertedIndex {
    /// Opens the snapshot at `path`, starting empty if it does not exist yet.
    ///
    /// Fails with [`IndexError::QuantizerMismatch`] if the snapshot was binned
    /// with parameters other than `quantizer`.
    pub fn open(path: impl Into<PathBuf>, quantizer: Quantizer) -> Result<Self, IndexError> {
        let path = path.into();
        let table = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let snapshot: Snapshot = bincode::deserialize_from(reader)
                .map_err(|e| IndexError::Serialization(e.to_string()))?;
            if snapshot.quantizer != quantizer {
                return Err(IndexError::QuantizerMismatch {
                    stored: snapshot.quantizer,
                    configured: quantizer,
                });
            }
            info!("Loaded index with {} descriptors from {:?}", snapshot.table.len(), path);
            snapshot.table
        } else {
            DescriptorTable::new()
        };
        Ok(Self {
            path,
            quantizer,
            inner: MemoryInvertedIndex::from_table(table),
            pending: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InvertedIndex for FileInvertedIndex {
    fn insert(&self, descriptor: ResiduePairDescriptor, occurrences: OccurrenceMap) -> Result<(), IndexError> {
        self.inner.insert(descriptor, occurrences)?;
        // Flagged after the write so a concurrent commit cannot clear it unseen.
        self.pending.store(true, Ordering::Release);
        Ok(())
    }

    fn lookup(&self, descriptor: &ResiduePairDescriptor) -> Result<OccurrenceMap, IndexError> {
        self.inner.lookup(descriptor)
    }

    fn delete(&self, structures: &HashSet<StructureIdentifier>) -> Result<(), IndexError> {
        self.inner.delete(structures)?;
        if !structures.is_empty() {
            self.pending.store(true, Ordering::Release);
        }
        Ok(())
    }

    fn commit(&self) -> Result<(), IndexError> {
        // Held for reading across the write so concurrent inserts cannot interleave.
        let table = self.inner.table.read().map_err(|_| IndexError::Poisoned)?;
        if !self.pending.load(Ordering::Acquire) {
            debug!("Index has no uncommitted writes");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        {
            let writer = BufWriter::new(File::create(&tmp_path)?);
            let snapshot = SnapshotRef {
                quantizer: &self.quantizer,
                table: &*table,
            };
            bincode::serialize_into(writer, &snapshot)
                .map_err(|e| IndexError::Serialization(e.to_string()))?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.pending.store(false, Ordering::Release);
        debug!("Committed index snapshot with {} descriptors", table.len());
        Ok(())
    }

    fn len(&self) -> Result<usize, IndexError> {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueIdentifier;
    use crate::core::models::residue::ResidueType;
    use tempfile::tempdir;

    fn quantizer() -> Quantizer {
        Quantizer::new(20.0, 1.0, 10.0)
    }

    fn descriptor(bin: u8) -> ResiduePairDescriptor {
        ResiduePairDescriptor::new(ResidueType::Histidine, ResidueType::Serine, bin, bin, 3)
    }

    fn occurrences(id: &str, seq_ids: &[(isize, isize)]) -> OccurrenceMap {
        let pairs = seq_ids
            .iter()
            .map(|&(a, b)| {
                ResiduePairIdentifier::new(ResidueIdentifier::new('A', a), ResidueIdentifier::new('A', b))
            })
            .collect();
        HashMap::from([(StructureIdentifier::new(id), pairs)])
    }

    #[test]
    fn inserted_descriptors_are_immediately_visible() {
        let index = MemoryInvertedIndex::new();
        index.insert(descriptor(5), occurrences("1abc", &[(1, 2)])).unwrap();
        index.insert(descriptor(5), occurrences("2abc", &[(3, 4), (7, 9)])).unwrap();

        let found = index.lookup(&descriptor(5)).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[&StructureIdentifier::new("2abc")].len(), 2);
        assert!(index.lookup(&descriptor(6)).unwrap().is_empty());
    }

    #[test]
    fn duplicate_structure_under_descriptor_is_rejected_without_partial_insert() {
        let index = MemoryInvertedIndex::new();
        index.insert(descriptor(5), occurrences("1abc", &[(1, 2)])).unwrap();

        let mut batch = occurrences("1abc", &[(8, 9)]);
        batch.extend(occurrences("3xyz", &[(1, 2)]));
        let err = index.insert(descriptor(5), batch).unwrap_err();

        assert!(matches!(err, IndexError::DuplicateEntry { .. }));
        let found = index.lookup(&descriptor(5)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&StructureIdentifier::new("1abc")].len(), 1);
    }

    #[test]
    fn delete_removes_structures_across_all_descriptors() {
        let index = MemoryInvertedIndex::new();
        index.insert(descriptor(1), occurrences("1abc", &[(1, 2)])).unwrap();
        index.insert(descriptor(2), occurrences("1abc", &[(2, 3)])).unwrap();
        index.insert(descriptor(2), occurrences("2abc", &[(2, 3)])).unwrap();

        index
            .delete(&HashSet::from([StructureIdentifier::new("1abc")]))
            .unwrap();

        assert!(index.lookup(&descriptor(1)).unwrap().is_empty());
        assert_eq!(index.lookup(&descriptor(2)).unwrap().len(), 1);
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn file_index_survives_reopening_after_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index").join("descriptors.bin");

        let index = FileInvertedIndex::open(&path, quantizer()).unwrap();
        assert!(index.is_empty().unwrap());
        index.insert(descriptor(4), occurrences("1abc", &[(1, 2)])).unwrap();
        index.commit().unwrap();

        let reopened = FileInvertedIndex::open(&path, quantizer()).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(reopened.lookup(&descriptor(4)).unwrap(), occurrences("1abc", &[(1, 2)]));
    }

    #[test]
    fn uncommitted_writes_are_not_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptors.bin");

        let index = FileInvertedIndex::open(&path, quantizer()).unwrap();
        index.insert(descriptor(4), occurrences("1abc", &[(1, 2)])).unwrap();
        drop(index);

        assert!(FileInvertedIndex::open(&path, quantizer()).unwrap().is_empty().unwrap());
    }

    #[test]
    fn snapshot_binned_with_other_parameters_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptors.bin");

        let index = FileInvertedIndex::open(&path, quantizer()).unwrap();
        index.insert(descriptor(4), occurrences("1abc", &[(1, 2)])).unwrap();
        index.commit().unwrap();

        let coarser = Quantizer::new(20.0, 2.0, 10.0);
        let err = FileInvertedIndex::open(&path, coarser).unwrap_err();

        assert!(matches!(
            err,
            IndexError::QuantizerMismatch { stored, configured } if stored == quantizer() && configured == coarser
        ));
    }

    #[test]
    fn commit_without_writes_leaves_no_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("descriptors.bin");

        let index = FileInvertedIndex::open(&path, quantizer()).unwrap();
        index.commit().unwrap();
        index.delete(&HashSet::new()).unwrap();
        index.commit().unwrap();
        assert!(!path.exists());

        index.insert(descriptor(4), occurrences("1abc", &[(1, 2)])).unwrap();
        index.commit().unwrap();
        assert!(path.exists());
    }
}
